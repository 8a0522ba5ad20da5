use std::sync::Arc;

use tracing::{debug, info, warn};

use super::directory::MemberDirectory;
use super::permissions::{PermissionOverwrite, SpaceTemplate};
use super::space::{self, MemberSpace, SpaceChannel};
use crate::error::{PlatformError, ProvisionError};
use crate::platform::{Channel, ChannelKind, Member, MessagePayload, NewChannel, Platform};

/// Settings the provisioner needs from configuration.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    /// Exact name of the role granted full access to every member space.
    pub admin_role_name: String,
    /// Channel receiving best-effort join notices.
    pub log_channel_id: Option<String>,
    /// Community name used in the welcome message.
    pub community_name: String,
}

/// Outcome of the optional join notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeStatus {
    NotConfigured,
    /// Configured id is missing from the guild or is not a text channel.
    Unavailable,
    Posted,
    Failed(PlatformError),
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub space: MemberSpace,
    pub created_category: bool,
    /// Children created by this run, in creation order.
    pub created_channels: Vec<SpaceChannel>,
    pub welcomed: bool,
    pub notice: NoticeStatus,
}

impl ProvisionReport {
    /// True when nothing had to be created.
    pub fn was_complete(&self) -> bool {
        !self.created_category && self.created_channels.is_empty()
    }
}

pub fn welcome_message(community: &str, display_name: &str) -> String {
    format!("👋 Welcome to {community}, {display_name}!")
}

pub fn join_notice(tag: &str) -> String {
    format!("👋 {tag} joined. Private space created.")
}

/// Creates a member's private category and channels when they join.
///
/// Every step is find-or-create, so running it again for a member whose space
/// was left half-built fills in what is missing without duplicating anything.
pub struct Provisioner {
    settings: ProvisionSettings,
    directory: Arc<MemberDirectory>,
}

impl Provisioner {
    pub fn new(settings: ProvisionSettings, directory: Arc<MemberDirectory>) -> Self {
        Self {
            settings,
            directory,
        }
    }

    pub async fn provision(
        &self,
        platform: &dyn Platform,
        guild_id: &str,
        member: &Member,
    ) -> Result<ProvisionReport, ProvisionError> {
        let roles = platform
            .roles(guild_id)
            .await
            .map_err(ProvisionError::at("list roles"))?;
        let admin_role = roles
            .iter()
            .find(|r| r.name == self.settings.admin_role_name)
            .ok_or_else(|| ProvisionError::AdminRoleMissing {
                name: self.settings.admin_role_name.clone(),
            })?;

        let template = SpaceTemplate::new(
            &member.id,
            platform.everyone_role_id(guild_id),
            &admin_role.id,
        );

        let mut channels = platform
            .channels(guild_id)
            .await
            .map_err(ProvisionError::at("list channels"))?;

        let existing = space::find_owned_category(&channels, member).map(|c| c.id.clone());
        let created_category = existing.is_none();
        let category_id = match existing {
            Some(id) => {
                debug!(member = %member.tag, category = %id, "reusing existing category");
                id
            }
            None => {
                info!(member = %member.tag, "creating category for {}", member.display_name);
                let category = platform
                    .create_channel(
                        guild_id,
                        NewChannel {
                            name: member.display_name.clone(),
                            kind: ChannelKind::Category,
                            parent_id: None,
                            overwrites: template.base(),
                        },
                    )
                    .await
                    .map_err(ProvisionError::at("create category"))?;
                info!(member = %member.tag, category = %category.id, "category created");
                let id = category.id.clone();
                channels.push(category);
                id
            }
        };

        let mut created_channels = Vec::new();

        let (announcement_id, created) = self
            .ensure_child(
                platform,
                guild_id,
                &mut channels,
                &category_id,
                SpaceChannel::Announcement,
                template.announcement(),
            )
            .await?;
        if created {
            created_channels.push(SpaceChannel::Announcement);
        }

        let (text_id, created) = self
            .ensure_child(
                platform,
                guild_id,
                &mut channels,
                &category_id,
                SpaceChannel::Text,
                template.base(),
            )
            .await?;
        if created {
            created_channels.push(SpaceChannel::Text);
        }
        let welcomed = created || self.directory.welcome_pending(&member.id);
        if welcomed {
            self.send_welcome(platform, &text_id, member).await?;
        }

        let (voice_id, created) = self
            .ensure_child(
                platform,
                guild_id,
                &mut channels,
                &category_id,
                SpaceChannel::Voice,
                template.base(),
            )
            .await?;
        if created {
            created_channels.push(SpaceChannel::Voice);
        }

        let space = MemberSpace {
            category_id,
            announcement_id,
            text_id,
            voice_id,
        };

        if created_category || !created_channels.is_empty() {
            info!(member = %member.tag, "private channels created for {}", member.display_name);
        }
        self.directory.record(&member.id, space.clone());

        let notice = self.post_join_notice(platform, &channels, member).await;

        Ok(ProvisionReport {
            space,
            created_category,
            created_channels,
            welcomed,
            notice,
        })
    }

    /// Find `child` under the category or create it. Returns the id and
    /// whether it was created.
    async fn ensure_child(
        &self,
        platform: &dyn Platform,
        guild_id: &str,
        channels: &mut Vec<Channel>,
        category_id: &str,
        child: SpaceChannel,
        overwrites: Vec<PermissionOverwrite>,
    ) -> Result<(String, bool), ProvisionError> {
        if let Some(existing) = space::find_child(channels, category_id, child) {
            return Ok((existing.id.clone(), false));
        }

        let step = match child {
            SpaceChannel::Announcement => "create announcement channel",
            SpaceChannel::Text => "create text channel",
            SpaceChannel::Voice => "create voice channel",
        };
        let created = platform
            .create_channel(
                guild_id,
                NewChannel {
                    name: child.name().to_string(),
                    kind: child.kind(),
                    parent_id: Some(category_id.to_string()),
                    overwrites,
                },
            )
            .await
            .map_err(ProvisionError::at(step))?;
        debug!(channel = %created.id, name = child.name(), "channel created");

        let id = created.id.clone();
        channels.push(created);
        Ok((id, true))
    }

    /// A failed send is remembered so the next attempt retries it.
    async fn send_welcome(
        &self,
        platform: &dyn Platform,
        text_id: &str,
        member: &Member,
    ) -> Result<(), ProvisionError> {
        let welcome = welcome_message(&self.settings.community_name, &member.display_name);
        match platform.send_message(text_id, &MessagePayload::text(welcome)).await {
            Ok(_) => {
                self.directory.clear_welcome_pending(&member.id);
                Ok(())
            }
            Err(e) => {
                self.directory.mark_welcome_pending(&member.id);
                Err(ProvisionError::at("send welcome message")(e))
            }
        }
    }

    async fn post_join_notice(
        &self,
        platform: &dyn Platform,
        channels: &[Channel],
        member: &Member,
    ) -> NoticeStatus {
        let Some(log_channel_id) = &self.settings.log_channel_id else {
            return NoticeStatus::NotConfigured;
        };

        match space::find_by_id(channels, log_channel_id) {
            Some(ch) if ch.kind.is_text_based() => {}
            _ => {
                debug!(channel = %log_channel_id, "log channel missing or not text-based");
                return NoticeStatus::Unavailable;
            }
        }

        let notice = MessagePayload::text(join_notice(&member.tag));
        match platform.send_message(log_channel_id, &notice).await {
            Ok(_) => NoticeStatus::Posted,
            Err(e) => {
                warn!(member = %member.tag, error = %e, "failed to post join notice");
                NoticeStatus::Failed(e)
            }
        }
    }
}
