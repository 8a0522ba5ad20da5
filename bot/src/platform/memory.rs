use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use super::{Attachment, Channel, ChannelKind, Member, MessagePayload, NewChannel, Platform, Role};
use crate::error::PlatformError;

#[derive(Debug, Default)]
struct GuildRecord {
    roles: Vec<Role>,
    /// Join order; this is the member listing order.
    members: Vec<Member>,
}

#[derive(Debug)]
struct ChannelRecord {
    guild_id: String,
    channel: Channel,
}

/// A whole chat platform held in memory.
///
/// Follows the platform's id conventions (numeric ids, everyone-role id equal
/// to the guild id) and supports injected failures for channel creation,
/// message sends and attachment downloads.
#[derive(Debug)]
pub struct InMemoryPlatform {
    guilds: DashMap<String, GuildRecord>,
    channels: DashMap<String, ChannelRecord>,
    messages: DashMap<String, Vec<MessagePayload>>,
    failing_creates: DashSet<String>,
    failing_sends: DashSet<String>,
    failing_send_names: DashSet<String>,
    /// Attachment url -> number of downloads.
    fetches: DashMap<String, usize>,
    failing_fetches: DashSet<String>,
    username: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            guilds: DashMap::new(),
            channels: DashMap::new(),
            messages: DashMap::new(),
            failing_creates: DashSet::new(),
            failing_sends: DashSet::new(),
            failing_send_names: DashSet::new(),
            fetches: DashMap::new(),
            failing_fetches: DashSet::new(),
            username: Mutex::new(None),
            next_id: AtomicU64::new(1000),
        }
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    // ── Fixture setup ───────────────────────────────────────────────

    pub fn add_guild(&self, guild_id: &str) {
        self.guilds.entry(guild_id.to_string()).or_default();
    }

    pub fn add_role(&self, guild_id: &str, name: &str) -> Role {
        let role = Role {
            id: self.allocate_id(),
            name: name.to_string(),
        };
        self.guilds
            .entry(guild_id.to_string())
            .or_default()
            .roles
            .push(role.clone());
        role
    }

    pub fn add_member(&self, guild_id: &str, display_name: &str, is_bot: bool) -> Member {
        let id = self.allocate_id();
        let member = Member {
            tag: format!("{}#{}", display_name.to_lowercase(), &id[id.len() - 4..]),
            id,
            display_name: display_name.to_string(),
            is_bot,
        };
        self.guilds
            .entry(guild_id.to_string())
            .or_default()
            .members
            .push(member.clone());
        member
    }

    pub fn rename_member(&self, guild_id: &str, member_id: &str, display_name: &str) {
        if let Some(mut guild) = self.guilds.get_mut(guild_id)
            && let Some(member) = guild.members.iter_mut().find(|m| m.id == member_id)
        {
            member.display_name = display_name.to_string();
        }
    }

    /// Insert a channel directly, bypassing failure injection.
    pub fn add_channel(
        &self,
        guild_id: &str,
        name: &str,
        kind: ChannelKind,
        parent_id: Option<&str>,
    ) -> Channel {
        let channel = Channel {
            id: self.allocate_id(),
            name: name.to_string(),
            kind,
            parent_id: parent_id.map(String::from),
            overwrites: Vec::new(),
        };
        self.channels.insert(
            channel.id.clone(),
            ChannelRecord {
                guild_id: guild_id.to_string(),
                channel: channel.clone(),
            },
        );
        channel
    }

    pub fn delete_channel(&self, channel_id: &str) {
        self.channels.remove(channel_id);
    }

    // ── Failure injection ───────────────────────────────────────────

    /// Make every `create_channel` for `name` fail.
    pub fn fail_creates_named(&self, name: &str) {
        self.failing_creates.insert(name.to_string());
    }

    /// Make every send into `channel_id` fail with a permission error.
    pub fn fail_sends_to(&self, channel_id: &str) {
        self.failing_sends.insert(channel_id.to_string());
    }

    /// Make every send into a channel called `name` fail.
    pub fn fail_sends_named(&self, name: &str) {
        self.failing_send_names.insert(name.to_string());
    }

    /// Make downloading the attachment at `url` fail.
    pub fn fail_fetches_of(&self, url: &str) {
        self.failing_fetches.insert(url.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_creates.clear();
        self.failing_sends.clear();
        self.failing_send_names.clear();
        self.failing_fetches.clear();
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn channel(&self, channel_id: &str) -> Option<Channel> {
        self.channels.get(channel_id).map(|r| r.channel.clone())
    }

    /// Channels of a guild in creation order.
    pub fn channels_in(&self, guild_id: &str) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self
            .channels
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .map(|r| r.channel.clone())
            .collect();
        channels.sort_by_key(|c| c.id.parse::<u64>().unwrap_or(u64::MAX));
        channels
    }

    pub fn messages_in(&self, channel_id: &str) -> Vec<MessagePayload> {
        self.messages
            .get(channel_id)
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map(|n| *n).unwrap_or(0)
    }

    pub fn username(&self) -> Option<String> {
        self.username
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn guild_not_found(guild_id: &str) -> PlatformError {
        PlatformError::NotFound {
            kind: "guild",
            id: guild_id.to_string(),
        }
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    fn everyone_role_id(&self, guild_id: &str) -> String {
        guild_id.to_string()
    }

    async fn roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError> {
        let guild = self
            .guilds
            .get(guild_id)
            .ok_or_else(|| Self::guild_not_found(guild_id))?;
        Ok(guild.roles.clone())
    }

    async fn channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError> {
        if !self.guilds.contains_key(guild_id) {
            return Err(Self::guild_not_found(guild_id));
        }
        Ok(self.channels_in(guild_id))
    }

    async fn create_channel(
        &self,
        guild_id: &str,
        channel: NewChannel,
    ) -> Result<Channel, PlatformError> {
        if !self.guilds.contains_key(guild_id) {
            return Err(Self::guild_not_found(guild_id));
        }
        if self.failing_creates.contains(&channel.name) {
            return Err(PlatformError::Request(format!(
                "injected failure creating {}",
                channel.name
            )));
        }
        if let Some(parent_id) = &channel.parent_id {
            let parent_ok = self.channels.get(parent_id).is_some_and(|p| {
                p.guild_id == guild_id && p.channel.kind == ChannelKind::Category
            });
            if !parent_ok {
                return Err(PlatformError::NotFound {
                    kind: "category",
                    id: parent_id.clone(),
                });
            }
        }

        let created = Channel {
            id: self.allocate_id(),
            name: channel.name,
            kind: channel.kind,
            parent_id: channel.parent_id,
            overwrites: channel.overwrites,
        };
        self.channels.insert(
            created.id.clone(),
            ChannelRecord {
                guild_id: guild_id.to_string(),
                channel: created.clone(),
            },
        );
        Ok(created)
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<String, PlatformError> {
        let name = self
            .channels
            .get(channel_id)
            .map(|r| r.channel.name.clone())
            .ok_or_else(|| PlatformError::NotFound {
                kind: "channel",
                id: channel_id.to_string(),
            })?;
        if self.failing_sends.contains(channel_id) || self.failing_send_names.contains(&name) {
            return Err(PlatformError::Forbidden("SEND_MESSAGES".into()));
        }
        self.messages
            .entry(channel_id.to_string())
            .or_default()
            .push(payload.clone());
        Ok(Uuid::new_v4().to_string())
    }

    async fn prefetch_attachments(&self, attachments: &[Attachment]) -> Result<(), PlatformError> {
        for attachment in attachments {
            if self.failing_fetches.contains(&attachment.url) {
                return Err(PlatformError::Request(format!(
                    "injected failure downloading {}",
                    attachment.url
                )));
            }
            *self.fetches.entry(attachment.url.clone()).or_default() += 1;
        }
        Ok(())
    }

    async fn members(&self, guild_id: &str) -> Result<Vec<Member>, PlatformError> {
        let guild = self
            .guilds
            .get(guild_id)
            .ok_or_else(|| Self::guild_not_found(guild_id))?;
        Ok(guild.members.clone())
    }

    async fn set_username(&self, name: &str) -> Result<(), PlatformError> {
        *self
            .username
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_channel_requires_category_parent() {
        let platform = InMemoryPlatform::new();
        platform.add_guild("1");
        let text = platform.add_channel("1", "general", ChannelKind::Text, None);

        let err = platform
            .create_channel(
                "1",
                NewChannel {
                    name: "child".into(),
                    kind: ChannelKind::Text,
                    parent_id: Some(text.id.clone()),
                    overwrites: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { kind: "category", .. }));
    }

    #[tokio::test]
    async fn test_send_to_deleted_channel_fails() {
        let platform = InMemoryPlatform::new();
        platform.add_guild("1");
        let ch = platform.add_channel("1", "general", ChannelKind::Text, None);
        platform.delete_channel(&ch.id);

        let err = platform
            .send_message(&ch.id, &MessagePayload::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { kind: "channel", .. }));
    }

    #[tokio::test]
    async fn test_listing_order_and_everyone_role() {
        let platform = InMemoryPlatform::new();
        platform.add_guild("1");
        let a = platform.add_member("1", "A", false);
        let b = platform.add_member("1", "B", true);

        let members = platform.members("1").await.unwrap();
        assert_eq!(members, vec![a, b]);
        assert_eq!(platform.everyone_role_id("1"), "1");
    }
}
