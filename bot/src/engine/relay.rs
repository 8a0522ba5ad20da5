use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::directory::MemberDirectory;
use super::space::{self, SpaceChannel};
use crate::error::{PlatformError, RelayError};
use crate::platform::{Channel, Member, Platform, PostedMessage};

#[derive(Debug, Clone, Default)]
pub struct RelaySettings {
    /// The only channel whose posts are relayed. `None` disables the relay.
    pub master_channel_id: Option<String>,
}

/// Why a posted message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AutomatedAuthor,
    NotMasterChannel,
    EmptyPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCategory,
    NoAnnouncementChannel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered { message_id: String },
    Failed(PlatformError),
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct RecipientOutcome {
    pub member_id: String,
    pub member_tag: String,
    pub status: DeliveryStatus,
}

/// Per-recipient results of one fan-out, in member enumeration order.
#[derive(Debug, Clone)]
pub struct RelayReport {
    pub source_message_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<RecipientOutcome>,
}

impl RelayReport {
    pub fn delivered(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Delivered { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Skipped(_)))
    }

    pub fn outcome_for(&self, member_id: &str) -> Option<&DeliveryStatus> {
        self.outcomes
            .iter()
            .find(|o| o.member_id == member_id)
            .map(|o| &o.status)
    }

    fn count(&self, pred: impl Fn(&DeliveryStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Forwards master-channel posts into every member's announcement channel.
pub struct Relay {
    settings: RelaySettings,
    directory: Arc<MemberDirectory>,
}

impl Relay {
    pub fn new(settings: RelaySettings, directory: Arc<MemberDirectory>) -> Self {
        Self {
            settings,
            directory,
        }
    }

    /// Filter chain applied before any platform call.
    pub fn screen(&self, message: &PostedMessage) -> Result<(), Rejection> {
        if message.author_is_bot {
            return Err(Rejection::AutomatedAuthor);
        }
        if self.settings.master_channel_id.as_deref() != Some(message.channel_id.as_str()) {
            return Err(Rejection::NotMasterChannel);
        }
        if message.payload.is_empty() {
            return Err(Rejection::EmptyPayload);
        }
        Ok(())
    }

    /// Relay `message` if it passes [`Relay::screen`]. Returns `None` for
    /// messages that are not relayed.
    ///
    /// Attachments are downloaded once before the fan-out; if that fails
    /// nobody receives the post. Sends are awaited one member at a time. A
    /// failed send is recorded and the loop moves on to the next member.
    pub async fn handle(
        &self,
        platform: &dyn Platform,
        message: &PostedMessage,
    ) -> Result<Option<RelayReport>, RelayError> {
        if let Err(rejection) = self.screen(message) {
            debug!(message = %message.id, ?rejection, "message not relayed");
            return Ok(None);
        }

        let started_at = Utc::now();
        let members = platform
            .members(&message.guild_id)
            .await
            .map_err(RelayError::Members)?;
        let channels = platform
            .channels(&message.guild_id)
            .await
            .map_err(RelayError::Channels)?;
        if !message.payload.attachments.is_empty() {
            platform
                .prefetch_attachments(&message.payload.attachments)
                .await
                .map_err(RelayError::Attachments)?;
        }

        let mut outcomes = Vec::with_capacity(members.len());
        for member in members.iter().filter(|m| !m.is_bot) {
            let status = match self.resolve_announcement(&channels, member) {
                Err(reason) => DeliveryStatus::Skipped(reason),
                Ok(channel) => match platform.send_message(&channel.id, &message.payload).await {
                    Ok(message_id) => DeliveryStatus::Delivered { message_id },
                    Err(e) => DeliveryStatus::Failed(e),
                },
            };
            outcomes.push(RecipientOutcome {
                member_id: member.id.clone(),
                member_tag: member.tag.clone(),
                status,
            });
        }

        Ok(Some(RelayReport {
            source_message_id: message.id.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }))
    }

    fn resolve_announcement<'a>(
        &self,
        channels: &'a [Channel],
        member: &Member,
    ) -> Result<&'a Channel, SkipReason> {
        if let Some(known) = self.directory.get(&member.id) {
            if let Some(channel) = space::find_by_id(channels, &known.announcement_id) {
                return Ok(channel);
            }
            debug!(member = %member.tag, "stale directory entry, falling back to name lookup");
            self.directory.forget(&member.id);
        }

        let category =
            space::find_member_category(channels, member).ok_or(SkipReason::NoCategory)?;
        space::find_child(channels, &category.id, SpaceChannel::Announcement)
            .ok_or(SkipReason::NoAnnouncementChannel)
    }
}
