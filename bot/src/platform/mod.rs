//! The chat platform as seen by the provisioner and relay.
//!
//! Everything here is platform-neutral: ids are strings and the payload types
//! carry only what the relay forwards. `crate::discord` implements [`Platform`]
//! over serenity; `memory::InMemoryPlatform` implements it for tests.

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::engine::permissions::PermissionOverwrite;
use crate::error::PlatformError;

/// A guild member as returned by the live member listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    /// Mutable. Used as the category name key.
    pub display_name: String,
    /// `name#discriminator` or the bare username; only used in log lines.
    pub tag: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Category,
    Text,
    Voice,
    News,
    Other,
}

impl ChannelKind {
    /// Whether plain messages can be posted here.
    pub fn is_text_based(self) -> bool {
        matches!(self, Self::Text | Self::News)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Parameters for [`Platform::create_channel`].
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
    pub overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: Option<u32>,
    pub author: Option<EmbedAuthor>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A file attached to a message, re-uploaded by the platform on send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Link { url: String },
    Custom { custom_id: String, style: ButtonStyle },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: Option<String>,
    pub action: ButtonAction,
    pub disabled: bool,
}

/// One row of interactive components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

/// The forwardable body of a message. Also used for the bot's own sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePayload {
    pub content: String,
    pub embeds: Vec<Embed>,
    pub attachments: Vec<Attachment>,
    pub sticker_ids: Vec<String>,
    pub components: Vec<ActionRow>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when there is nothing to forward at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.embeds.is_empty()
            && self.attachments.is_empty()
            && self.sticker_ids.is_empty()
            && self.components.is_empty()
    }
}

/// A message observed on the gateway.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub author_is_bot: bool,
    pub payload: MessagePayload,
}

/// Operations the provisioner and relay need from the chat platform.
///
/// Every call goes to the live platform; implementations must not cache
/// guild structure between calls.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Id of the implicit role every member holds.
    fn everyone_role_id(&self, guild_id: &str) -> String;

    async fn roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError>;

    async fn channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError>;

    async fn create_channel(
        &self,
        guild_id: &str,
        channel: NewChannel,
    ) -> Result<Channel, PlatformError>;

    /// Returns the id of the sent message.
    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<String, PlatformError>;

    /// Download `attachments` ahead of a fan-out so every later
    /// [`Platform::send_message`] on this value reuses the same bytes.
    async fn prefetch_attachments(&self, attachments: &[Attachment]) -> Result<(), PlatformError>;

    async fn members(&self, guild_id: &str) -> Result<Vec<Member>, PlatformError>;

    async fn set_username(&self, name: &str) -> Result<(), PlatformError>;
}
