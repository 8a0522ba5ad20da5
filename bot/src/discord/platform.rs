use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use serenity::all::{ChannelId, CreateAttachment, CreateChannel, EditProfile, GuildId, Http};
use tracing::debug;

use super::convert::{self, parse_id};
use crate::error::PlatformError;
use crate::platform::{Attachment, Channel, Member, MessagePayload, NewChannel, Platform, Role};

impl From<serenity::Error> for PlatformError {
    fn from(e: serenity::Error) -> Self {
        PlatformError::Request(e.to_string())
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        PlatformError::Request(format!("attachment download: {e}"))
    }
}

/// [`Platform`] over Discord's REST API.
///
/// Cheap to construct: the gateway handler builds one per event from the
/// context's HTTP client. Downloaded attachments are kept for the lifetime of
/// the value, so one relay fetches each file once.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    downloader: reqwest::Client,
    files: Arc<DashMap<String, CreateAttachment>>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, downloader: reqwest::Client) -> Self {
        Self {
            http,
            downloader,
            files: Arc::new(DashMap::new()),
        }
    }

    fn guild(guild_id: &str) -> Result<GuildId, PlatformError> {
        Ok(GuildId::new(parse_id(guild_id)?))
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<CreateAttachment, PlatformError> {
        if let Some(file) = self.files.get(&attachment.url) {
            return Ok(file.clone());
        }
        let bytes = self
            .downloader
            .get(&attachment.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!(url = %attachment.url, size = bytes.len(), "attachment downloaded");
        let file = CreateAttachment::bytes(bytes.to_vec(), attachment.filename.clone());
        self.files.insert(attachment.url.clone(), file.clone());
        Ok(file)
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn everyone_role_id(&self, guild_id: &str) -> String {
        // The @everyone role shares the guild's id.
        guild_id.to_string()
    }

    async fn roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError> {
        let roles = Self::guild(guild_id)?.roles(&self.http).await?;
        Ok(roles
            .into_values()
            .map(|r| Role {
                id: r.id.get().to_string(),
                name: r.name,
            })
            .collect())
    }

    async fn channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError> {
        let mut channels: Vec<_> = Self::guild(guild_id)?
            .channels(&self.http)
            .await?
            .into_values()
            .collect();
        // Stable order so "first match" lookups are deterministic.
        channels.sort_by_key(|c| (c.position, c.id));
        Ok(channels.iter().map(convert::channel_from_wire).collect())
    }

    async fn create_channel(
        &self,
        guild_id: &str,
        channel: NewChannel,
    ) -> Result<Channel, PlatformError> {
        let guild = Self::guild(guild_id)?;
        let overwrites = channel
            .overwrites
            .iter()
            .map(convert::overwrite_to_wire)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChannel::new(channel.name)
            .kind(convert::kind_to_wire(channel.kind))
            .permissions(overwrites);
        if let Some(parent) = &channel.parent_id {
            builder = builder.category(ChannelId::new(parse_id(parent)?));
        }

        let created = guild.create_channel(&self.http, builder).await?;
        Ok(convert::channel_from_wire(&created))
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<String, PlatformError> {
        let channel = ChannelId::new(parse_id(channel_id)?);
        let mut files = Vec::with_capacity(payload.attachments.len());
        for attachment in &payload.attachments {
            files.push(self.fetch_attachment(attachment).await?);
        }
        let builder = convert::message_to_wire(payload, files)?;
        let sent = channel.send_message(&self.http, builder).await?;
        Ok(sent.id.get().to_string())
    }

    async fn prefetch_attachments(&self, attachments: &[Attachment]) -> Result<(), PlatformError> {
        for attachment in attachments {
            self.fetch_attachment(attachment).await?;
        }
        Ok(())
    }

    async fn members(&self, guild_id: &str) -> Result<Vec<Member>, PlatformError> {
        let guild = Self::guild(guild_id)?;
        let mut pages = Box::pin(guild.members_iter(&self.http));
        let mut members = Vec::new();
        while let Some(member) = pages.next().await {
            members.push(convert::member_from_wire(&member?));
        }
        Ok(members)
    }

    async fn set_username(&self, name: &str) -> Result<(), PlatformError> {
        let mut me = self.http.get_current_user().await?;
        me.edit(&self.http, EditProfile::new().username(name)).await?;
        Ok(())
    }
}
