use async_trait::async_trait;
use serenity::all::{Context, EventHandler, Member as WireMember, Message, Ready};
use tracing::{debug, error, info, warn};

use super::convert;
use super::platform::DiscordPlatform;
use crate::engine::provisioner::{NoticeStatus, Provisioner};
use crate::engine::relay::{DeliveryStatus, Relay, RelayReport};
use crate::platform::{Member, Platform, PostedMessage};

/// Gateway event handler. Serenity runs each event on its own task, so
/// joins and posts are handled concurrently with no shared locking.
pub struct Handler {
    provisioner: Provisioner,
    relay: Relay,
    /// Username to apply on ready, if any.
    username: Option<String>,
    downloader: reqwest::Client,
}

impl Handler {
    pub fn new(provisioner: Provisioner, relay: Relay, username: Option<String>) -> Self {
        Self {
            provisioner,
            relay,
            username,
            downloader: reqwest::Client::new(),
        }
    }

    fn platform(&self, ctx: &Context) -> DiscordPlatform {
        DiscordPlatform::new(ctx.http.clone(), self.downloader.clone())
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Bot is online as {}", ready.user.tag());

        let Some(name) = &self.username else {
            return;
        };
        if ready.user.name == *name {
            return;
        }
        match self.platform(&ctx).set_username(name).await {
            Ok(()) => info!(%name, "bot username updated"),
            Err(e) => error!(error = %e, "failed to update bot username"),
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: WireMember) {
        let guild_id = new_member.guild_id.get().to_string();
        let member = convert::member_from_wire(&new_member);
        on_member_join(&self.provisioner, &self.platform(&ctx), &guild_id, &member).await;
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        let Some(posted) = convert::message_from_wire(&new_message) else {
            return;
        };
        if self.relay.screen(&posted).is_err() {
            return;
        }
        on_message_posted(&self.relay, &self.platform(&ctx), &posted).await;
    }
}

/// Provision the new member's space and log the outcome. Errors end here.
pub async fn on_member_join(
    provisioner: &Provisioner,
    platform: &dyn Platform,
    guild_id: &str,
    member: &Member,
) {
    match provisioner.provision(platform, guild_id, member).await {
        Ok(report) => {
            if report.was_complete() {
                info!(member = %member.tag, "private space already present");
            }
            if let NoticeStatus::Failed(e) = &report.notice {
                debug!(member = %member.tag, error = %e, "join notice not delivered");
            }
        }
        Err(e) => error!(member = %member.tag, error = %e, "error during channel creation"),
    }
}

/// Relay a posted message and log every recipient's outcome.
pub async fn on_message_posted(relay: &Relay, platform: &dyn Platform, message: &PostedMessage) {
    match relay.handle(platform, message).await {
        Ok(Some(report)) => log_relay_report(&report),
        Ok(None) => {}
        Err(e) => error!(message = %message.id, error = %e, "relay aborted"),
    }
}

fn log_relay_report(report: &RelayReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            DeliveryStatus::Delivered { .. } => {
                debug!(member = %outcome.member_tag, "announcement forwarded")
            }
            DeliveryStatus::Failed(e) => {
                warn!(member = %outcome.member_tag, error = %e, "failed to forward announcement")
            }
            DeliveryStatus::Skipped(reason) => {
                debug!(member = %outcome.member_tag, ?reason, "no announcement channel")
            }
        }
    }
    let elapsed = report.finished_at - report.started_at;
    info!(
        message = %report.source_message_id,
        delivered = report.delivered(),
        failed = report.failed(),
        skipped = report.skipped(),
        elapsed_ms = elapsed.num_milliseconds(),
        "announcement relayed"
    );
}
