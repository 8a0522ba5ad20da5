//! Discord gateway and REST adapter (serenity).

pub mod convert;
pub mod handler;
pub mod platform;

use std::sync::Arc;

use serenity::Client;
use serenity::all::{GatewayIntents, ShardManager};

pub use handler::Handler;
pub use platform::DiscordPlatform;

/// Gateway intents the bot needs: member joins, guild structure, and the
/// content of posted messages.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT
}

/// A logged-in gateway session.
pub struct Bot {
    client: Client,
}

impl Bot {
    /// Authenticate and register `handler`. Does not open the gateway yet.
    pub async fn connect(token: &str, handler: Handler) -> Result<Self, serenity::Error> {
        let client = Client::builder(token, intents())
            .event_handler(handler)
            .await?;
        Ok(Self { client })
    }

    /// Handle for stopping the gateway from another task.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        self.client.shard_manager.clone()
    }

    /// Run the gateway until every shard has shut down.
    pub async fn run(&mut self) -> Result<(), serenity::Error> {
        self.client.start().await
    }
}
