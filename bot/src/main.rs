use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cordcare::config::BotConfig;
use cordcare::discord::{Bot, Handler};
use cordcare::engine::directory::MemberDirectory;
use cordcare::engine::provisioner::Provisioner;
use cordcare::engine::relay::Relay;
use cordcare::web::router;

#[derive(Parser)]
#[command(version, about = "Private member spaces and announcement relay for Discord")]
struct Args {
    /// Path to the TOML config file. Environment variables override it.
    #[arg(long, default_value = "cordcare.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = BotConfig::load(&args.config)?;

    if config.relay.master_channel_id.is_none() {
        warn!("MASTER_CHANNEL_ID not set, announcement relay disabled");
    }

    let directory = Arc::new(MemberDirectory::new());
    let handler = Handler::new(
        Provisioner::new(config.provision_settings(), directory.clone()),
        Relay::new(config.relay_settings(), directory),
        Some(config.discord.username.clone()).filter(|n| !n.is_empty()),
    );

    // Liveness responder for uptime monitors
    let liveness_addr = config.liveness_addr();
    tokio::spawn(async move {
        if let Err(e) = router::serve(&liveness_addr).await {
            error!(error = %e, "liveness responder stopped");
        }
    });

    let mut bot = Bot::connect(&config.discord.token, handler).await?;

    let shards = bot.shard_manager();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shards.shutdown_all().await;
        }
    });

    info!(liveness = %config.liveness_addr(), "Cord Care starting");
    bot.run().await?;
    Ok(())
}
