use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::engine::provisioner::ProvisionSettings;
use crate::engine::relay::RelaySettings;
use crate::error::ConfigError;

/// Top-level bot configuration, loaded from cordcare.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub discord: DiscordSection,
    pub spaces: SpacesSection,
    pub relay: RelaySection,
    pub liveness: LivenessSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscordSection {
    pub token: String,
    /// Username applied to the bot account at startup. Empty leaves it alone.
    pub username: String,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            username: "Cord Care Bot".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpacesSection {
    pub admin_role_name: String,
    pub log_channel_id: Option<String>,
    pub community_name: String,
}

impl Default for SpacesSection {
    fn default() -> Self {
        Self {
            admin_role_name: String::new(),
            log_channel_id: None,
            community_name: "Retailstub".into(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RelaySection {
    pub master_channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LivenessSection {
    pub address: String,
    pub port: u16,
}

impl Default for LivenessSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
            Self::from_toml(path, &contents)?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(path: &str, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Apply `KEY=value` overrides. An empty id clears the setting.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("TOKEN") {
            self.discord.token = v;
        }
        if let Some(v) = var("BOT_USERNAME") {
            self.discord.username = v;
        }
        if let Some(v) = var("ADMIN_ROLE_NAME") {
            self.spaces.admin_role_name = v;
        }
        if let Some(v) = var("BOT_LOG_ID") {
            self.spaces.log_channel_id = Some(v);
        }
        if let Some(v) = var("COMMUNITY_NAME") {
            self.spaces.community_name = v;
        }
        if let Some(v) = var("MASTER_CHANNEL_ID") {
            self.relay.master_channel_id = Some(v);
        }
        if let Some(v) = var("PORT")
            && let Ok(port) = v.parse()
        {
            self.liveness.port = port;
        }

        normalize_id(&mut self.spaces.log_channel_id);
        normalize_id(&mut self.relay.master_channel_id);
    }

    /// Reject configurations the bot cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(ConfigError::Missing("TOKEN"));
        }
        if self.spaces.admin_role_name.is_empty() {
            return Err(ConfigError::Missing("ADMIN_ROLE_NAME"));
        }
        check_id("BOT_LOG_ID", self.spaces.log_channel_id.as_deref())?;
        check_id("MASTER_CHANNEL_ID", self.relay.master_channel_id.as_deref())?;
        Ok(())
    }

    pub fn liveness_addr(&self) -> String {
        format!("{}:{}", self.liveness.address, self.liveness.port)
    }

    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            admin_role_name: self.spaces.admin_role_name.clone(),
            log_channel_id: self.spaces.log_channel_id.clone(),
            community_name: self.spaces.community_name.clone(),
        }
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            master_channel_id: self.relay.master_channel_id.clone(),
        }
    }
}

fn normalize_id(id: &mut Option<String>) {
    *id = id
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

fn check_id(key: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.parse::<u64>().is_ok_and(|n| n != 0) => Err(ConfigError::InvalidId {
            key,
            value: v.to_string(),
        }),
        _ => Ok(()),
    }
}
