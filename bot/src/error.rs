use thiserror::Error;

/// Failure reported by a chat platform call (REST request, lookup, upload).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("missing permission: {0}")]
    Forbidden(String),

    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error("platform request failed: {0}")]
    Request(String),
}

/// Why a provisioning attempt stopped before the member's space was complete.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("administrator role {name:?} not found")]
    AdminRoleMissing { name: String },

    #[error("{step} failed: {source}")]
    Platform {
        step: &'static str,
        #[source]
        source: PlatformError,
    },
}

impl ProvisionError {
    pub(crate) fn at(step: &'static str) -> impl FnOnce(PlatformError) -> Self {
        move |source| Self::Platform { step, source }
    }
}

/// Relay failures that prevent any fan-out from happening.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to list members: {0}")]
    Members(#[source] PlatformError),

    #[error("failed to list channels: {0}")]
    Channels(#[source] PlatformError),

    #[error("failed to download attachments: {0}")]
    Attachments(#[source] PlatformError),
}

/// Startup configuration problems. Fatal: the binary exits with this error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("{key} must be a numeric id, got {value:?}")]
    InvalidId { key: &'static str, value: String },
}
