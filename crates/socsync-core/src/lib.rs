pub mod app_config;
pub mod config;
pub mod platform;
pub mod sync;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use platform::{Platform, SyncTrigger};
pub use sync::{
    RefreshSweepSummary, SnapshotSummary, SyncAllSummary, SyncError, SyncErrorKind, SyncResult,
    SyncStatus,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("unknown sync trigger: {0}")]
    UnknownTrigger(String),
}
