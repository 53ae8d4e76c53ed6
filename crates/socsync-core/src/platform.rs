use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Social platforms the sync subsystem knows how to pull metrics from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            other => Err(CoreError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Why a sync run started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    /// Scheduled run from the cron endpoint or the in-process scheduler.
    Cron,
    /// Platform-pushed notification. Not wired to an endpoint yet.
    Webhook,
    /// Explicit user or operator action.
    Manual,
}

impl SyncTrigger {
    /// Scheduled runs only pick accounts that opted into auto-sync; explicit
    /// triggers bypass the gate.
    #[must_use]
    pub fn requires_auto_sync(self) -> bool {
        matches!(self, SyncTrigger::Cron)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncTrigger::Cron => "cron",
            SyncTrigger::Webhook => "webhook",
            SyncTrigger::Manual => "manual",
        }
    }
}

impl std::fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncTrigger {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cron" => Ok(SyncTrigger::Cron),
            "webhook" => Ok(SyncTrigger::Webhook),
            "manual" => Ok(SyncTrigger::Manual),
            other => Err(CoreError::UnknownTrigger(other.to_string())),
        }
    }
}
