//! Transient result types produced by sync runs. Nothing here is persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Per-account outcome of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Partial,
    Error,
}

impl SyncStatus {
    /// `success` and `partial` both count as synced in a run summary.
    #[must_use]
    pub fn is_synced(self) -> bool {
        matches!(self, SyncStatus::Success | SyncStatus::Partial)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Partial => "partial",
            SyncStatus::Error => "error",
        }
    }
}

/// Classification of a per-account failure.
///
/// HTTP status mapping and retry decisions are functions of this kind, never
/// of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    /// The platform rejected the access token.
    AuthExpired,
    /// The refresh exchange failed; the user has to reconnect the account.
    RefreshFailed,
    /// The platform throttled us. Retried by the next scheduled run.
    RateLimited,
    /// Connectivity or timeout on a single platform call.
    TransientNetwork,
    /// Writes to the metrics store failed.
    PersistenceFailure,
    /// Anything else: schema drift, unsupported platform, API error envelopes.
    Unexpected,
}

impl SyncErrorKind {
    /// True for failures the account owner can only fix by reconnecting.
    #[must_use]
    pub fn is_auth(self) -> bool {
        matches!(self, SyncErrorKind::AuthExpired | SyncErrorKind::RefreshFailed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncErrorKind::AuthExpired => "auth_expired",
            SyncErrorKind::RefreshFailed => "refresh_failed",
            SyncErrorKind::RateLimited => "rate_limited",
            SyncErrorKind::TransientNetwork => "transient_network",
            SyncErrorKind::PersistenceFailure => "persistence_failure",
            SyncErrorKind::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged per-account failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error reported when no usable token could be obtained.
    #[must_use]
    pub fn token_expired() -> Self {
        Self::new(
            SyncErrorKind::RefreshFailed,
            "token expired or revoked; reconnect the account",
        )
    }
}

/// Outcome of syncing one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub account_id: Uuid,
    /// Stored platform string, kept raw so unsupported values still report.
    pub platform: String,
    pub posts_found: u32,
    pub posts_synced: u32,
    pub status: SyncStatus,
    pub error_kind: Option<SyncErrorKind>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

impl SyncResult {
    /// Result for an account that could not be reached or authorized.
    #[must_use]
    pub fn failed(account_id: Uuid, platform: &str, error: SyncError, duration_ms: u64) -> Self {
        Self {
            account_id,
            platform: platform.to_string(),
            posts_found: 0,
            posts_synced: 0,
            status: SyncStatus::Error,
            error_kind: Some(error.kind),
            error_message: Some(error.message),
            duration_ms,
        }
    }

    /// Derive the result for an account whose fetch succeeded.
    ///
    /// `account_update_failed` marks a failed followers/`last_sync_at` write,
    /// which keeps the result from being a clean success.
    #[must_use]
    pub fn from_counts(
        account_id: Uuid,
        platform: &str,
        posts_found: u32,
        posts_synced: u32,
        account_update_failed: bool,
        duration_ms: u64,
    ) -> Self {
        let failed_posts = posts_found.saturating_sub(posts_synced);

        let (status, error) = if posts_found > 0 && posts_synced == 0 {
            (
                SyncStatus::Error,
                Some(SyncError::new(
                    SyncErrorKind::PersistenceFailure,
                    format!("failed to persist all {posts_found} posts"),
                )),
            )
        } else if failed_posts > 0 {
            (
                SyncStatus::Partial,
                Some(SyncError::new(
                    SyncErrorKind::PersistenceFailure,
                    format!("failed to persist {failed_posts} of {posts_found} posts"),
                )),
            )
        } else if account_update_failed {
            (
                SyncStatus::Partial,
                Some(SyncError::new(
                    SyncErrorKind::PersistenceFailure,
                    "failed to update account stats",
                )),
            )
        } else {
            (SyncStatus::Success, None)
        };

        Self {
            account_id,
            platform: platform.to_string(),
            posts_found,
            posts_synced,
            status,
            error_kind: error.as_ref().map(|e| e.kind),
            error_message: error.map(|e| e.message),
            duration_ms,
        }
    }
}

/// Aggregate outcome of a sync-all run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAllSummary {
    pub total: usize,
    pub synced: usize,
    pub failed: usize,
    /// Completion order, not dispatch order. Match on `account_id`.
    pub results: Vec<SyncResult>,
    pub duration_ms: u64,
}

impl SyncAllSummary {
    #[must_use]
    pub fn from_results(results: Vec<SyncResult>, duration_ms: u64) -> Self {
        let synced = results.iter().filter(|r| r.status.is_synced()).count();
        Self {
            total: results.len(),
            synced,
            failed: results.len() - synced,
            results,
            duration_ms,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &SyncResult> {
        self.results
            .iter()
            .filter(|r| r.status == SyncStatus::Error)
    }
}

/// Outcome of a best-effort token refresh sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSweepSummary {
    pub refreshed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Outcome of a follower snapshot pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub created: usize,
    pub accounts: usize,
}
