//! Sync core: token lifecycle, per-account execution, batch orchestration
//! and follower snapshots.
//!
//! Everything here talks to persistence through [`SyncStore`] and to the
//! platforms through [`socsync_platforms::PlatformRegistry`], so the
//! pipeline runs the same against Postgres and against in-memory fakes.

pub mod executor;
pub mod orchestrator;
pub mod snapshot;
pub mod store;
pub mod token;

#[cfg(test)]
mod testing;

pub use executor::SyncExecutor;
pub use orchestrator::{SyncAllError, SyncOrchestrator};
pub use snapshot::take_follower_snapshots;
pub use store::{PgSyncStore, SyncStore};
pub use token::{TokenManager, ValidToken};

/// Milliseconds elapsed since `started`, saturating.
pub(crate) fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
