//! Batch sync across all eligible accounts under one global deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use socsync_core::{AppConfig, SyncAllSummary, SyncResult, SyncTrigger};
use socsync_db::SocialAccountRow;
use socsync_platforms::PlatformRegistry;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::elapsed_ms;
use crate::executor::SyncExecutor;
use crate::store::SyncStore;
use crate::token::TokenManager;

/// Run-level failures. Per-account failures never surface here.
#[derive(Debug, Error)]
pub enum SyncAllError {
    /// The run did not settle before the deadline. Accounts still in flight
    /// were abandoned; writes they already committed remain.
    #[error("sync-all exceeded its deadline of {deadline_ms} ms")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("failed to load accounts: {0}")]
    Store(String),

    /// Another sync-all is still in progress in this process.
    #[error("a sync-all run is already in progress")]
    AlreadyRunning,
}

pub struct SyncOrchestrator {
    store: Arc<dyn SyncStore>,
    executor: Arc<SyncExecutor>,
    max_concurrent: usize,
    /// Held for the duration of a run; overlapping runs are refused.
    running: Mutex<()>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, executor: Arc<SyncExecutor>, max_concurrent: usize) -> Self {
        Self {
            store,
            executor,
            max_concurrent: max_concurrent.max(1),
            running: Mutex::new(()),
        }
    }

    /// Wires the token manager, executor and orchestrator from configuration.
    #[must_use]
    pub fn from_app_config(
        store: Arc<dyn SyncStore>,
        platforms: PlatformRegistry,
        config: &AppConfig,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&store),
            platforms.clone(),
            config.token_refresh_margin_secs,
        ));
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&store),
            platforms,
            tokens,
            config.sync_post_limit,
        ));
        Self::new(store, executor, config.sync_max_concurrent_accounts)
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<SyncExecutor> {
        &self.executor
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        self.executor.tokens()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SyncStore> {
        &self.store
    }

    /// Syncs every eligible account, at most `max_concurrent` at a time.
    ///
    /// The summary is built only after every account has settled. Result
    /// order is completion order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncAllError::DeadlineExceeded`] if the run is still going
    /// when `deadline` elapses, [`SyncAllError::Store`] if the account list
    /// cannot be loaded, or [`SyncAllError::AlreadyRunning`] if another run
    /// on this orchestrator has not settled yet.
    pub async fn sync_all(
        &self,
        trigger: SyncTrigger,
        deadline: Duration,
    ) -> Result<SyncAllSummary, SyncAllError> {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!(%trigger, "sync-all already in progress; skipping");
            return Err(SyncAllError::AlreadyRunning);
        };
        let started = Instant::now();
        let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);

        let run = async {
            let accounts = self
                .store
                .list_active_accounts()
                .await
                .map_err(|e| SyncAllError::Store(e.to_string()))?;
            let selected = select_accounts(accounts, trigger);
            tracing::info!(%trigger, accounts = selected.len(), "sync-all starting");

            let results: Vec<SyncResult> = stream::iter(selected)
                .map(|account| async move { self.executor.sync_account(&account, trigger).await })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;
            Ok::<_, SyncAllError>(results)
        };

        match tokio::time::timeout(deadline, run).await {
            Ok(Ok(results)) => {
                let summary = SyncAllSummary::from_results(results, elapsed_ms(started));
                tracing::info!(
                    %trigger,
                    total = summary.total,
                    synced = summary.synced,
                    failed = summary.failed,
                    duration_ms = summary.duration_ms,
                    "sync-all complete"
                );
                Ok(summary)
            }
            Ok(Err(e)) => {
                tracing::error!(%trigger, error = %e, "sync-all aborted");
                Err(e)
            }
            Err(_elapsed) => {
                tracing::error!(%trigger, deadline_ms, "sync-all deadline exceeded");
                Err(SyncAllError::DeadlineExceeded { deadline_ms })
            }
        }
    }
}

/// Keeps active accounts and, for scheduled runs, only those with
/// auto-sync enabled.
#[must_use]
pub fn select_accounts(accounts: Vec<SocialAccountRow>, trigger: SyncTrigger) -> Vec<SocialAccountRow> {
    accounts
        .into_iter()
        .filter(|a| a.is_active && (!trigger.requires_auto_sync() || a.auto_sync))
        .collect()
}
