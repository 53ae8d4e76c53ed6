//! Background job scheduler.
//!
//! Registers the token refresh and follower snapshot jobs, plus an
//! in-process sync job when `SOCSYNC_SYNC_CRON` is set. Only one sync-all
//! runs at a time whether the scheduler or `/api/cron/sync` started it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use socsync_core::{AppConfig, SyncTrigger};
use socsync_sync::{SyncAllError, SyncOrchestrator};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it stops all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if a cron expression is invalid or the
/// scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Arc<SyncOrchestrator>,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match config.sync_cron.as_deref() {
        Some(cron) => {
            register_sync_job(&scheduler, Arc::clone(&orchestrator), cron, &config).await?;
        }
        None => tracing::info!(
            "scheduler: SOCSYNC_SYNC_CRON unset; scheduled syncs come from /api/cron/sync"
        ),
    }
    register_token_refresh_job(&scheduler, Arc::clone(&orchestrator), &config.token_refresh_cron)
        .await?;
    register_snapshot_job(&scheduler, orchestrator, &config.snapshot_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Overlap with a run started through `/api/cron/sync` is refused by the
/// orchestrator and logged here.
async fn register_sync_job(
    scheduler: &JobScheduler,
    orchestrator: Arc<SyncOrchestrator>,
    cron: &str,
    config: &AppConfig,
) -> Result<(), JobSchedulerError> {
    let deadline = Duration::from_secs(config.sync_deadline_secs);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);

        Box::pin(async move {
            tracing::info!("scheduler: starting sync run");
            match orchestrator.sync_all(SyncTrigger::Cron, deadline).await {
                Ok(summary) => tracing::info!(
                    total = summary.total,
                    synced = summary.synced,
                    failed = summary.failed,
                    "scheduler: sync run complete"
                ),
                Err(SyncAllError::AlreadyRunning) => {
                    tracing::warn!("scheduler: previous sync run still in progress; skipped");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: sync run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// The sweep runs detached so a slow refresh never holds the scheduler tick.
async fn register_token_refresh_job(
    scheduler: &JobScheduler,
    orchestrator: Arc<SyncOrchestrator>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let tokens = Arc::clone(orchestrator.tokens());

        Box::pin(async move {
            tracing::info!("scheduler: spawning token refresh sweep");
            tokens.spawn_refresh_sweep();
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn register_snapshot_job(
    scheduler: &JobScheduler,
    orchestrator: Arc<SyncOrchestrator>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);

        Box::pin(async move {
            tracing::info!("scheduler: starting follower snapshot run");
            let summary = socsync_sync::take_follower_snapshots(
                orchestrator.store().as_ref(),
                None,
                Utc::now().date_naive(),
            )
            .await;
            tracing::info!(
                created = summary.created,
                accounts = summary.accounts,
                "scheduler: follower snapshot run complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
