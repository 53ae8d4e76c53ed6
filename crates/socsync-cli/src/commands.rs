//! Command handlers. Each builds the sync stack against the live pool and
//! prints a one-line summary; per-account detail goes to the log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use socsync_core::{AppConfig, SyncTrigger};
use socsync_platforms::PlatformRegistry;
use socsync_sync::{PgSyncStore, SyncOrchestrator};
use sqlx::PgPool;
use uuid::Uuid;

fn build_orchestrator(pool: &PgPool, config: &AppConfig) -> anyhow::Result<SyncOrchestrator> {
    let platforms =
        PlatformRegistry::from_app_config(config).context("failed to build platform clients")?;
    let store = Arc::new(PgSyncStore::new(pool.clone()));
    Ok(SyncOrchestrator::from_app_config(store, platforms, config))
}

/// Runs a full sync. `manual` also picks up accounts with auto-sync off.
///
/// # Errors
///
/// Returns an error if the run misses its deadline or the account list
/// cannot be loaded. Individual account failures are reported, not returned.
pub(crate) async fn run_sync_all(
    pool: &PgPool,
    config: &AppConfig,
    manual: bool,
    deadline_secs: u64,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(pool, config)?;
    let trigger = if manual {
        SyncTrigger::Manual
    } else {
        SyncTrigger::Cron
    };

    let summary = orchestrator
        .sync_all(trigger, Duration::from_secs(deadline_secs))
        .await?;

    for result in summary.errors() {
        println!(
            "  {} {}: {}",
            result.platform,
            result.account_id,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    println!(
        "sync complete: {} total, {} synced, {} failed in {} ms",
        summary.total, summary.synced, summary.failed, summary.duration_ms
    );
    Ok(())
}

pub(crate) async fn run_sync_account(
    pool: &PgPool,
    config: &AppConfig,
    account_id: Uuid,
) -> anyhow::Result<()> {
    let account = socsync_db::get_social_account_by_public_id(pool, account_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or_else(|| anyhow::anyhow!("active account '{account_id}' not found"))?;

    let orchestrator = build_orchestrator(pool, config)?;
    let result = orchestrator
        .executor()
        .sync_account(&account, SyncTrigger::Manual)
        .await;

    println!(
        "{} {}: {} ({} found, {} synced, {} ms)",
        result.platform,
        result.account_id,
        result.status.as_str(),
        result.posts_found,
        result.posts_synced,
        result.duration_ms
    );
    if let Some(message) = &result.error_message {
        println!("  error: {message}");
    }
    if !result.status.is_synced() {
        anyhow::bail!("sync failed for account '{account_id}'");
    }
    Ok(())
}

pub(crate) async fn run_refresh_tokens(
    pool: &PgPool,
    config: &AppConfig,
    user_id: Option<i64>,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(pool, config)?;
    let tokens = orchestrator.tokens();
    let summary = match user_id {
        Some(user_id) => tokens.refresh_user_accounts(user_id).await,
        None => tokens.refresh_sweep().await,
    };
    println!(
        "token refresh: {} refreshed, {} failed, {} checked",
        summary.refreshed, summary.failed, summary.total
    );
    Ok(())
}

pub(crate) async fn run_snapshot(
    pool: &PgPool,
    config: &AppConfig,
    user_id: Option<i64>,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(pool, config)?;
    let summary = socsync_sync::take_follower_snapshots(
        orchestrator.store().as_ref(),
        user_id,
        Utc::now().date_naive(),
    )
    .await;
    println!(
        "snapshot: {} created for {} accounts",
        summary.created, summary.accounts
    );
    Ok(())
}
