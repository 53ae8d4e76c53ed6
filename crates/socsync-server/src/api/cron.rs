//! Scheduled sync entry point, called by an external cron with the shared
//! secret.

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use socsync_core::{SyncAllSummary, SyncTrigger};
use uuid::Uuid;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CronSyncResponse {
    ok: bool,
    total: usize,
    synced: usize,
    failed: usize,
    duration_ms: u64,
    errors: Vec<CronSyncError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CronSyncError {
    account_id: Uuid,
    platform: String,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CronSyncFailure {
    ok: bool,
    error: String,
    duration_ms: u64,
}

impl From<&SyncAllSummary> for CronSyncResponse {
    fn from(summary: &SyncAllSummary) -> Self {
        let errors = summary
            .errors()
            .map(|r| CronSyncError {
                account_id: r.account_id,
                platform: r.platform.clone(),
                error: r
                    .error_message
                    .clone()
                    .or_else(|| r.error_kind.map(|k| k.to_string()))
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            ok: true,
            total: summary.total,
            synced: summary.synced,
            failed: summary.failed,
            duration_ms: summary.duration_ms,
            errors,
        }
    }
}

pub(super) async fn sync_all(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let deadline = Duration::from_secs(state.config.sync_deadline_secs);

    match state.orchestrator.sync_all(SyncTrigger::Cron, deadline).await {
        Ok(summary) => Json(CronSyncResponse::from(&summary)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CronSyncFailure {
                ok: false,
                error: e.to_string(),
                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            }),
        )
            .into_response(),
    }
}
