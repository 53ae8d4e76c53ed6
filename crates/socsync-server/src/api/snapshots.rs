use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::middleware::CurrentUser;

use super::AppState;

#[derive(Debug, Serialize)]
pub(super) struct SnapshotResponse {
    ok: bool,
    created: usize,
    accounts: usize,
}

/// Records today's follower counts for the caller's active accounts.
pub(super) async fn take_snapshots(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<SnapshotResponse> {
    let summary = socsync_sync::take_follower_snapshots(
        state.orchestrator.store().as_ref(),
        Some(user.user_id),
        Utc::now().date_naive(),
    )
    .await;

    Json(SnapshotResponse {
        ok: true,
        created: summary.created,
        accounts: summary.accounts,
    })
}
