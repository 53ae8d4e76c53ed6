use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::CurrentUser;

use super::AppState;

#[derive(Debug, Serialize)]
pub(super) struct RefreshResponse {
    refreshed: usize,
    failed: usize,
    total: usize,
}

/// Refreshes the caller's tokens that are close to expiry. Always 200;
/// internal failures show up as zero counts.
pub(super) async fn refresh_tokens(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<RefreshResponse> {
    let summary = state
        .orchestrator
        .tokens()
        .refresh_user_accounts(user.user_id)
        .await;

    Json(RefreshResponse {
        refreshed: summary.refreshed,
        failed: summary.failed,
        total: summary.total,
    })
}
