use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use socsync_core::{Platform, SyncTrigger};
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SyncQuery {
    /// Missing or unknown values answer 404 like a mismatch.
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncAccountResponse {
    /// Posts the platform returned.
    synced: u32,
    /// Posts whose metrics were persisted.
    metrics: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncAccountFailure {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AutoSyncRequest {
    account_id: Uuid,
    auto_sync: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AutoSyncResponse {
    success: bool,
    auto_sync: bool,
}

/// Manual sync of one of the caller's accounts.
///
/// A partial result is still a success. Failed syncs answer 401 when the
/// user has to reconnect the account and 500 otherwise.
pub(super) async fn sync_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<SyncQuery>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::new(req_id.0.clone(), "not_found", "account not found");

    let platform: Platform = query
        .platform
        .as_deref()
        .ok_or_else(not_found)?
        .parse()
        .map_err(|_| not_found())?;
    let account = socsync_db::get_user_social_account(&state.pool, user.user_id, account_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .filter(|a| a.is_active && a.platform == platform.as_str())
        .ok_or_else(not_found)?;

    tracing::info!(
        user = %user.public_id,
        account_id = %account.public_id,
        %platform,
        "manual sync requested"
    );
    let result = state
        .orchestrator
        .executor()
        .sync_account(&account, SyncTrigger::Manual)
        .await;

    if result.status.is_synced() {
        return Ok(Json(SyncAccountResponse {
            synced: result.posts_found,
            metrics: result.posts_synced,
        })
        .into_response());
    }

    let status = if result.error_kind.is_some_and(|k| k.is_auth()) {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let error = result
        .error_message
        .unwrap_or_else(|| "sync failed".to_string());
    Ok((status, Json(SyncAccountFailure { error })).into_response())
}

pub(super) async fn set_auto_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<AutoSyncRequest>, JsonRejection>,
) -> Result<Json<AutoSyncResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;

    let stored = socsync_db::set_auto_sync(&state.pool, user.user_id, request.account_id, request.auto_sync)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "account not found"))?;

    Ok(Json(AutoSyncResponse {
        success: true,
        auto_sync: stored,
    }))
}
