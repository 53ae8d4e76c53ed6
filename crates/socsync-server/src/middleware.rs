use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::AppState;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The user behind a valid session token, stored as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: i64,
    pub public_id: Uuid,
}

/// Shared secret for the scheduled sync endpoint. `None` means the
/// deployment never configured one, which is a server error, not an auth
/// failure.
#[derive(Clone)]
pub struct CronAuth {
    secret: Option<Arc<str>>,
}

impl CronAuth {
    #[must_use]
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn middleware_error(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct CronAuthFailure {
    ok: bool,
    error: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Guards the scheduled sync endpoint with `Authorization: Bearer <secret>`.
///
/// The comparison is constant-time. An unset secret answers 500 so a
/// misconfigured deployment is distinguishable from a bad caller.
pub async fn require_cron_secret(State(auth): State<CronAuth>, req: Request, next: Next) -> Response {
    let Some(secret) = auth.secret.as_deref() else {
        tracing::error!("cron sync called but SOCSYNC_CRON_SECRET is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CronAuthFailure {
                ok: false,
                error: "cron secret is not configured",
            }),
        )
            .into_response();
    };

    let authorized = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .is_some_and(|token| bool::from(token.as_bytes().ct_eq(secret.as_bytes())));

    if authorized {
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(CronAuthFailure {
                ok: false,
                error: "unauthorized",
            }),
        )
            .into_response()
    }
}

/// Resolves `Authorization: Bearer <session token>` to a [`CurrentUser`].
///
/// Only the SHA-256 digest of the token is looked up; raw session tokens are
/// never stored.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_bearer_token(req.headers().get(AUTHORIZATION)) else {
        return middleware_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid session token",
        );
    };
    let token_hash = hash_session_token(token);

    match socsync_db::find_session_user(&state.pool, &token_hash).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(CurrentUser {
                user_id: user.user_id,
                public_id: user.public_id,
            });
            next.run(req).await
        }
        Ok(None) => middleware_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid session token",
        ),
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            middleware_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "session lookup failed",
            )
        }
    }
}

pub(crate) fn hash_session_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
