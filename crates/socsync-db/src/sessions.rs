//! Read-only session lookup. Sessions are issued by the web application.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionUser {
    pub user_id: i64,
    pub public_id: Uuid,
}

/// Resolves an unexpired session by the SHA-256 hex digest of its token.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_session_user(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<SessionUser>, DbError> {
    let row = sqlx::query_as::<_, SessionUser>(
        "SELECT u.id AS user_id, u.public_id \
         FROM user_sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token_hash = $1 AND s.expires_at > NOW()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
