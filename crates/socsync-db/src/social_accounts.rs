//! Database operations for `social_accounts`.
//!
//! Rows are never deleted here. Accounts are soft-disabled through
//! `is_active = false` by the web application.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ACCOUNT_COLUMNS: &str = "id, public_id, user_id, platform, platform_user_id, username, \
     access_token, refresh_token, token_expires_at, is_active, auto_sync, \
     followers_count, last_sync_at, created_at, updated_at";

/// A row from the `social_accounts` table.
#[derive(Clone, sqlx::FromRow)]
pub struct SocialAccountRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: i64,
    /// `instagram` or `tiktok` (enforced by a CHECK constraint).
    pub platform: String,
    /// Instagram user id or TikTok `open_id`.
    pub platform_user_id: String,
    pub username: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub auto_sync: bool,
    pub followers_count: i32,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for SocialAccountRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialAccountRow")
            .field("id", &self.id)
            .field("public_id", &self.public_id)
            .field("user_id", &self.user_id)
            .field("platform", &self.platform)
            .field("platform_user_id", &self.platform_user_id)
            .field("username", &self.username)
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("token_expires_at", &self.token_expires_at)
            .field("is_active", &self.is_active)
            .field("auto_sync", &self.auto_sync)
            .field("followers_count", &self.followers_count)
            .field("last_sync_at", &self.last_sync_at)
            .finish_non_exhaustive()
    }
}

/// Returns every active account, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_social_accounts(pool: &PgPool) -> Result<Vec<SocialAccountRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM social_accounts WHERE is_active = true ORDER BY id"
    );
    let rows = sqlx::query_as::<_, SocialAccountRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns the active accounts owned by `user_id`, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_user_active_social_accounts(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<SocialAccountRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM social_accounts \
         WHERE user_id = $1 AND is_active = true ORDER BY id"
    );
    let rows = sqlx::query_as::<_, SocialAccountRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetches an account by its public id regardless of owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_social_account_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<SocialAccountRow>, DbError> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM social_accounts WHERE public_id = $1");
    let row = sqlx::query_as::<_, SocialAccountRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetches an account only if it belongs to `user_id`.
///
/// Ownership mismatches look identical to missing rows, so other users' account
/// ids cannot be discovered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_social_account(
    pool: &PgPool,
    user_id: i64,
    public_id: Uuid,
) -> Result<Option<SocialAccountRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM social_accounts WHERE public_id = $1 AND user_id = $2"
    );
    let row = sqlx::query_as::<_, SocialAccountRow>(&sql)
        .bind(public_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Persists the result of a token refresh exchange.
///
/// A `None` refresh token keeps the stored one; platforms that rotate refresh
/// tokens return a new value, the others do not.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] if
/// the update fails.
pub async fn update_account_tokens(
    pool: &PgPool,
    id: i64,
    access_token: &str,
    refresh_token: Option<&str>,
    token_expires_at: Option<DateTime<Utc>>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE social_accounts \
         SET access_token = $1, \
             refresh_token = COALESCE($2, refresh_token), \
             token_expires_at = $3, \
             updated_at = NOW() \
         WHERE id = $4",
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(token_expires_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Records the follower count observed by a sync and stamps `last_sync_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] if
/// the update fails.
pub async fn record_account_stats(
    pool: &PgPool,
    id: i64,
    followers_count: i32,
    synced_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE social_accounts \
         SET followers_count = $1, last_sync_at = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(followers_count)
    .bind(synced_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Sets `auto_sync` on an active account owned by `user_id`.
///
/// Returns the stored flag, or `None` when the account does not exist, is not
/// owned by the user, or is inactive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_auto_sync(
    pool: &PgPool,
    user_id: i64,
    public_id: Uuid,
    auto_sync: bool,
) -> Result<Option<bool>, DbError> {
    let stored = sqlx::query_scalar::<_, bool>(
        "UPDATE social_accounts \
         SET auto_sync = $1, updated_at = NOW() \
         WHERE public_id = $2 AND user_id = $3 AND is_active = true \
         RETURNING auto_sync",
    )
    .bind(auto_sync)
    .bind(public_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(stored)
}
