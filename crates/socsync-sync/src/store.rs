//! Persistence seam for the sync core.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use socsync_core::Platform;
use socsync_db::{DbError, NewPostMetrics, SocialAccountRow};
use socsync_platforms::{FetchedPost, TokenGrant};
use sqlx::PgPool;

/// Every write is an idempotent upsert or an in-place update, so a retried
/// or abandoned run never leaves duplicates behind.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Active accounts across all users.
    async fn list_active_accounts(&self) -> Result<Vec<SocialAccountRow>, DbError>;

    async fn list_user_active_accounts(&self, user_id: i64) -> Result<Vec<SocialAccountRow>, DbError>;

    /// Persists refreshed credentials. A grant without a refresh token keeps
    /// the stored one.
    async fn save_token_grant(&self, account_id: i64, grant: &TokenGrant) -> Result<(), DbError>;

    async fn upsert_post_metrics(
        &self,
        account_id: i64,
        platform: Platform,
        post: &FetchedPost,
    ) -> Result<(), DbError>;

    async fn record_account_stats(
        &self,
        account_id: i64,
        followers_count: i32,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError>;

    async fn upsert_follower_snapshot(
        &self,
        account_id: i64,
        snapshot_date: NaiveDate,
        followers_count: i32,
    ) -> Result<(), DbError>;

    /// Returns the number of goals updated.
    async fn propagate_follower_goals(&self, account_id: i64, followers_count: i32) -> Result<u64, DbError>;
}

/// [`SyncStore`] backed by Postgres through `socsync-db`.
#[derive(Debug, Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn list_active_accounts(&self) -> Result<Vec<SocialAccountRow>, DbError> {
        socsync_db::list_active_social_accounts(&self.pool).await
    }

    async fn list_user_active_accounts(&self, user_id: i64) -> Result<Vec<SocialAccountRow>, DbError> {
        socsync_db::list_user_active_social_accounts(&self.pool, user_id).await
    }

    async fn save_token_grant(&self, account_id: i64, grant: &TokenGrant) -> Result<(), DbError> {
        socsync_db::update_account_tokens(
            &self.pool,
            account_id,
            &grant.access_token,
            grant.refresh_token.as_deref(),
            grant.expires_at,
        )
        .await
    }

    async fn upsert_post_metrics(
        &self,
        account_id: i64,
        platform: Platform,
        post: &FetchedPost,
    ) -> Result<(), DbError> {
        let metrics = NewPostMetrics {
            social_account_id: account_id,
            platform: platform.as_str(),
            external_post_id: &post.external_id,
            caption: post.caption.as_deref(),
            permalink: post.permalink.as_deref(),
            views: post.views,
            likes: post.likes,
            comments: post.comments,
            shares: post.shares,
            published_at: post.published_at,
        };
        socsync_db::upsert_post_metrics(&self.pool, &metrics).await?;
        Ok(())
    }

    async fn record_account_stats(
        &self,
        account_id: i64,
        followers_count: i32,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        socsync_db::record_account_stats(&self.pool, account_id, followers_count, synced_at).await
    }

    async fn upsert_follower_snapshot(
        &self,
        account_id: i64,
        snapshot_date: NaiveDate,
        followers_count: i32,
    ) -> Result<(), DbError> {
        socsync_db::upsert_follower_snapshot(&self.pool, account_id, snapshot_date, followers_count).await?;
        Ok(())
    }

    async fn propagate_follower_goals(&self, account_id: i64, followers_count: i32) -> Result<u64, DbError> {
        socsync_db::update_follower_goals(&self.pool, account_id, followers_count).await
    }
}

/// Clamps a platform follower count into the `INTEGER` column range.
#[must_use]
pub fn followers_to_column(count: i64) -> i32 {
    i32::try_from(count.max(0)).unwrap_or(i32::MAX)
}
