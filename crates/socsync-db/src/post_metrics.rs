//! Database operations for `post_metrics`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `post_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostMetricsRow {
    pub id: i64,
    pub social_account_id: i64,
    /// Link to an internal post. Set by the web application, never by sync.
    pub post_id: Option<i64>,
    pub platform: String,
    pub external_post_id: String,
    pub caption: Option<String>,
    pub permalink: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewPostMetrics<'a> {
    pub social_account_id: i64,
    pub platform: &'a str,
    pub external_post_id: &'a str,
    pub caption: Option<&'a str>,
    pub permalink: Option<&'a str>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub published_at: Option<DateTime<Utc>>,
}

/// Upserts one post observation. Returns the internal `id`.
///
/// Dedup key: (`social_account_id`, `platform`, `external_post_id`). A
/// re-sync overwrites the counters and caption in place; `post_id` is left
/// untouched so links made by the web application survive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post_metrics(
    pool: &PgPool,
    metrics: &NewPostMetrics<'_>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO post_metrics \
             (social_account_id, platform, external_post_id, caption, permalink, \
              views, likes, comments, shares, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (social_account_id, platform, external_post_id) DO UPDATE SET \
             caption      = COALESCE(EXCLUDED.caption, post_metrics.caption), \
             permalink    = COALESCE(EXCLUDED.permalink, post_metrics.permalink), \
             views        = EXCLUDED.views, \
             likes        = EXCLUDED.likes, \
             comments     = EXCLUDED.comments, \
             shares       = EXCLUDED.shares, \
             published_at = COALESCE(EXCLUDED.published_at, post_metrics.published_at), \
             collected_at = NOW(), \
             updated_at   = NOW() \
         RETURNING id",
    )
    .bind(metrics.social_account_id)
    .bind(metrics.platform)
    .bind(metrics.external_post_id)
    .bind(metrics.caption)
    .bind(metrics.permalink)
    .bind(metrics.views)
    .bind(metrics.likes)
    .bind(metrics.comments)
    .bind(metrics.shares)
    .bind(metrics.published_at)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Returns every metrics row for an account, newest publication first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_post_metrics(
    pool: &PgPool,
    social_account_id: i64,
) -> Result<Vec<PostMetricsRow>, DbError> {
    let rows = sqlx::query_as::<_, PostMetricsRow>(
        "SELECT id, social_account_id, post_id, platform, external_post_id, caption, \
                permalink, views, likes, comments, shares, published_at, \
                collected_at, updated_at \
         FROM post_metrics \
         WHERE social_account_id = $1 \
         ORDER BY published_at DESC NULLS LAST, id DESC",
    )
    .bind(social_account_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
