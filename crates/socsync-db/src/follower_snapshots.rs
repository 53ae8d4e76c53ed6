//! Database operations for `follower_snapshots`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `follower_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowerSnapshotRow {
    pub id: i64,
    pub social_account_id: i64,
    pub snapshot_date: NaiveDate,
    pub followers_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts the follower count for one account on one calendar day.
///
/// Conflicts on (`social_account_id`, `snapshot_date`) overwrite
/// `followers_count`, so the last write of the day wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_follower_snapshot(
    pool: &PgPool,
    social_account_id: i64,
    snapshot_date: NaiveDate,
    followers_count: i32,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO follower_snapshots (social_account_id, snapshot_date, followers_count) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (social_account_id, snapshot_date) DO UPDATE SET \
             followers_count = EXCLUDED.followers_count, \
             updated_at      = NOW() \
         RETURNING id",
    )
    .bind(social_account_id)
    .bind(snapshot_date)
    .bind(followers_count)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Returns the snapshots for an account in date order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_follower_snapshots(
    pool: &PgPool,
    social_account_id: i64,
) -> Result<Vec<FollowerSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, FollowerSnapshotRow>(
        "SELECT id, social_account_id, snapshot_date, followers_count, created_at, updated_at \
         FROM follower_snapshots \
         WHERE social_account_id = $1 \
         ORDER BY snapshot_date",
    )
    .bind(social_account_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
