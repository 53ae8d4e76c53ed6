use sqlx::PgPool;

use crate::DbError;

/// Copies the latest follower count into every active `followers` goal tied
/// to the account. Returns the number of goals updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_follower_goals(
    pool: &PgPool,
    social_account_id: i64,
    followers_count: i32,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE goals \
         SET current_value = $1, updated_at = NOW() \
         WHERE social_account_id = $2 AND metric = 'followers' AND status = 'active'",
    )
    .bind(i64::from(followers_count))
    .bind(social_account_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
