//! Daily follower snapshots and follower-goal progress.

use chrono::NaiveDate;
use socsync_core::SnapshotSummary;

use crate::store::SyncStore;

/// Records today's follower count for each active account and pushes the
/// count into that account's active follower goals.
///
/// `user_id = None` covers every user (scheduled run). Re-running on the same
/// day overwrites the day's row. Per-account failures are logged and skipped.
pub async fn take_follower_snapshots(
    store: &dyn SyncStore,
    user_id: Option<i64>,
    today: NaiveDate,
) -> SnapshotSummary {
    let listed = match user_id {
        Some(user_id) => store.list_user_active_accounts(user_id).await,
        None => store.list_active_accounts().await,
    };
    let accounts = match listed {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::error!(?user_id, error = %e, "snapshot: failed to list active accounts");
            return SnapshotSummary::default();
        }
    };

    let mut summary = SnapshotSummary {
        accounts: accounts.len(),
        ..SnapshotSummary::default()
    };
    for account in &accounts {
        if let Err(e) = store
            .upsert_follower_snapshot(account.id, today, account.followers_count)
            .await
        {
            tracing::warn!(account_id = %account.public_id, error = %e, "snapshot: upsert failed");
            continue;
        }
        summary.created += 1;

        match store
            .propagate_follower_goals(account.id, account.followers_count)
            .await
        {
            Ok(0) => {}
            Ok(updated) => {
                tracing::debug!(account_id = %account.public_id, updated, "snapshot: follower goals updated");
            }
            Err(e) => {
                tracing::warn!(account_id = %account.public_id, error = %e, "snapshot: goal update failed");
            }
        }
    }

    tracing::info!(
        created = summary.created,
        accounts = summary.accounts,
        %today,
        "snapshot: complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, FakeStore};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[tokio::test]
    async fn snapshots_every_active_account() {
        let store = FakeStore::default();
        let mut a = account(1, "instagram");
        a.followers_count = 120;
        let mut b = account(2, "tiktok");
        b.followers_count = 4_000;
        let mut inactive = account(3, "tiktok");
        inactive.is_active = false;
        store.set_accounts(vec![a, b, inactive]);

        let summary = take_follower_snapshots(&store, None, date(16)).await;

        assert_eq!(summary, SnapshotSummary { created: 2, accounts: 2 });
        assert_eq!(store.snapshot(1, date(16)), Some(120));
        assert_eq!(store.snapshot(2, date(16)), Some(4_000));
        assert_eq!(store.snapshot(3, date(16)), None);
        assert_eq!(store.goals(), vec![(1, 120), (2, 4_000)]);
    }

    #[tokio::test]
    async fn same_day_rerun_keeps_latest_value() {
        let store = FakeStore::default();
        let mut a = account(1, "instagram");
        a.followers_count = 100;
        store.set_accounts(vec![a.clone()]);
        take_follower_snapshots(&store, None, date(16)).await;

        a.followers_count = 105;
        store.set_accounts(vec![a]);
        take_follower_snapshots(&store, None, date(16)).await;

        assert_eq!(store.snapshot(1, date(16)), Some(105));
    }

    #[tokio::test]
    async fn user_scope_only_touches_that_user() {
        let store = FakeStore::default();
        let mut other = account(2, "instagram");
        other.user_id = 9;
        store.set_accounts(vec![account(1, "instagram"), other]);

        let summary = take_follower_snapshots(&store, Some(1), date(16)).await;

        assert_eq!(summary, SnapshotSummary { created: 1, accounts: 1 });
        assert_eq!(store.snapshot(2, date(16)), None);
    }

    #[tokio::test]
    async fn failing_account_is_skipped() {
        let store = FakeStore::default();
        store.set_accounts(vec![account(1, "instagram"), account(2, "instagram")]);
        store.fail_snapshot(1);

        let summary = take_follower_snapshots(&store, None, date(16)).await;

        assert_eq!(summary, SnapshotSummary { created: 1, accounts: 2 });
        assert_eq!(store.goals(), vec![(2, 0)]);
    }

    #[tokio::test]
    async fn listing_failure_yields_empty_summary() {
        let store = FakeStore::default();
        store.fail_listing();
        assert_eq!(
            take_follower_snapshots(&store, None, date(16)).await,
            SnapshotSummary::default()
        );
    }
}
