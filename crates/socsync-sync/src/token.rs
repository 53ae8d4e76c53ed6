//! Token lifecycle: refresh ahead of expiry, forced refresh after an auth
//! rejection, and the periodic best-effort sweep.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use socsync_core::{Platform, RefreshSweepSummary, SyncError};
use socsync_db::{DbError, SocialAccountRow};
use socsync_platforms::{PlatformRegistry, TokenCredentials};

use crate::store::SyncStore;

/// Access token to use for the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidToken {
    pub access_token: String,
    /// Set when this call already spent the attempt's single refresh.
    pub refreshed: bool,
}

pub struct TokenManager {
    store: Arc<dyn SyncStore>,
    platforms: PlatformRegistry,
    margin: Duration,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, platforms: PlatformRegistry, margin_secs: i64) -> Self {
        Self {
            store,
            platforms,
            margin: Duration::seconds(margin_secs.max(0)),
        }
    }

    /// True when the stored expiry falls inside the safety margin. Tokens
    /// without a recorded expiry are never considered due.
    #[must_use]
    pub fn needs_refresh(&self, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        expires_at.is_some_and(|expires| expires - self.margin <= now)
    }

    /// Returns a token that is valid for at least the safety margin,
    /// refreshing and persisting a new one when the stored token is close to
    /// expiry.
    ///
    /// # Errors
    ///
    /// Returns a `RefreshFailed` [`SyncError`] if the exchange or the write
    /// of the new credentials fails.
    pub async fn ensure_valid_token(&self, account: &SocialAccountRow) -> Result<ValidToken, SyncError> {
        if !self.needs_refresh(account.token_expires_at, Utc::now()) {
            return Ok(ValidToken {
                access_token: account.access_token.clone(),
                refreshed: false,
            });
        }
        tracing::debug!(
            account_id = %account.public_id,
            platform = %account.platform,
            "token inside refresh margin; refreshing"
        );
        let access_token = self.force_refresh(account).await?;
        Ok(ValidToken {
            access_token,
            refreshed: true,
        })
    }

    /// Refreshes unconditionally. Used after the platform rejects a token
    /// the stored expiry still considered valid.
    ///
    /// # Errors
    ///
    /// Returns a `RefreshFailed` [`SyncError`] if the platform has no token
    /// exchange, the exchange fails, or the new credentials cannot be saved.
    pub async fn force_refresh(&self, account: &SocialAccountRow) -> Result<String, SyncError> {
        let platform: Platform = account.platform.parse().map_err(|e| {
            tracing::warn!(account_id = %account.public_id, error = %e, "cannot refresh token");
            SyncError::token_expired()
        })?;
        let Some(exchange) = self.platforms.exchange(platform) else {
            tracing::warn!(account_id = %account.public_id, %platform, "no token exchange registered");
            return Err(SyncError::token_expired());
        };

        let credentials = TokenCredentials {
            access_token: account.access_token.clone(),
            refresh_token: account.refresh_token.clone(),
        };
        let grant = exchange.refresh(&credentials).await.map_err(|e| {
            tracing::warn!(
                account_id = %account.public_id,
                %platform,
                error = %e,
                "token refresh failed"
            );
            SyncError::token_expired()
        })?;

        if let Err(e) = self.store.save_token_grant(account.id, &grant).await {
            tracing::error!(
                account_id = %account.public_id,
                %platform,
                error = %e,
                "failed to persist refreshed token"
            );
            return Err(SyncError::token_expired());
        }

        tracing::info!(
            account_id = %account.public_id,
            %platform,
            expires_at = ?grant.expires_at,
            "token refreshed"
        );
        Ok(grant.access_token)
    }

    /// Refreshes every active account whose token is inside the margin.
    ///
    /// Failures are logged and counted, never returned. Accounts that do not
    /// need a refresh count toward `total` only.
    pub async fn refresh_sweep(&self) -> RefreshSweepSummary {
        let listed = self.store.list_active_accounts().await;
        self.sweep(listed, None).await
    }

    /// [`Self::refresh_sweep`] restricted to one user's active accounts.
    pub async fn refresh_user_accounts(&self, user_id: i64) -> RefreshSweepSummary {
        let listed = self.store.list_user_active_accounts(user_id).await;
        self.sweep(listed, Some(user_id)).await
    }

    async fn sweep(
        &self,
        listed: Result<Vec<SocialAccountRow>, DbError>,
        user_id: Option<i64>,
    ) -> RefreshSweepSummary {
        let accounts = match listed {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!(?user_id, error = %e, "token sweep: failed to list active accounts");
                return RefreshSweepSummary::default();
            }
        };

        let now = Utc::now();
        let mut summary = RefreshSweepSummary {
            total: accounts.len(),
            ..RefreshSweepSummary::default()
        };
        for account in accounts.iter().filter(|a| self.needs_refresh(a.token_expires_at, now)) {
            match self.force_refresh(account).await {
                Ok(_) => summary.refreshed += 1,
                Err(_) => summary.failed += 1,
            }
        }

        tracing::info!(
            ?user_id,
            refreshed = summary.refreshed,
            failed = summary.failed,
            total = summary.total,
            "token sweep complete"
        );
        summary
    }

    /// Runs [`Self::refresh_sweep`] on a detached task. The caller neither
    /// awaits nor cancels it; the outcome is only logged.
    pub fn spawn_refresh_sweep(self: Arc<Self>) {
        tokio::spawn(async move {
            let _summary = self.refresh_sweep().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, FakeExchange, FakeStore};
    use socsync_core::SyncErrorKind;

    fn manager(store: Arc<FakeStore>, exchange: Arc<FakeExchange>) -> TokenManager {
        let platforms = PlatformRegistry::new().with_exchange(Platform::Instagram, exchange);
        TokenManager::new(store, platforms, 86_400)
    }

    #[tokio::test]
    async fn token_without_expiry_is_used_as_is() {
        let store = Arc::new(FakeStore::default());
        let exchange = Arc::new(FakeExchange::granting("new"));
        let tokens = manager(store, exchange.clone());

        let mut acct = account(1, "instagram");
        acct.token_expires_at = None;

        assert_eq!(
            tokens.ensure_valid_token(&acct).await.unwrap(),
            ValidToken {
                access_token: "token-1".to_string(),
                refreshed: false,
            }
        );
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn healthy_token_is_not_refreshed() {
        let store = Arc::new(FakeStore::default());
        let exchange = Arc::new(FakeExchange::granting("new"));
        let tokens = manager(store, exchange.clone());

        let mut acct = account(1, "instagram");
        acct.token_expires_at = Some(Utc::now() + Duration::days(30));

        assert_eq!(
            tokens.ensure_valid_token(&acct).await.unwrap(),
            ValidToken {
                access_token: "token-1".to_string(),
                refreshed: false,
            }
        );
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn token_inside_margin_is_refreshed_and_saved() {
        let store = Arc::new(FakeStore::default());
        let exchange = Arc::new(FakeExchange::granting("fresh"));
        let tokens = manager(store.clone(), exchange.clone());

        let mut acct = account(7, "instagram");
        acct.token_expires_at = Some(Utc::now() + Duration::hours(2));

        assert_eq!(
            tokens.ensure_valid_token(&acct).await.unwrap(),
            ValidToken {
                access_token: "fresh".to_string(),
                refreshed: true,
            }
        );
        assert_eq!(exchange.calls(), 1);
        assert_eq!(store.saved_tokens(), vec![(7, "fresh".to_string())]);
    }

    #[tokio::test]
    async fn exchange_failure_is_refresh_failed() {
        let store = Arc::new(FakeStore::default());
        let exchange = Arc::new(FakeExchange::rejecting());
        let tokens = manager(store.clone(), exchange);

        let mut acct = account(1, "instagram");
        acct.token_expires_at = Some(Utc::now() - Duration::hours(1));

        let err = tokens.ensure_valid_token(&acct).await.unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::RefreshFailed);
        assert!(store.saved_tokens().is_empty());
    }

    #[tokio::test]
    async fn save_failure_is_refresh_failed() {
        let store = Arc::new(FakeStore::default());
        store.fail_token_saves();
        let exchange = Arc::new(FakeExchange::granting("fresh"));
        let tokens = manager(store, exchange);

        let err = tokens.force_refresh(&account(1, "instagram")).await.unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::RefreshFailed);
    }

    #[tokio::test]
    async fn missing_exchange_is_refresh_failed() {
        let store = Arc::new(FakeStore::default());
        let exchange = Arc::new(FakeExchange::granting("fresh"));
        let tokens = manager(store, exchange.clone());

        let err = tokens.force_refresh(&account(1, "tiktok")).await.unwrap_err();
        assert_eq!(err.kind, SyncErrorKind::RefreshFailed);
        assert_eq!(exchange.calls(), 0);
    }

    #[tokio::test]
    async fn sweep_counts_refreshed_failed_and_skipped() {
        let store = Arc::new(FakeStore::default());
        let mut due = account(1, "instagram");
        due.token_expires_at = Some(Utc::now() + Duration::hours(1));
        let mut healthy = account(2, "instagram");
        healthy.token_expires_at = Some(Utc::now() + Duration::days(40));
        let mut unsupported = account(3, "tiktok");
        unsupported.token_expires_at = Some(Utc::now() - Duration::minutes(5));
        store.set_accounts(vec![due, healthy, unsupported]);

        let exchange = Arc::new(FakeExchange::granting("fresh"));
        let summary = manager(store, exchange).refresh_sweep().await;

        assert_eq!(
            summary,
            RefreshSweepSummary {
                refreshed: 1,
                failed: 1,
                total: 3,
            }
        );
    }

    #[tokio::test]
    async fn user_sweep_ignores_other_users() {
        let store = Arc::new(FakeStore::default());
        let mut mine = account(1, "instagram");
        mine.token_expires_at = Some(Utc::now() + Duration::hours(1));
        let mut theirs = account(2, "instagram");
        theirs.user_id = 99;
        theirs.token_expires_at = Some(Utc::now() + Duration::hours(1));
        store.set_accounts(vec![mine, theirs]);

        let exchange = Arc::new(FakeExchange::granting("fresh"));
        let summary = manager(store.clone(), exchange).refresh_user_accounts(1).await;

        assert_eq!(summary.total, 1);
        assert_eq!(summary.refreshed, 1);
        assert_eq!(store.saved_tokens(), vec![(1, "fresh".to_string())]);
    }

    #[tokio::test]
    async fn sweep_swallows_listing_failure() {
        let store = Arc::new(FakeStore::default());
        store.fail_listing();
        let exchange = Arc::new(FakeExchange::granting("fresh"));

        let summary = manager(store, exchange).refresh_sweep().await;
        assert_eq!(summary, RefreshSweepSummary::default());
    }
}
