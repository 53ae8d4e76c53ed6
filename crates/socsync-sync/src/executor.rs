//! Per-account sync: token, fetch, persist, report.
//!
//! [`SyncExecutor::sync_account`] never fails. Every failure is folded into
//! the returned [`SyncResult`] so one account cannot disturb another.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use socsync_core::{CoreError, Platform, SyncError, SyncErrorKind, SyncResult, SyncStatus, SyncTrigger};
use socsync_db::SocialAccountRow;
use socsync_platforms::{AccountRef, AccountStats, PlatformError, PlatformRegistry};

use crate::elapsed_ms;
use crate::store::{followers_to_column, SyncStore};
use crate::token::TokenManager;

struct PersistCounts {
    found: u32,
    synced: u32,
    account_update_failed: bool,
}

pub struct SyncExecutor {
    store: Arc<dyn SyncStore>,
    platforms: PlatformRegistry,
    tokens: Arc<TokenManager>,
    post_limit: u32,
}

impl SyncExecutor {
    #[must_use]
    pub fn new(
        store: Arc<dyn SyncStore>,
        platforms: PlatformRegistry,
        tokens: Arc<TokenManager>,
        post_limit: u32,
    ) -> Self {
        Self {
            store,
            platforms,
            tokens,
            post_limit,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Syncs one account end to end and reports the outcome.
    pub async fn sync_account(&self, account: &SocialAccountRow, trigger: SyncTrigger) -> SyncResult {
        let started = Instant::now();
        let outcome = self.run(account).await;
        let duration_ms = elapsed_ms(started);

        let result = match outcome {
            Ok(counts) => SyncResult::from_counts(
                account.public_id,
                &account.platform,
                counts.found,
                counts.synced,
                counts.account_update_failed,
                duration_ms,
            ),
            Err(error) => SyncResult::failed(account.public_id, &account.platform, error, duration_ms),
        };

        match result.status {
            SyncStatus::Success => tracing::info!(
                account_id = %account.public_id,
                platform = %account.platform,
                %trigger,
                posts = result.posts_synced,
                duration_ms,
                "account synced"
            ),
            SyncStatus::Partial | SyncStatus::Error => tracing::warn!(
                account_id = %account.public_id,
                platform = %account.platform,
                %trigger,
                status = ?result.status,
                error_kind = ?result.error_kind,
                error = result.error_message.as_deref().unwrap_or_default(),
                posts_found = result.posts_found,
                posts_synced = result.posts_synced,
                duration_ms,
                "account sync incomplete"
            ),
        }
        result
    }

    async fn run(&self, account: &SocialAccountRow) -> Result<PersistCounts, SyncError> {
        let platform: Platform = account
            .platform
            .parse()
            .map_err(|e: CoreError| SyncError::new(SyncErrorKind::Unexpected, e.to_string()))?;
        let adapter = self.platforms.adapter(platform).ok_or_else(|| {
            SyncError::new(
                SyncErrorKind::Unexpected,
                format!("no adapter registered for {platform}"),
            )
        })?;

        let valid = self.tokens.ensure_valid_token(account).await?;
        let mut session = TokenSession {
            token: valid.access_token,
            refreshed: valid.refreshed,
        };
        let account_ref = AccountRef {
            platform_user_id: &account.platform_user_id,
            username: account.username.as_deref(),
        };

        let stats = loop {
            match adapter.fetch_account_stats(&session.token, &account_ref).await {
                Ok(stats) => break stats,
                Err(e) => self.recover(account, &mut session, e).await?,
            }
        };
        // Persisted whatever happens to the post fetch.
        let account_update_failed = self.record_stats(account, &stats).await;

        let posts = loop {
            match adapter
                .fetch_recent_posts(&session.token, &account_ref, self.post_limit)
                .await
            {
                Ok(posts) => break posts,
                Err(e) => self.recover(account, &mut session, e).await?,
            }
        };

        let found = u32::try_from(posts.len()).unwrap_or(u32::MAX);
        let mut synced: u32 = 0;
        for post in &posts {
            match self.store.upsert_post_metrics(account.id, platform, post).await {
                Ok(()) => synced += 1,
                Err(e) => tracing::warn!(
                    account_id = %account.public_id,
                    external_post_id = %post.external_id,
                    error = %e,
                    "failed to persist post metrics"
                ),
            }
        }

        Ok(PersistCounts {
            found,
            synced,
            account_update_failed,
        })
    }

    /// Returns true when the write failed.
    async fn record_stats(&self, account: &SocialAccountRow, stats: &AccountStats) -> bool {
        match self
            .store
            .record_account_stats(account.id, followers_to_column(stats.followers_count), Utc::now())
            .await
        {
            Ok(()) => false,
            Err(e) => {
                tracing::error!(
                    account_id = %account.public_id,
                    error = %e,
                    "failed to record account stats"
                );
                true
            }
        }
    }

    /// Handles a failed platform call. The first auth rejection of the
    /// attempt swaps in a freshly refreshed token so the call can be
    /// repeated; anything else, including a rejection after a refresh, ends
    /// the attempt.
    async fn recover(
        &self,
        account: &SocialAccountRow,
        session: &mut TokenSession,
        error: PlatformError,
    ) -> Result<(), SyncError> {
        if !error.is_auth_expired() || session.refreshed {
            return Err(SyncError::new(error.kind(), error.to_string()));
        }
        tracing::info!(
            account_id = %account.public_id,
            error = %error,
            "platform rejected token; forcing refresh"
        );
        session.token = self.tokens.force_refresh(account).await?;
        session.refreshed = true;
        Ok(())
    }
}

/// Token state for one attempt. At most one refresh happens per attempt.
struct TokenSession {
    token: String,
    refreshed: bool,
}
