//! In-memory fakes shared by the unit tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use socsync_core::Platform;
use socsync_db::{DbError, SocialAccountRow};
use socsync_platforms::{
    AccountRef, AccountStats, FetchedPost, PlatformAdapter, PlatformError, TokenCredentials,
    TokenExchange, TokenGrant,
};
use uuid::Uuid;

use crate::store::SyncStore;

pub(crate) fn account(id: i64, platform: &str) -> SocialAccountRow {
    let now = Utc::now();
    SocialAccountRow {
        id,
        public_id: Uuid::from_u128(u128::try_from(id).unwrap_or_default()),
        user_id: 1,
        platform: platform.to_string(),
        platform_user_id: format!("remote-{id}"),
        username: Some(format!("user{id}")),
        access_token: format!("token-{id}"),
        refresh_token: Some(format!("refresh-{id}")),
        token_expires_at: None,
        is_active: true,
        auto_sync: true,
        followers_count: 0,
        last_sync_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn post(external_id: &str) -> FetchedPost {
    FetchedPost {
        external_id: external_id.to_string(),
        caption: None,
        permalink: None,
        views: 100,
        likes: 10,
        comments: 1,
        shares: 0,
        published_at: None,
    }
}

#[derive(Default)]
struct StoreState {
    accounts: Vec<SocialAccountRow>,
    saved_tokens: Vec<(i64, String)>,
    posts: HashMap<(i64, String), FetchedPost>,
    stats: Vec<(i64, i32)>,
    snapshots: HashMap<(i64, NaiveDate), i32>,
    goals: Vec<(i64, i32)>,
    fail_listing: bool,
    fail_token_saves: bool,
    fail_stats: bool,
    failing_posts: HashSet<String>,
    failing_snapshots: HashSet<i64>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut state = self.state.lock().expect("fake store lock poisoned");
        f(&mut state)
    }

    pub(crate) fn set_accounts(&self, accounts: Vec<SocialAccountRow>) {
        self.with_state(|s| s.accounts = accounts);
    }

    pub(crate) fn fail_listing(&self) {
        self.with_state(|s| s.fail_listing = true);
    }

    pub(crate) fn fail_token_saves(&self) {
        self.with_state(|s| s.fail_token_saves = true);
    }

    pub(crate) fn fail_stats(&self) {
        self.with_state(|s| s.fail_stats = true);
    }

    pub(crate) fn fail_post(&self, external_id: &str) {
        self.with_state(|s| s.failing_posts.insert(external_id.to_string()));
    }

    pub(crate) fn fail_snapshot(&self, account_id: i64) {
        self.with_state(|s| s.failing_snapshots.insert(account_id));
    }

    pub(crate) fn saved_tokens(&self) -> Vec<(i64, String)> {
        self.with_state(|s| s.saved_tokens.clone())
    }

    pub(crate) fn post_count(&self, account_id: i64) -> usize {
        self.with_state(|s| s.posts.keys().filter(|(id, _)| *id == account_id).count())
    }

    pub(crate) fn stats(&self) -> Vec<(i64, i32)> {
        self.with_state(|s| s.stats.clone())
    }

    pub(crate) fn snapshot(&self, account_id: i64, date: NaiveDate) -> Option<i32> {
        self.with_state(|s| s.snapshots.get(&(account_id, date)).copied())
    }

    pub(crate) fn goals(&self) -> Vec<(i64, i32)> {
        self.with_state(|s| s.goals.clone())
    }
}

#[async_trait]
impl SyncStore for FakeStore {
    async fn list_active_accounts(&self) -> Result<Vec<SocialAccountRow>, DbError> {
        self.with_state(|s| {
            if s.fail_listing {
                return Err(DbError::NotFound);
            }
            Ok(s.accounts.iter().filter(|a| a.is_active).cloned().collect())
        })
    }

    async fn list_user_active_accounts(&self, user_id: i64) -> Result<Vec<SocialAccountRow>, DbError> {
        self.with_state(|s| {
            if s.fail_listing {
                return Err(DbError::NotFound);
            }
            Ok(s.accounts
                .iter()
                .filter(|a| a.is_active && a.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    async fn save_token_grant(&self, account_id: i64, grant: &TokenGrant) -> Result<(), DbError> {
        self.with_state(|s| {
            if s.fail_token_saves {
                return Err(DbError::NotFound);
            }
            s.saved_tokens.push((account_id, grant.access_token.clone()));
            Ok(())
        })
    }

    async fn upsert_post_metrics(
        &self,
        account_id: i64,
        _platform: Platform,
        post: &FetchedPost,
    ) -> Result<(), DbError> {
        self.with_state(|s| {
            if s.failing_posts.contains(&post.external_id) {
                return Err(DbError::NotFound);
            }
            s.posts.insert((account_id, post.external_id.clone()), post.clone());
            Ok(())
        })
    }

    async fn record_account_stats(
        &self,
        account_id: i64,
        followers_count: i32,
        _synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.with_state(|s| {
            if s.fail_stats {
                return Err(DbError::NotFound);
            }
            s.stats.push((account_id, followers_count));
            Ok(())
        })
    }

    async fn upsert_follower_snapshot(
        &self,
        account_id: i64,
        snapshot_date: NaiveDate,
        followers_count: i32,
    ) -> Result<(), DbError> {
        self.with_state(|s| {
            if s.failing_snapshots.contains(&account_id) {
                return Err(DbError::NotFound);
            }
            s.snapshots.insert((account_id, snapshot_date), followers_count);
            Ok(())
        })
    }

    async fn propagate_follower_goals(&self, account_id: i64, followers_count: i32) -> Result<u64, DbError> {
        self.with_state(|s| {
            s.goals.push((account_id, followers_count));
            Ok(1)
        })
    }
}

/// Scripted per-token behaviour for [`FakeAdapter`].
#[derive(Clone, Copy)]
pub(crate) enum Behaviour {
    RejectToken,
    RateLimited,
    /// Stats succeed, the post list is throttled.
    PostsRateLimited,
    Slow(Duration),
}

pub(crate) struct FakeAdapter {
    platform: Platform,
    posts: Vec<FetchedPost>,
    followers: i64,
    behaviours: Mutex<HashMap<String, Behaviour>>,
    stats_calls: AtomicUsize,
}

impl FakeAdapter {
    pub(crate) fn new(platform: Platform, posts: Vec<FetchedPost>, followers: i64) -> Self {
        Self {
            platform,
            posts,
            followers,
            behaviours: Mutex::new(HashMap::new()),
            stats_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn on_token(&self, token: &str, behaviour: Behaviour) {
        self.behaviours
            .lock()
            .expect("fake adapter lock poisoned")
            .insert(token.to_string(), behaviour);
    }

    pub(crate) fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    fn behaviour(&self, token: &str) -> Option<Behaviour> {
        self.behaviours
            .lock()
            .expect("fake adapter lock poisoned")
            .get(token)
            .copied()
    }

    fn rate_limited(&self) -> PlatformError {
        PlatformError::RateLimited {
            platform: self.platform,
            retry_after_secs: None,
        }
    }

    async fn check(&self, token: &str) -> Result<(), PlatformError> {
        match self.behaviour(token) {
            Some(Behaviour::RejectToken) => Err(PlatformError::AuthExpired {
                platform: self.platform,
                message: "token rejected".to_string(),
            }),
            Some(Behaviour::RateLimited) => Err(self.rate_limited()),
            Some(Behaviour::Slow(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(Behaviour::PostsRateLimited) | None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformAdapter for FakeAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_recent_posts(
        &self,
        access_token: &str,
        _account: &AccountRef<'_>,
        limit: u32,
    ) -> Result<Vec<FetchedPost>, PlatformError> {
        self.check(access_token).await?;
        if matches!(self.behaviour(access_token), Some(Behaviour::PostsRateLimited)) {
            return Err(self.rate_limited());
        }
        Ok(self.posts.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_account_stats(
        &self,
        access_token: &str,
        _account: &AccountRef<'_>,
    ) -> Result<AccountStats, PlatformError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.check(access_token).await?;
        Ok(AccountStats {
            followers_count: self.followers,
            username: None,
        })
    }
}

pub(crate) struct FakeExchange {
    grant: Option<String>,
    calls: AtomicUsize,
}

impl FakeExchange {
    pub(crate) fn granting(access_token: &str) -> Self {
        Self {
            grant: Some(access_token.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejecting() -> Self {
        Self {
            grant: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for FakeExchange {
    async fn refresh(&self, _credentials: &TokenCredentials) -> Result<TokenGrant, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.grant {
            Some(access_token) => Ok(TokenGrant {
                access_token: access_token.clone(),
                refresh_token: None,
                expires_at: None,
            }),
            None => Err(PlatformError::RefreshRejected {
                platform: Platform::Instagram,
                message: "invalid_grant".to_string(),
            }),
        }
    }
}
