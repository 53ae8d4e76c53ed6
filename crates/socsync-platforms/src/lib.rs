//! Platform adapters: translate Instagram and TikTok APIs into canonical
//! post/stat records.
//!
//! Adapters never refresh tokens on their own. An expired token surfaces as
//! [`PlatformError::AuthExpired`] and the caller decides whether to run a
//! [`TokenExchange`].

pub mod error;
mod http;
pub mod instagram;
pub mod registry;
pub mod tiktok;
pub mod types;

use async_trait::async_trait;
use socsync_core::Platform;

pub use error::PlatformError;
pub use instagram::InstagramClient;
pub use registry::PlatformRegistry;
pub use tiktok::TiktokClient;
pub use types::{AccountRef, AccountStats, FetchedPost, TokenCredentials, TokenGrant};

/// Read-only metrics access for one platform.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetches up to `limit` of the account's most recently published posts
    /// with their engagement counters.
    async fn fetch_recent_posts(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
        limit: u32,
    ) -> Result<Vec<FetchedPost>, PlatformError>;

    /// Fetches the account's current follower count.
    async fn fetch_account_stats(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
    ) -> Result<AccountStats, PlatformError>;
}

/// Exchanges stored credentials for a fresh access token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh(&self, credentials: &TokenCredentials) -> Result<TokenGrant, PlatformError>;
}
