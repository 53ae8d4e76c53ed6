use chrono::{DateTime, Utc};

/// Identifies the remote account an adapter call targets.
#[derive(Debug, Clone, Copy)]
pub struct AccountRef<'a> {
    /// Instagram user id or TikTok `open_id`.
    pub platform_user_id: &'a str,
    pub username: Option<&'a str>,
}

/// A published post with engagement counters, normalized across platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPost {
    pub external_id: String,
    pub caption: Option<String>,
    pub permalink: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStats {
    pub followers_count: i64,
    pub username: Option<String>,
}

/// Stored credentials handed to a [`crate::TokenExchange`].
#[derive(Clone)]
pub struct TokenCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCredentials")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Result of a successful refresh exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// `None` when the platform does not rotate refresh tokens.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Converts a relative `expires_in` (seconds) into an absolute expiry.
pub(crate) fn expiry_from_now(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
}
