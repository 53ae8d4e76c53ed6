//! TikTok Open API v2 adapter.

mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use socsync_core::Platform;

use crate::error::PlatformError;
use crate::http::{build_client, join, parse_base_url, redact, retry_after_secs};
use crate::types::{expiry_from_now, AccountRef, AccountStats, FetchedPost, TokenCredentials, TokenGrant};
use crate::{PlatformAdapter, TokenExchange};

use wire::{ApiStatus, Envelope, OAuthToken, UserInfo, Video, VideoList};

pub const DEFAULT_BASE_URL: &str = "https://open.tiktokapis.com/";

const VIDEO_FIELDS: &str =
    "id,title,video_description,create_time,share_url,view_count,like_count,comment_count,share_count";
const USER_FIELDS: &str = "open_id,username,follower_count";

/// Upper bound the video list endpoint accepts for `max_count`.
pub const MAX_VIDEOS_PER_PAGE: u32 = 20;

const CODE_OK: &str = "ok";
const AUTH_CODES: [&str; 2] = ["access_token_invalid", "scope_not_authorized"];
const CODE_RATE_LIMITED: &str = "rate_limit_exceeded";

#[derive(Clone)]
struct ClientCredentials {
    key: String,
    secret: String,
}

pub struct TiktokClient {
    client: Client,
    base_url: Url,
    credentials: Option<ClientCredentials>,
}

impl TiktokClient {
    /// Creates a client pointed at the production Open API.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, PlatformError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PlatformError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
            credentials: None,
        })
    }

    /// Sets the app's client key and secret, required for token refresh.
    #[must_use]
    pub fn with_client_credentials(mut self, key: &str, secret: &str) -> Self {
        self.credentials = Some(ClientCredentials {
            key: key.to_string(),
            secret: secret.to_string(),
        });
        self
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
        context: &str,
    ) -> Result<T, PlatformError> {
        let response = request.send().await?;
        let status = response.status();
        let retry_after = retry_after_secs(&response);
        let body = response.text().await?;

        let envelope = match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(classify_failure(status, retry_after, None, url));
            }
            Err(e) => {
                return Err(PlatformError::Deserialize {
                    context: context.to_string(),
                    source: e,
                })
            }
        };

        let ok = envelope.error.as_ref().is_none_or(|e| e.code == CODE_OK);
        if !status.is_success() || !ok {
            return Err(classify_failure(status, retry_after, envelope.error.as_ref(), url));
        }

        let data = envelope.data.ok_or_else(|| PlatformError::Api {
            platform: Platform::Tiktok,
            message: format!("{context}: response has no data"),
        })?;
        serde_json::from_value(data).map_err(|e| PlatformError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl PlatformAdapter for TiktokClient {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    /// The video list is scoped to the token's owner, so `account` is only
    /// used for logging.
    async fn fetch_recent_posts(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
        limit: u32,
    ) -> Result<Vec<FetchedPost>, PlatformError> {
        let max_count = limit.clamp(1, MAX_VIDEOS_PER_PAGE);
        let url = join(&self.base_url, "v2/video/list/", &[("fields", VIDEO_FIELDS)])?;
        let request = self
            .client
            .post(url.clone())
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "max_count": max_count }));

        let list: VideoList = self
            .send_envelope(request, &url, &format!("video.list(open_id={})", account.platform_user_id))
            .await?;
        Ok(list.videos.into_iter().map(into_post).collect())
    }

    async fn fetch_account_stats(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
    ) -> Result<AccountStats, PlatformError> {
        let url = join(&self.base_url, "v2/user/info/", &[("fields", USER_FIELDS)])?;
        let request = self.client.get(url.clone()).bearer_auth(access_token);
        let info: UserInfo = self
            .send_envelope(request, &url, &format!("user.info(open_id={})", account.platform_user_id))
            .await?;
        Ok(AccountStats {
            followers_count: info.user.follower_count.unwrap_or(0),
            username: info.user.username,
        })
    }
}

#[async_trait]
impl TokenExchange for TiktokClient {
    async fn refresh(&self, credentials: &TokenCredentials) -> Result<TokenGrant, PlatformError> {
        let rejected = |message: String| PlatformError::RefreshRejected {
            platform: Platform::Tiktok,
            message,
        };
        let client_credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| rejected("client key/secret are not configured".to_string()))?;
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| rejected("account has no refresh token".to_string()))?;

        let url = join(&self.base_url, "v2/oauth/token/", &[])?;
        let response = self
            .client
            .post(url.clone())
            .form(&[
                ("client_key", client_credentials.key.as_str()),
                ("client_secret", client_credentials.secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let token: OAuthToken = match serde_json::from_str(&body) {
            Ok(token) => token,
            Err(_) if !status.is_success() => {
                return Err(rejected(format!("HTTP {status} from {}", redact(&url))));
            }
            Err(e) => {
                return Err(PlatformError::Deserialize {
                    context: "oauth.token".to_string(),
                    source: e,
                })
            }
        };

        if let Some(error) = token.error {
            let description = token.error_description.unwrap_or_default();
            return Err(rejected(format!("{error}: {description}")));
        }
        let access_token = token
            .access_token
            .ok_or_else(|| rejected(format!("HTTP {status} without access_token")))?;

        Ok(TokenGrant {
            access_token,
            refresh_token: token.refresh_token,
            expires_at: expiry_from_now(token.expires_in),
        })
    }
}

fn into_post(video: Video) -> FetchedPost {
    let caption = video
        .title
        .filter(|t| !t.trim().is_empty())
        .or(video.video_description)
        .filter(|t| !t.trim().is_empty());
    FetchedPost {
        external_id: video.id,
        caption,
        permalink: video.share_url,
        views: video.view_count.unwrap_or(0),
        likes: video.like_count.unwrap_or(0),
        comments: video.comment_count.unwrap_or(0),
        shares: video.share_count.unwrap_or(0),
        published_at: video
            .create_time
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
    }
}

fn classify_failure(
    status: StatusCode,
    retry_after: Option<u64>,
    api_status: Option<&ApiStatus>,
    url: &Url,
) -> PlatformError {
    let code = api_status.map(|s| s.code.as_str());
    let message = api_status
        .map(|s| format!("{}: {}", s.code, s.message))
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status == StatusCode::UNAUTHORIZED || code.is_some_and(|c| AUTH_CODES.contains(&c)) {
        return PlatformError::AuthExpired {
            platform: Platform::Tiktok,
            message,
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS || code == Some(CODE_RATE_LIMITED) {
        return PlatformError::RateLimited {
            platform: Platform::Tiktok,
            retry_after_secs: retry_after,
        };
    }
    if status.is_server_error() || api_status.is_none() {
        return PlatformError::UnexpectedStatus {
            status: status.as_u16(),
            url: redact(url),
        };
    }
    PlatformError::Api {
        platform: Platform::Tiktok,
        message,
    }
}
