//! Instagram Graph API adapter.
//!
//! Media are read from `/{user}/media`; view and share counts come from the
//! per-media insights edge, which is fetched best-effort.

mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use socsync_core::Platform;

use crate::error::PlatformError;
use crate::http::{build_client, join, parse_base_url, redact, retry_after_secs};
use crate::types::{expiry_from_now, AccountRef, AccountStats, FetchedPost, TokenCredentials, TokenGrant};
use crate::{PlatformAdapter, TokenExchange};

use wire::{ErrorEnvelope, Insights, Media, MediaPage, Profile, RefreshedToken};

pub const DEFAULT_BASE_URL: &str = "https://graph.instagram.com/";

const MEDIA_FIELDS: &str = "id,caption,permalink,timestamp,like_count,comments_count";
const INSIGHT_METRICS: &str = "views,shares";
const PROFILE_FIELDS: &str = "id,username,followers_count";

/// Graph error code for an invalid or expired access token.
const CODE_INVALID_TOKEN: i64 = 190;
/// Graph throttling codes (app, user, page and custom-level limits).
const THROTTLE_CODES: [i64; 4] = [4, 17, 32, 613];

pub struct InstagramClient {
    client: Client,
    base_url: Url,
}

impl InstagramClient {
    /// Creates a client pointed at the production Graph API.
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
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, PlatformError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let retry_after = retry_after_secs(&response);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, retry_after, &body, &url));
        }

        serde_json::from_str(&body).map_err(|e| PlatformError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    /// Reads views and shares for one media item.
    ///
    /// Token and throttling failures propagate so the caller can refresh or
    /// back off. Anything else (insights unsupported for the media type,
    /// malformed payload, transient failure) degrades to zero counts.
    async fn fetch_insights(&self, access_token: &str, media_id: &str) -> Result<(i64, i64), PlatformError> {
        let url = join(
            &self.base_url,
            &format!("{media_id}/insights"),
            &[("metric", INSIGHT_METRICS), ("access_token", access_token)],
        )?;
        match self.get_json::<Insights>(url, &format!("insights(media={media_id})")).await {
            Ok(insights) => Ok((insights.metric("views"), insights.metric("shares"))),
            Err(e @ (PlatformError::AuthExpired { .. } | PlatformError::RateLimited { .. })) => Err(e),
            Err(e) => {
                tracing::debug!(media_id, error = %e, "instagram: insights unavailable, counting zero");
                Ok((0, 0))
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for InstagramClient {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn fetch_recent_posts(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
        limit: u32,
    ) -> Result<Vec<FetchedPost>, PlatformError> {
        let limit_param = limit.to_string();
        let url = join(
            &self.base_url,
            &format!("{}/media", account.platform_user_id),
            &[
                ("fields", MEDIA_FIELDS),
                ("limit", &limit_param),
                ("access_token", access_token),
            ],
        )?;
        let page: MediaPage = self
            .get_json(url, &format!("media(user={})", account.platform_user_id))
            .await?;

        let mut posts = Vec::with_capacity(page.data.len());
        for media in page.data.into_iter().take(limit as usize) {
            let (views, shares) = self.fetch_insights(access_token, &media.id).await?;
            posts.push(into_post(media, views, shares));
        }
        Ok(posts)
    }

    async fn fetch_account_stats(
        &self,
        access_token: &str,
        account: &AccountRef<'_>,
    ) -> Result<AccountStats, PlatformError> {
        let url = join(
            &self.base_url,
            account.platform_user_id,
            &[("fields", PROFILE_FIELDS), ("access_token", access_token)],
        )?;
        let profile: Profile = self
            .get_json(url, &format!("profile(user={})", account.platform_user_id))
            .await?;
        Ok(AccountStats {
            followers_count: profile.followers_count.unwrap_or(0),
            username: profile.username,
        })
    }
}

#[async_trait]
impl TokenExchange for InstagramClient {
    /// Long-lived Instagram tokens are refreshed with themselves; there is no
    /// separate refresh token.
    async fn refresh(&self, credentials: &TokenCredentials) -> Result<TokenGrant, PlatformError> {
        let url = join(
            &self.base_url,
            "refresh_access_token",
            &[
                ("grant_type", "ig_refresh_token"),
                ("access_token", &credentials.access_token),
            ],
        )?;
        let refreshed: RefreshedToken = self
            .get_json(url, "refresh_access_token")
            .await
            .map_err(|e| match e {
                PlatformError::AuthExpired { message, .. } | PlatformError::Api { message, .. } => {
                    PlatformError::RefreshRejected {
                        platform: Platform::Instagram,
                        message,
                    }
                }
                other => other,
            })?;

        Ok(TokenGrant {
            access_token: refreshed.access_token,
            refresh_token: None,
            expires_at: expiry_from_now(refreshed.expires_in),
        })
    }
}

fn into_post(media: Media, views: i64, shares: i64) -> FetchedPost {
    FetchedPost {
        published_at: media.timestamp.as_deref().and_then(parse_graph_timestamp),
        external_id: media.id,
        caption: media.caption,
        permalink: media.permalink,
        views,
        likes: media.like_count.unwrap_or(0),
        comments: media.comments_count.unwrap_or(0),
        shares,
    }
}

fn parse_graph_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Maps a non-2xx Graph response onto [`PlatformError`].
fn classify_failure(status: StatusCode, retry_after: Option<u64>, body: &str, url: &Url) -> PlatformError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = envelope.as_ref().and_then(|e| e.error.code);
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status == StatusCode::UNAUTHORIZED || code == Some(CODE_INVALID_TOKEN) {
        return PlatformError::AuthExpired {
            platform: Platform::Instagram,
            message,
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS || code.is_some_and(|c| THROTTLE_CODES.contains(&c)) {
        return PlatformError::RateLimited {
            platform: Platform::Instagram,
            retry_after_secs: retry_after,
        };
    }
    if status.is_server_error() || envelope.is_none() {
        return PlatformError::UnexpectedStatus {
            status: status.as_u16(),
            url: redact(url),
        };
    }
    PlatformError::Api {
        platform: Platform::Instagram,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn url() -> Url {
        Url::parse("https://graph.instagram.com/me?access_token=secret").unwrap()
    }

    #[test]
    fn parses_graph_offset_timestamp() {
        let parsed = parse_graph_timestamp("2025-01-15T12:30:00+0000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        assert!(parse_graph_timestamp("2025-01-15T12:30:00Z").is_some());
        assert!(parse_graph_timestamp("yesterday").is_none());
    }

    #[test]
    fn code_190_is_auth_expired_even_on_400() {
        let body = r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, None, body, &url());
        assert!(err.is_auth_expired());
    }

    #[test]
    fn throttle_code_is_rate_limited() {
        let body = r#"{"error":{"message":"Application request limit reached","code":4}}"#;
        let err = classify_failure(StatusCode::FORBIDDEN, Some(60), body, &url());
        assert!(matches!(
            err,
            PlatformError::RateLimited {
                retry_after_secs: Some(60),
                ..
            }
        ));
    }

    #[test]
    fn documented_error_is_api_error() {
        let body = r#"{"error":{"message":"Unsupported get request","code":100}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, None, body, &url());
        assert!(matches!(err, PlatformError::Api { .. }));
    }

    #[test]
    fn unexpected_status_does_not_leak_token() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, None, "<html>", &url());
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn insights_prefers_total_value() {
        let insights: Insights = serde_json::from_value(serde_json::json!({
            "data": [
                { "name": "views", "total_value": { "value": 120 }, "values": [{ "value": 3 }] },
                { "name": "shares", "values": [{ "value": 7 }] }
            ]
        }))
        .unwrap();
        assert_eq!(insights.metric("views"), 120);
        assert_eq!(insights.metric("shares"), 7);
        assert_eq!(insights.metric("saves"), 0);
    }
}
