use socsync_core::{Platform, SyncErrorKind};
use thiserror::Error;

/// Errors returned by platform adapters and token exchanges.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform rejected the access token as invalid or expired.
    #[error("{platform} rejected the access token: {message}")]
    AuthExpired { platform: Platform, message: String },

    /// The platform throttled the request.
    #[error("rate limited by {platform}")]
    RateLimited {
        platform: Platform,
        retry_after_secs: Option<u64>,
    },

    /// Network or TLS failure from the underlying HTTP client. The request
    /// URL is stripped on conversion because it may carry an access token.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The platform answered with a documented error envelope.
    #[error("{platform} API error: {message}")]
    Api { platform: Platform, message: String },

    /// The refresh exchange was refused or cannot be attempted.
    #[error("{platform} token refresh failed: {message}")]
    RefreshRejected { platform: Platform, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<reqwest::Error> for PlatformError {
    fn from(error: reqwest::Error) -> Self {
        PlatformError::Http(error.without_url())
    }
}

impl PlatformError {
    /// Maps the error onto the sync error taxonomy.
    #[must_use]
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            PlatformError::AuthExpired { .. } => SyncErrorKind::AuthExpired,
            PlatformError::RateLimited { .. } => SyncErrorKind::RateLimited,
            PlatformError::Http(e) if e.is_decode() => SyncErrorKind::Unexpected,
            PlatformError::Http(_) => SyncErrorKind::TransientNetwork,
            PlatformError::UnexpectedStatus { status, .. } if *status >= 500 => {
                SyncErrorKind::TransientNetwork
            }
            PlatformError::RefreshRejected { .. } => SyncErrorKind::RefreshFailed,
            PlatformError::UnexpectedStatus { .. }
            | PlatformError::Deserialize { .. }
            | PlatformError::Api { .. }
            | PlatformError::InvalidBaseUrl { .. } => SyncErrorKind::Unexpected,
        }
    }

    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, PlatformError::AuthExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_expired_maps_to_auth_kind() {
        let err = PlatformError::AuthExpired {
            platform: Platform::Instagram,
            message: "Error validating access token".to_string(),
        };
        assert_eq!(err.kind(), SyncErrorKind::AuthExpired);
        assert!(err.is_auth_expired());
        assert!(err.to_string().contains("instagram"));
    }

    #[test]
    fn rate_limited_maps_to_rate_limited_kind() {
        let err = PlatformError::RateLimited {
            platform: Platform::Tiktok,
            retry_after_secs: Some(30),
        };
        assert_eq!(err.kind(), SyncErrorKind::RateLimited);
    }

    #[test]
    fn server_errors_are_transient() {
        let err = PlatformError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.kind(), SyncErrorKind::TransientNetwork);
    }

    #[test]
    fn client_errors_are_unexpected() {
        let err = PlatformError::UnexpectedStatus {
            status: 400,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.kind(), SyncErrorKind::Unexpected);
    }

    #[test]
    fn refresh_rejected_maps_to_refresh_failed() {
        let err = PlatformError::RefreshRejected {
            platform: Platform::Tiktok,
            message: "invalid_grant".to_string(),
        };
        assert_eq!(err.kind(), SyncErrorKind::RefreshFailed);
    }

    #[tokio::test]
    async fn connect_failure_is_transient() {
        let source = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        assert_eq!(
            PlatformError::from(source).kind(),
            SyncErrorKind::TransientNetwork
        );
    }

    #[tokio::test]
    async fn http_error_text_omits_the_request_url() {
        let source = reqwest::Client::new()
            .get("http://127.0.0.1:1/me?access_token=ig-live-secret")
            .send()
            .await
            .unwrap_err();
        let rendered = PlatformError::from(source).to_string();

        assert!(rendered.starts_with("HTTP error"));
        assert!(!rendered.contains("ig-live-secret"), "{rendered}");
        assert!(!rendered.contains("access_token"), "{rendered}");
    }
}
