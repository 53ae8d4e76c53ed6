use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, Url};

use crate::error::PlatformError;

pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, PlatformError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parses `base_url` with exactly one trailing slash so relative endpoint
/// paths join under it instead of replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, PlatformError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| PlatformError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn join(base: &Url, path: &str, params: &[(&str, &str)]) -> Result<Url, PlatformError> {
    let mut url = base.join(path).map_err(|e| PlatformError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

pub(crate) fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Strips query parameters (which may carry access tokens) before a URL is
/// placed in an error message.
pub(crate) fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}
