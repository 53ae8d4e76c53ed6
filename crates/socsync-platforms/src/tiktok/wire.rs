//! TikTok Open API v2 response shapes.

use serde::Deserialize;

/// Every v2 response carries an `error` object; `code == "ok"` is success.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoList {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Video {
    pub id: String,
    pub title: Option<String>,
    pub video_description: Option<String>,
    /// Unix seconds.
    pub create_time: Option<i64>,
    pub share_url: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub share_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub username: Option<String>,
    pub follower_count: Option<i64>,
}

/// `/v2/oauth/token/` answers with a flat body; failures set `error`.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthToken {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
