//! Instagram Graph API response shapes.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct MediaPage {
    #[serde(default)]
    pub data: Vec<Media>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Media {
    pub id: String,
    pub caption: Option<String>,
    pub permalink: Option<String>,
    /// Graph timestamps look like `2025-01-15T12:00:00+0000`.
    pub timestamp: Option<String>,
    pub like_count: Option<i64>,
    pub comments_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Insights {
    #[serde(default)]
    pub data: Vec<InsightMetric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightMetric {
    pub name: String,
    #[serde(default)]
    pub values: Vec<InsightValue>,
    pub total_value: Option<InsightValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightValue {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Insights {
    /// Returns the value of `name`, preferring `total_value` over the first
    /// period value. Missing or non-numeric metrics read as zero.
    pub fn metric(&self, name: &str) -> i64 {
        self.data
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.total_value.as_ref().or_else(|| m.values.first()))
            .and_then(|v| v.value.as_i64())
            .unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Profile {
    pub username: Option<String>,
    pub followers_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshedToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphError {
    pub message: Option<String>,
    pub code: Option<i64>,
}
