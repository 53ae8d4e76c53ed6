use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Shared secret the external scheduler presents as a bearer token.
    /// `None` makes the cron endpoint answer 500.
    pub cron_secret: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub platform_request_timeout_secs: u64,
    pub platform_user_agent: String,
    pub instagram_api_base_url: String,
    pub tiktok_api_base_url: String,
    pub tiktok_client_key: Option<String>,
    pub tiktok_client_secret: Option<String>,
    pub sync_max_concurrent_accounts: usize,
    pub sync_deadline_secs: u64,
    pub sync_post_limit: u32,
    pub token_refresh_margin_secs: i64,
    /// In-process sync schedule. `None` leaves scheduled syncs to the
    /// external caller of `/api/cron/sync`.
    pub sync_cron: Option<String>,
    pub token_refresh_cron: String,
    pub snapshot_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "platform_request_timeout_secs",
                &self.platform_request_timeout_secs,
            )
            .field("platform_user_agent", &self.platform_user_agent)
            .field("instagram_api_base_url", &self.instagram_api_base_url)
            .field("tiktok_api_base_url", &self.tiktok_api_base_url)
            .field(
                "tiktok_client_key",
                &self.tiktok_client_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "tiktok_client_secret",
                &self.tiktok_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "sync_max_concurrent_accounts",
                &self.sync_max_concurrent_accounts,
            )
            .field("sync_deadline_secs", &self.sync_deadline_secs)
            .field("sync_post_limit", &self.sync_post_limit)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .field("sync_cron", &self.sync_cron)
            .field("token_refresh_cron", &self.token_refresh_cron)
            .field("snapshot_cron", &self.snapshot_cron)
            .finish()
    }
}
