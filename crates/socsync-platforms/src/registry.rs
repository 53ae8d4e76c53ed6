use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use socsync_core::{AppConfig, Platform};

use crate::error::PlatformError;
use crate::{InstagramClient, PlatformAdapter, TiktokClient, TokenExchange};

/// Lookup table from [`Platform`] to its adapter and token exchange.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    exchanges: HashMap<Platform, Arc<dyn TokenExchange>>,
}

impl PlatformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the production registry with both platform clients.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if either HTTP client cannot be constructed
    /// or a configured base URL is invalid.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PlatformError> {
        let timeout = config.platform_request_timeout_secs;
        let agent = config.platform_user_agent.as_str();

        let instagram = InstagramClient::with_base_url(timeout, agent, &config.instagram_api_base_url)?;
        let mut tiktok = TiktokClient::with_base_url(timeout, agent, &config.tiktok_api_base_url)?;
        match (&config.tiktok_client_key, &config.tiktok_client_secret) {
            (Some(key), Some(secret)) => tiktok = tiktok.with_client_credentials(key, secret),
            _ => tracing::warn!("TikTok client credentials not set; TikTok token refresh will fail"),
        }

        Ok(Self::new().with_client(instagram).with_client(tiktok))
    }

    /// Registers a client serving as both adapter and token exchange.
    #[must_use]
    pub fn with_client<C>(mut self, client: C) -> Self
    where
        C: PlatformAdapter + TokenExchange + 'static,
    {
        let platform = client.platform();
        let client = Arc::new(client);
        let adapter: Arc<dyn PlatformAdapter> = client.clone();
        let exchange: Arc<dyn TokenExchange> = client;
        self.adapters.insert(platform, adapter);
        self.exchanges.insert(platform, exchange);
        self
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    #[must_use]
    pub fn with_exchange(mut self, platform: Platform, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchanges.insert(platform, exchange);
        self
    }

    #[must_use]
    pub fn adapter(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    #[must_use]
    pub fn exchange(&self, platform: Platform) -> Option<Arc<dyn TokenExchange>> {
        self.exchanges.get(&platform).cloned()
    }
}

impl fmt::Debug for PlatformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adapters: Vec<_> = self.adapters.keys().map(|p| p.as_str()).collect();
        adapters.sort_unstable();
        let mut exchanges: Vec<_> = self.exchanges.keys().map(|p| p.as_str()).collect();
        exchanges.sort_unstable();
        f.debug_struct("PlatformRegistry")
            .field("adapters", &adapters)
            .field("exchanges", &exchanges)
            .finish()
    }
}
