//! Offline unit tests for socsync-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use socsync_core::{AppConfig, Environment};
use socsync_db::{PoolConfig, SocialAccountRow};
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        cron_secret: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        platform_request_timeout_secs: 20,
        platform_user_agent: "ua".to_string(),
        instagram_api_base_url: "https://graph.instagram.com".to_string(),
        tiktok_api_base_url: "https://open.tiktokapis.com".to_string(),
        tiktok_client_key: None,
        tiktok_client_secret: None,
        sync_max_concurrent_accounts: 4,
        sync_deadline_secs: 55,
        sync_post_limit: 25,
        token_refresh_margin_secs: 86_400,
        sync_cron: None,
        token_refresh_cron: "0 5 * * * *".to_string(),
        snapshot_cron: "0 0 3 * * *".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn social_account_debug_redacts_tokens() {
    let row = SocialAccountRow {
        id: 1,
        public_id: Uuid::new_v4(),
        user_id: 2,
        platform: "instagram".to_string(),
        platform_user_id: "17841400000000000".to_string(),
        username: Some("creator".to_string()),
        access_token: "IGQVJ-live-access-token".to_string(),
        refresh_token: Some("refresh-secret".to_string()),
        token_expires_at: None,
        is_active: true,
        auto_sync: true,
        followers_count: 1200,
        last_sync_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let rendered = format!("{row:?}");
    assert!(!rendered.contains("IGQVJ-live-access-token"));
    assert!(!rendered.contains("refresh-secret"));
    assert!(rendered.contains("creator"));
}
