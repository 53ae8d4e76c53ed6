use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `FOO=` in a .env file does not enable a secret.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let narrow = |var: &str, value: u64| -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SOCSYNC_ENV", "development"));

    let raw_bind = or_default("SOCSYNC_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = raw_bind
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "SOCSYNC_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("SOCSYNC_LOG_LEVEL", "info");
    let cron_secret = optional("SOCSYNC_CRON_SECRET");

    let db_max_connections = narrow(
        "SOCSYNC_DB_MAX_CONNECTIONS",
        parse_num("SOCSYNC_DB_MAX_CONNECTIONS", "10")?,
    )?;
    let db_min_connections = narrow(
        "SOCSYNC_DB_MIN_CONNECTIONS",
        parse_num("SOCSYNC_DB_MIN_CONNECTIONS", "1")?,
    )?;
    let db_acquire_timeout_secs = parse_num("SOCSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let platform_request_timeout_secs = parse_num("SOCSYNC_PLATFORM_REQUEST_TIMEOUT_SECS", "20")?;
    let platform_user_agent = or_default("SOCSYNC_PLATFORM_USER_AGENT", "socsync/0.1 (metrics-sync)");
    let instagram_api_base_url = or_default("INSTAGRAM_API_BASE_URL", "https://graph.instagram.com");
    let tiktok_api_base_url = or_default("TIKTOK_API_BASE_URL", "https://open.tiktokapis.com");
    let tiktok_client_key = optional("TIKTOK_CLIENT_KEY");
    let tiktok_client_secret = optional("TIKTOK_CLIENT_SECRET");

    let sync_max_concurrent_accounts =
        usize::try_from(parse_num("SOCSYNC_SYNC_MAX_CONCURRENT_ACCOUNTS", "4")?).map_err(|e| {
            ConfigError::InvalidEnvVar {
                var: "SOCSYNC_SYNC_MAX_CONCURRENT_ACCOUNTS".to_string(),
                reason: e.to_string(),
            }
        })?;
    if sync_max_concurrent_accounts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SOCSYNC_SYNC_MAX_CONCURRENT_ACCOUNTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let sync_deadline_secs = parse_num("SOCSYNC_SYNC_DEADLINE_SECS", "55")?;
    let sync_post_limit = narrow(
        "SOCSYNC_SYNC_POST_LIMIT",
        parse_num("SOCSYNC_SYNC_POST_LIMIT", "25")?,
    )?;
    let token_refresh_margin_secs =
        i64::try_from(parse_num("SOCSYNC_TOKEN_REFRESH_MARGIN_SECS", "86400")?).map_err(|e| {
            ConfigError::InvalidEnvVar {
                var: "SOCSYNC_TOKEN_REFRESH_MARGIN_SECS".to_string(),
                reason: e.to_string(),
            }
        })?;

    let sync_cron = optional("SOCSYNC_SYNC_CRON");
    let token_refresh_cron = or_default("SOCSYNC_TOKEN_REFRESH_CRON", "0 5 * * * *");
    let snapshot_cron = or_default("SOCSYNC_SNAPSHOT_CRON", "0 0 3 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        cron_secret,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        platform_request_timeout_secs,
        platform_user_agent,
        instagram_api_base_url,
        tiktok_api_base_url,
        tiktok_client_key,
        tiktok_client_secret,
        sync_max_concurrent_accounts,
        sync_deadline_secs,
        sync_post_limit,
        token_refresh_margin_secs,
        sync_cron,
        token_refresh_cron,
        snapshot_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
