mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use socsync_platforms::PlatformRegistry;
use socsync_sync::{PgSyncStore, SyncOrchestrator, SyncStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(socsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = socsync_db::PoolConfig::from_app_config(&config);
    let pool = socsync_db::connect_pool(&config.database_url, pool_config).await?;
    socsync_db::run_migrations(&pool).await?;

    let platforms = PlatformRegistry::from_app_config(&config)?;
    let store: Arc<dyn SyncStore> = Arc::new(PgSyncStore::new(pool.clone()));
    let orchestrator = Arc::new(SyncOrchestrator::from_app_config(store, platforms, &config));

    if config.cron_secret.is_none() {
        tracing::warn!("SOCSYNC_CRON_SECRET is not set; /api/cron/sync will refuse every request");
    }

    let _scheduler = scheduler::build_scheduler(Arc::clone(&orchestrator), Arc::clone(&config)).await?;

    let app = build_app(AppState {
        pool,
        config: Arc::clone(&config),
        orchestrator,
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "socsync-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
