mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "socsync-cli")]
#[command(about = "Social account sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Sync every active account
    SyncAll {
        /// Include accounts with auto-sync turned off
        #[arg(long)]
        manual: bool,
        /// Override the configured run deadline
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Sync a single account by its public id
    SyncAccount { account_id: Uuid },
    /// Refresh access tokens close to expiry
    RefreshTokens {
        /// Limit the sweep to one user's accounts
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Record today's follower counts and update follower goals
    Snapshot {
        #[arg(long)]
        user_id: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("socsync-cli: no command given, see --help");
        return Ok(());
    };

    let config = socsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = socsync_db::PoolConfig::from_app_config(&config);
    let pool = socsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = socsync_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::SyncAll {
            manual,
            deadline_secs,
        } => {
            let deadline = deadline_secs.unwrap_or(config.sync_deadline_secs);
            commands::run_sync_all(&pool, &config, manual, deadline).await?;
        }
        Commands::SyncAccount { account_id } => {
            commands::run_sync_account(&pool, &config, account_id).await?;
        }
        Commands::RefreshTokens { user_id } => {
            commands::run_refresh_tokens(&pool, &config, user_id).await?;
        }
        Commands::Snapshot { user_id } => commands::run_snapshot(&pool, &config, user_id).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
