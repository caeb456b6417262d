use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use club_api::app::{self, AppState};
use club_api::auth::{Authenticator, PasswordService, TokenService};
use club_api::database::{DatabaseManager, PgCredentialStore, PgStore};
use club_api::middleware::Guard;

#[derive(Parser, Debug)]
#[command(name = "club-api", version, about = "Sports club management API")]
struct Cli {
    /// Port to listen on (overrides CLUB_API_PORT and PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Apply pending schema migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,club_api=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = club_api::config::config().clone();
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    tracing::info!("Starting club API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set outside development");
    }
    if config.uses_development_secret() {
        tracing::warn!("Signing tokens with the development secret; set JWT_SECRET for real deployments");
    }

    let pool = DatabaseManager::connect(&config.database).context("failed to configure database pool")?;
    if cli.migrate || config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    }

    let credentials = Arc::new(PgCredentialStore::new(pool.clone()));
    let store = Arc::new(PgStore::new(pool.clone(), &config.database));
    let tokens = TokenService::from_config(&config.security);
    let authenticator = Authenticator::new(
        credentials.clone(),
        PasswordService::new(config.security.bcrypt_cost),
        tokens.clone(),
    );
    let guard = Guard::new(tokens, credentials);

    let port = config.api.port;
    let state = AppState::new(config, store, authenticator, guard);

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Club API listening on http://{}", bind_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(&pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
