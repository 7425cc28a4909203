//! Darts scoring server.
//!
//! Serves the match API over HTTP, backed by PostgreSQL or, for local
//! development, by in-process storage.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use ds_game::{
    GameManager, GameRepository, InMemoryGameRepository, PgGameRepository, db::Database,
};
use ds_server::{
    api,
    config::{Overrides, ServerConfig, StorageBackend},
    logging, metrics,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the darts scoring server

USAGE:
  ds_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 0.0.0.0:$APP_PORT]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or DB_DSN]

FLAGS:
  --in-memory              Keep matches in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8081)
  APP_PORT                 Port used when SERVER_BIND is unset [default: 8081]
  DATABASE_URL             PostgreSQL connection string
  STORAGE                  memory | postgres [default: postgres]
  REQUEST_TIMEOUT_SECS     Per-request deadline [default: 3]
  GAMES_LIST_LIMIT         Default size of the games list [default: 50]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = Overrides {
        in_memory: pargs.contains("--in-memory"),
        bind: pargs
            .opt_value_from_str::<_, SocketAddr>("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}\n\n{HELP}", remaining);
    }

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (repository, db): (Arc<dyn GameRepository>, Option<Database>) = match config.storage {
        StorageBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.migrate()
                .await
                .context("Failed to apply database schema")?;
            info!("Database connected successfully");
            (Arc::new(PgGameRepository::new(db.pool().clone())), Some(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; matches are lost on restart");
            (Arc::new(InMemoryGameRepository::new()), None)
        }
    };

    let manager = GameManager::new(repository).with_write_timeout(config.request_timeout);
    let state = api::AppState::new(
        Arc::new(manager),
        config.request_timeout,
        config.games_list_limit,
    );
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = db {
        db.close().await;
        info!("Database connections closed");
    }

    Ok(())
}

/// Graceful shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
