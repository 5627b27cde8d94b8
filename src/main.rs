//! Bibliotheque Server - library catalogue
//!
//! `bibliotheque` serves the REST API; `bibliotheque load-fixtures` replaces
//! the catalogue with the demo data set and exits.

use std::net::SocketAddr;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliotheque::{
    api,
    config::{AppConfig, LoggingConfig, StorageBackend},
    repository::Repository,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Bibliotheque Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations completed");

            Repository::new(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            Repository::in_memory()
        }
    };

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let state = AppState::new(config, repository);

    if std::env::args().nth(1).as_deref() == Some("load-fixtures") {
        let report = state
            .services
            .fixtures
            .load(Utc::now().date_naive())
            .await?;
        let available = state.services.stats.count_available_books().await?;
        tracing::info!(
            "{} books, {} loans created; {} available, {} on loan",
            report.books,
            report.loans,
            available,
            report.books as i64 - available
        );
        return Ok(());
    }

    let app = api::router(state);

    let addr = SocketAddr::new(server_host.parse()?, server_port);
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bibliotheque={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
