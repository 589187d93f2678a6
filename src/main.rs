use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patient_records::api::{app, SharedPatientStore};
use patient_records::config::{Config, StoreBackend};
use patient_records::repository::{MemoryPatientStore, PgPatientStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patient_records=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let rules = config.critical_rules()?;
    tracing::info!(
        schema = %config.patient_schema,
        critical_rules = rules.rules().len(),
        "Starting patient records server on {}",
        config.server_addr()
    );

    let store: SharedPatientStore = match &config.store_backend {
        StoreBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            tracing::info!("Connected to database");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations completed");

            Arc::new(PgPatientStore::new(pool, config.patient_schema, rules))
        }
        StoreBackend::Memory => {
            tracing::warn!("No DATABASE_URL configured; records are kept in memory only");
            Arc::new(MemoryPatientStore::new(config.patient_schema, rules))
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("Listening on {}", config.server_addr());

    axum::serve(listener, app(store)).await?;

    Ok(())
}
