use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use user_accounts::{
    config::{load_dotenv, AccountsConfig, ConfigLoader, StoreBackend},
    server::start_server,
    InMemoryUserRepository, PostgresUserRepository, UserRepository,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AccountsConfig::from_env()?;
    config.validate()?;

    if !config.expose_error_details {
        tracing::info!("Error details will not be sent to clients");
    }
    if config.object_storage.is_configured() {
        tracing::info!(
            cloud = %config.object_storage.cloud_name,
            "Object storage credentials present but uploads stay on local disk"
        );
    }

    let repository: Arc<dyn UserRepository> = match config.database.backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database
                .url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres store")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.query_timeout)
                .connect(database_url)
                .await
                .context("Failed to create database connection pool")?;

            let repository = PostgresUserRepository::new(pool, config.database.query_timeout);
            repository
                .ensure_schema()
                .await
                .context("Failed to prepare users table")?;

            tracing::info!("Connected to PostgreSQL document store");
            Arc::new(repository)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; accounts are lost on restart");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    start_server(config, repository).await
}
