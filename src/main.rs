//! Payroll engine HTTP server.
//!
//! Reads `.env`, loads `payroll.yaml` from `PAYROLL_CONFIG_DIR` (default
//! `./config`), applies environment overrides, and serves the API on the
//! configured address. PostgreSQL is used when `DATABASE_URL` is set, the
//! in-memory store otherwise.
//!
//! `payroll-engine hash-password <password>` prints an Argon2 PHC hash for
//! `auth.admin_password_hash` and exits.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use payroll_engine::api::{AppState, create_router, hash_password};
use payroll_engine::config::ConfigLoader;
use payroll_engine::seed::seed_sample_employees;
use payroll_engine::storage::{InMemoryStore, PayrollStore, PostgresStore};

const DEFAULT_CONFIG_DIR: &str = "./config";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        let password = args.next().ok_or("usage: payroll-engine hash-password <password>")?;
        println!("{}", hash_password(&password)?);
        return Ok(());
    }

    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_dir =
        std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?
        .with_env_overrides()
        .into_config();
    config.validate()?;

    let store: Arc<dyn PayrollStore> = match config.storage.database_url.as_deref() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            let store = PostgresStore::new(pool);
            store.migrate().await?;
            info!("Using PostgreSQL storage");
            Arc::new(store)
        }
        None => {
            info!("Using in-memory storage");
            Arc::new(InMemoryStore::new())
        }
    };

    if config.storage.seed_sample_data {
        seed_sample_employees(store.as_ref()).await?;
    }

    let state = AppState::new(store, config.deductions.clone(), config.auth.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    info!(addr = %config.server.addr, config_dir = %config_dir, "Payroll engine listening");
    axum::serve(listener, router).await?;

    Ok(())
}
