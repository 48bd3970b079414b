use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod demo;
mod error;
mod models;
mod repositories;
mod routes;
mod state;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use seating::{Clock, MemorySeatLedger, SeatLedger, SeatingService, SystemClock};
use tokio::net::TcpListener;

use crate::{
    config::{AppConfig, StorageBackend},
    repositories::PgSeatLedger,
    state::AppState,
};

/// Days of demo departures registered for the memory backend
const DEMO_DAYS: i64 = 14;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting API service");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (ledger, db_pool) = match config.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from(&config.database);
            let pool = init_pool(&db_config).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }
            run_migrations(&pool).await?;

            (
                Arc::new(PgSeatLedger::new(pool.clone())) as Arc<dyn SeatLedger>,
                Some(pool),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory seat ledger; state is lost on restart");
            let ledger = MemorySeatLedger::new();
            demo::seed(&ledger, clock.now().date_naive(), DEMO_DAYS).await;
            (Arc::new(ledger) as Arc<dyn SeatLedger>, None)
        }
    };

    info!(
        "Hold policy {:?}, cancellation policy {:?}",
        config.policies.rehold, config.policies.cancellation
    );

    let app_state = AppState {
        seating: SeatingService::new(ledger, clock, config.policies),
        db_pool,
    };

    let app = routes::create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
