//! Application state shared across handlers

use seating::SeatingService;
use sqlx::PgPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub seating: SeatingService,
    /// Present when the ledger lives in PostgreSQL
    pub db_pool: Option<PgPool>,
}
