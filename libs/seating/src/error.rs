//! Error taxonomy of the seat-hold protocol

use common::error::DatabaseError;
use thiserror::Error;

use crate::models::SeatNumber;

/// Errors surfaced by the hold manager, availability resolver and finalizer
#[derive(Error, Debug)]
pub enum SeatingError {
    /// Missing or malformed input, rejected before the store is touched
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Some requested seats are held by someone else or already booked
    #[error("Seats already taken: {taken:?}")]
    Conflict { taken: Vec<SeatNumber> },

    /// The trip has fewer free seats left than requested
    #[error("Not enough seats: requested {requested}, available {available}")]
    SoldOut { requested: i32, available: i32 },

    /// Referenced trip or booking does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The backing store failed
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

impl SeatingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SeatingError::Validation(msg.into())
    }
}

/// Type alias for Result with SeatingError
pub type SeatingResult<T> = Result<T, SeatingError>;
