//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use seating::SeatingError;
use seating::models::SeatNumber;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown trip or booking
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested seats are held by someone else or booked
    #[error("Seats already taken: {taken:?}")]
    Conflict { taken: Vec<SeatNumber> },

    /// Not enough free seats left on the trip
    #[error("Only {available} seats left, {requested} requested")]
    SoldOut { requested: i32, available: i32 },

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<SeatingError> for ApiError {
    fn from(err: SeatingError) -> Self {
        match err {
            SeatingError::Validation(msg) => ApiError::BadRequest(msg),
            SeatingError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            SeatingError::Conflict { taken } => ApiError::Conflict { taken },
            SeatingError::SoldOut {
                requested,
                available,
            } => ApiError::SoldOut {
                requested,
                available,
            },
            SeatingError::Store(e) => {
                error!("Seat ledger failure: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict { taken } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Some seats are already taken",
                    "takenSeats": taken,
                }),
            ),
            ApiError::SoldOut {
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Not enough seats available",
                    "requested": requested,
                    "available": available,
                }),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
