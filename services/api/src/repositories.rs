//! Repositories for database operations

use common::error::DatabaseError;
use seating::SeatingError;
use seating::models::{Booking, BookingStatus, SeatHold, TransportType, Trip};
use sqlx::{Row, postgres::PgRow};

pub mod ledger;

pub use ledger::PgSeatLedger;

/// Columns of `trips`, in the order the mappers expect
pub(crate) const TRIP_COLUMNS: &str = r#"
    id, from_city, to_city, transport_type, departure_date, departure_time, arrival_time,
    duration_minutes, price_cents, carrier, departure_location, arrival_location,
    total_seats, available_seats
"#;

/// Columns of `bookings`
pub(crate) const BOOKING_COLUMNS: &str = r#"
    id, user_id, trip_id, seats, num_seats, total_price_cents, status, passenger_name,
    passenger_email, passenger_phone, booking_reference, created_at
"#;

pub(crate) fn query_error(err: sqlx::Error) -> SeatingError {
    SeatingError::Store(DatabaseError::Query(err))
}

fn decode_error(msg: String) -> SeatingError {
    SeatingError::Store(DatabaseError::Decode(msg))
}

/// Map a row carrying the trip columns. `id_column` names the column holding
/// the trip id, which differs when the trip is joined onto a booking.
pub(crate) fn trip_from_row(row: &PgRow, id_column: &str) -> Result<Trip, SeatingError> {
    let transport_type: String = row.try_get("transport_type").map_err(query_error)?;
    let transport_type: TransportType = transport_type.parse().map_err(decode_error)?;

    Ok(Trip {
        id: row.try_get(id_column).map_err(query_error)?,
        from_city: row.try_get("from_city").map_err(query_error)?,
        to_city: row.try_get("to_city").map_err(query_error)?,
        transport_type,
        departure_date: row.try_get("departure_date").map_err(query_error)?,
        departure_time: row.try_get("departure_time").map_err(query_error)?,
        arrival_time: row.try_get("arrival_time").map_err(query_error)?,
        duration_minutes: row.try_get("duration_minutes").map_err(query_error)?,
        price_cents: row.try_get("price_cents").map_err(query_error)?,
        carrier: row.try_get("carrier").map_err(query_error)?,
        departure_location: row.try_get("departure_location").map_err(query_error)?,
        arrival_location: row.try_get("arrival_location").map_err(query_error)?,
        total_seats: row.try_get("total_seats").map_err(query_error)?,
        available_seats: row.try_get("available_seats").map_err(query_error)?,
    })
}

/// Map a row carrying the booking columns; `id_column` names the booking id
pub(crate) fn booking_from_row(row: &PgRow, id_column: &str) -> Result<Booking, SeatingError> {
    let status: String = row.try_get("status").map_err(query_error)?;
    let status: BookingStatus = status.parse().map_err(decode_error)?;

    Ok(Booking {
        id: row.try_get(id_column).map_err(query_error)?,
        user_id: row.try_get("user_id").map_err(query_error)?,
        trip_id: row.try_get("trip_id").map_err(query_error)?,
        seats: row.try_get("seats").map_err(query_error)?,
        num_seats: row.try_get("num_seats").map_err(query_error)?,
        total_price_cents: row.try_get("total_price_cents").map_err(query_error)?,
        status,
        passenger_name: row.try_get("passenger_name").map_err(query_error)?,
        passenger_email: row.try_get("passenger_email").map_err(query_error)?,
        passenger_phone: row.try_get("passenger_phone").map_err(query_error)?,
        booking_reference: row.try_get("booking_reference").map_err(query_error)?,
        created_at: row.try_get("created_at").map_err(query_error)?,
    })
}

pub(crate) fn hold_from_row(row: &PgRow) -> Result<SeatHold, SeatingError> {
    Ok(SeatHold {
        trip_id: row.try_get("trip_id").map_err(query_error)?,
        seat_number: row.try_get("seat_number").map_err(query_error)?,
        user_id: row.try_get("user_id").map_err(query_error)?,
        reserved_until: row.try_get("reserved_until").map_err(query_error)?,
    })
}
