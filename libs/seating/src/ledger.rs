//! Seat ledger contract
//!
//! The ledger is the single source of truth for seat occupancy: trips, seat
//! holds and bookings. Mutating protocol steps run inside a [`LedgerTx`] unit
//! of work that holds the trip's lock until it is committed; dropping it
//! without committing discards every change made through it.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::SeatingResult;
use crate::models::{
    Booking, BookingStatus, BookingWithTrip, SeatHold, SeatNumber, Trip, TripId, TripSearch,
};

/// Durable storage for trips, seat holds and bookings
#[async_trait]
pub trait SeatLedger: Send + Sync {
    /// Open a unit of work
    async fn begin(&self) -> SeatingResult<Box<dyn LedgerTx>>;

    /// Delete every hold, on any trip, that has expired at `now`.
    /// Returns the number of rows removed.
    async fn sweep_expired_holds(&self, now: DateTime<Utc>) -> SeatingResult<u64>;

    async fn find_trip(&self, trip_id: TripId) -> SeatingResult<Option<Trip>>;

    /// Trips matching `search`, ordered by departure date then time.
    /// Without an explicit date only trips departing on or after `today` match.
    async fn search_trips(&self, search: &TripSearch, today: NaiveDate)
    -> SeatingResult<Vec<Trip>>;

    async fn find_booking(&self, booking_id: Uuid) -> SeatingResult<Option<Booking>>;

    /// All bookings of a user, newest first
    async fn user_bookings(&self, user_id: Uuid) -> SeatingResult<Vec<BookingWithTrip>>;
}

/// One atomic sequence of ledger reads and writes
#[async_trait]
pub trait LedgerTx: Send {
    /// Fetch a trip and hold its lock until commit or rollback
    async fn lock_trip(&mut self, trip_id: TripId) -> SeatingResult<Option<Trip>>;

    /// Holds on `trip_id` that are still live at `now`
    async fn active_holds(
        &mut self,
        trip_id: TripId,
        now: DateTime<Utc>,
    ) -> SeatingResult<Vec<SeatHold>>;

    /// Seats belonging to confirmed or pending bookings of `trip_id`
    async fn committed_seats(&mut self, trip_id: TripId) -> SeatingResult<BTreeSet<SeatNumber>>;

    async fn insert_holds(&mut self, holds: &[SeatHold]) -> SeatingResult<()>;

    /// Delete a user's holds on a trip, restricted to `seats` when given
    async fn delete_holds(
        &mut self,
        trip_id: TripId,
        user_id: Uuid,
        seats: Option<&BTreeSet<SeatNumber>>,
    ) -> SeatingResult<u64>;

    async fn insert_booking(&mut self, booking: &Booking) -> SeatingResult<()>;

    /// Add `delta` (may be negative) to the trip's available-seat counter
    async fn adjust_available_seats(&mut self, trip_id: TripId, delta: i32) -> SeatingResult<()>;

    /// Fetch a booking and hold its lock until commit or rollback
    async fn lock_booking(&mut self, booking_id: Uuid) -> SeatingResult<Option<Booking>>;

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> SeatingResult<()>;

    /// Make every change of this unit of work visible
    async fn commit(self: Box<Self>) -> SeatingResult<()>;
}
