//! In-memory seat ledger
//!
//! A single async mutex guards the whole ledger, so units of work are fully
//! serialized. Each unit of work edits a staged copy that replaces the shared
//! state on commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{SeatingError, SeatingResult};
use crate::ledger::{LedgerTx, SeatLedger};
use crate::models::{
    Booking, BookingStatus, BookingWithTrip, NewTrip, SeatHold, SeatNumber, Trip, TripId,
    TripSearch,
};
use crate::policy::is_expired;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    next_trip_id: TripId,
    trips: BTreeMap<TripId, Trip>,
    holds: Vec<SeatHold>,
    bookings: Vec<Booking>,
}

/// Seat ledger kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemorySeatLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemorySeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trip with every seat available
    pub async fn insert_trip(&self, trip: NewTrip) -> Trip {
        let mut state = self.state.lock().await;
        state.next_trip_id += 1;
        let trip = trip.into_trip(state.next_trip_id);
        state.trips.insert(trip.id, trip.clone());
        trip
    }

    /// Store a booking as-is, bypassing the finalizer
    pub async fn seed_booking(&self, booking: Booking) {
        self.state.lock().await.bookings.push(booking);
    }

    /// Every stored hold, expired ones included
    pub async fn holds(&self) -> Vec<SeatHold> {
        self.state.lock().await.holds.clone()
    }

    /// Every stored booking
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.clone()
    }
}

#[async_trait]
impl SeatLedger for MemorySeatLedger {
    async fn begin(&self) -> SeatingResult<Box<dyn LedgerTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn sweep_expired_holds(&self, now: DateTime<Utc>) -> SeatingResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.holds.len();
        state.holds.retain(|hold| !is_expired(hold, now));
        Ok((before - state.holds.len()) as u64)
    }

    async fn find_trip(&self, trip_id: TripId) -> SeatingResult<Option<Trip>> {
        Ok(self.state.lock().await.trips.get(&trip_id).cloned())
    }

    async fn search_trips(
        &self,
        search: &TripSearch,
        today: NaiveDate,
    ) -> SeatingResult<Vec<Trip>> {
        let state = self.state.lock().await;
        let mut trips: Vec<Trip> = state
            .trips
            .values()
            .filter(|trip| trip.from_city == search.from_city && trip.to_city == search.to_city)
            .filter(|trip| match search.date {
                Some(date) => trip.departure_date == date,
                None => trip.departure_date >= today,
            })
            .filter(|trip| search.modes.is_empty() || search.modes.contains(&trip.transport_type))
            .cloned()
            .collect();
        trips.sort_by_key(|trip| (trip.departure_date, trip.departure_time, trip.id));
        Ok(trips)
    }

    async fn find_booking(&self, booking_id: Uuid) -> SeatingResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state.bookings.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn user_bookings(&self, user_id: Uuid) -> SeatingResult<Vec<BookingWithTrip>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<BookingWithTrip> = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                state.trips.get(&b.trip_id).map(|trip| BookingWithTrip {
                    booking: b.clone(),
                    trip: trip.clone(),
                })
            })
            .collect();
        bookings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(bookings)
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<LedgerState>,
    staged: LedgerState,
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_trip(&mut self, trip_id: TripId) -> SeatingResult<Option<Trip>> {
        Ok(self.staged.trips.get(&trip_id).cloned())
    }

    async fn active_holds(
        &mut self,
        trip_id: TripId,
        now: DateTime<Utc>,
    ) -> SeatingResult<Vec<SeatHold>> {
        Ok(self
            .staged
            .holds
            .iter()
            .filter(|hold| hold.trip_id == trip_id && !is_expired(hold, now))
            .cloned()
            .collect())
    }

    async fn committed_seats(&mut self, trip_id: TripId) -> SeatingResult<BTreeSet<SeatNumber>> {
        Ok(self
            .staged
            .bookings
            .iter()
            .filter(|b| b.trip_id == trip_id && b.status.occupies_seats())
            .flat_map(|b| b.seats.iter().copied())
            .collect())
    }

    async fn insert_holds(&mut self, holds: &[SeatHold]) -> SeatingResult<()> {
        self.staged.holds.extend_from_slice(holds);
        Ok(())
    }

    async fn delete_holds(
        &mut self,
        trip_id: TripId,
        user_id: Uuid,
        seats: Option<&BTreeSet<SeatNumber>>,
    ) -> SeatingResult<u64> {
        let before = self.staged.holds.len();
        self.staged.holds.retain(|hold| {
            let matches = hold.trip_id == trip_id
                && hold.user_id == user_id
                && seats.is_none_or(|seats| seats.contains(&hold.seat_number));
            !matches
        });
        Ok((before - self.staged.holds.len()) as u64)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> SeatingResult<()> {
        self.staged.bookings.push(booking.clone());
        Ok(())
    }

    async fn adjust_available_seats(&mut self, trip_id: TripId, delta: i32) -> SeatingResult<()> {
        let trip = self
            .staged
            .trips
            .get_mut(&trip_id)
            .ok_or_else(|| SeatingError::NotFound(format!("Trip {}", trip_id)))?;
        trip.available_seats += delta;
        Ok(())
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> SeatingResult<Option<Booking>> {
        Ok(self
            .staged
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned())
    }

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> SeatingResult<()> {
        let booking = self
            .staged
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| SeatingError::NotFound(format!("Booking {}", booking_id)))?;
        booking.status = status;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> SeatingResult<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
