//! Entry point bundling the seating components over one ledger and clock

use std::sync::Arc;

use uuid::Uuid;

use crate::availability::AvailabilityResolver;
use crate::clock::Clock;
use crate::error::{SeatingError, SeatingResult};
use crate::finalizer::BookingFinalizer;
use crate::holds::HoldManager;
use crate::layout::SeatMap;
use crate::ledger::SeatLedger;
use crate::models::{Booking, BookingWithTrip, Trip, TripId, TripSearch};
use crate::policy::{AVAILABILITY_POLL_INTERVAL, Policies};

#[derive(Clone)]
pub struct SeatingService {
    ledger: Arc<dyn SeatLedger>,
    clock: Arc<dyn Clock>,
    pub holds: HoldManager,
    pub availability: AvailabilityResolver,
    pub finalizer: BookingFinalizer,
}

impl SeatingService {
    pub fn new(ledger: Arc<dyn SeatLedger>, clock: Arc<dyn Clock>, policies: Policies) -> Self {
        Self {
            holds: HoldManager::new(ledger.clone(), clock.clone(), policies.rehold),
            availability: AvailabilityResolver::new(ledger.clone(), clock.clone()),
            finalizer: BookingFinalizer::new(ledger.clone(), clock.clone(), policies.cancellation),
            ledger,
            clock,
        }
    }

    pub async fn trip(&self, trip_id: TripId) -> SeatingResult<Trip> {
        self.ledger
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| SeatingError::NotFound(format!("Trip {}", trip_id)))
    }

    /// Search trips on a route; without a date only upcoming departures match
    pub async fn search_trips(&self, search: &TripSearch) -> SeatingResult<Vec<Trip>> {
        if search.from_city.trim().is_empty() || search.to_city.trim().is_empty() {
            return Err(SeatingError::validation("Missing from or to parameters"));
        }
        let today = self.clock.now().date_naive();
        self.ledger.search_trips(search, today).await
    }

    /// Current seat map of a trip for the seat-selection view
    pub async fn seat_map(&self, trip_id: TripId) -> SeatingResult<SeatMap> {
        let trip = self.trip(trip_id).await?;
        let availability = self.availability.availability(trip_id).await?;
        Ok(SeatMap::build(
            &trip,
            &availability,
            AVAILABILITY_POLL_INTERVAL.as_secs(),
        ))
    }

    pub async fn booking(&self, booking_id: Uuid) -> SeatingResult<Booking> {
        self.ledger
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| SeatingError::NotFound(format!("Booking {}", booking_id)))
    }

    pub async fn user_bookings(&self, user_id: Uuid) -> SeatingResult<Vec<BookingWithTrip>> {
        self.ledger.user_bookings(user_id).await
    }
}
