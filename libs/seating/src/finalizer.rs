//! Booking finalizer: the commit point of the seat-hold protocol
//!
//! Finalizing re-validates the requested seats, writes the booking, moves the
//! trip's capacity counter and drops the caller's holds in one unit of work.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{SeatingError, SeatingResult};
use crate::ledger::SeatLedger;
use crate::models::{Booking, BookingRequest, BookingStatus, SeatNumber};
use crate::policy::CancellationPolicy;
use crate::validation::validate_passenger;

const REFERENCE_PREFIX: &str = "BG";
const REFERENCE_LEN: usize = 8;
// Excludes 0, O, 1 and I
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a human-friendly booking reference such as `BG7KQ2MX4P`
pub fn booking_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", REFERENCE_PREFIX, suffix)
}

/// Seats a booking request asks for: the explicit choice, or `1..=num_seats`.
/// A count larger than the trip is rejected before anything is allocated.
fn requested_seats(
    request: &BookingRequest,
    total_seats: i32,
) -> SeatingResult<BTreeSet<SeatNumber>> {
    if !request.seats.is_empty() {
        return Ok(request.seats.iter().copied().collect());
    }

    match request.num_seats {
        Some(count) if count > total_seats => Err(SeatingError::validation(format!(
            "Cannot book {} seats on a trip with {} seats",
            count, total_seats
        ))),
        Some(count) if count > 0 => Ok((1..=count).collect()),
        _ => Err(SeatingError::validation(
            "Either seats or a positive number of seats is required",
        )),
    }
}

#[derive(Clone)]
pub struct BookingFinalizer {
    ledger: Arc<dyn SeatLedger>,
    clock: Arc<dyn Clock>,
    cancellation: CancellationPolicy,
}

impl BookingFinalizer {
    pub fn new(
        ledger: Arc<dyn SeatLedger>,
        clock: Arc<dyn Clock>,
        cancellation: CancellationPolicy,
    ) -> Self {
        Self {
            ledger,
            clock,
            cancellation,
        }
    }

    /// Turn the requested seats into a confirmed booking
    pub async fn finalize(&self, request: BookingRequest) -> SeatingResult<Booking> {
        validate_passenger(&request.passenger).map_err(SeatingError::Validation)?;
        let trip_id = request.trip_id;
        let user_id = request.user_id;
        let now = self.clock.now();

        let mut tx = self.ledger.begin().await?;
        let trip = tx
            .lock_trip(trip_id)
            .await?
            .ok_or_else(|| SeatingError::NotFound(format!("Trip {}", trip_id)))?;

        let seats = requested_seats(&request, trip.total_seats)?;
        let seat_count = seats.len() as i32;
        if let Some(seat) = seats.iter().find(|seat| !trip.has_seat(**seat)) {
            return Err(SeatingError::validation(format!(
                "Seat {} does not exist on trip {}",
                seat, trip_id
            )));
        }

        let mut taken: BTreeSet<SeatNumber> = tx
            .active_holds(trip_id, now)
            .await?
            .into_iter()
            .filter(|hold| hold.user_id != user_id)
            .map(|hold| hold.seat_number)
            .collect();
        taken.extend(tx.committed_seats(trip_id).await?);

        let conflicts: Vec<SeatNumber> = seats.intersection(&taken).copied().collect();
        if !conflicts.is_empty() {
            warn!(
                "Booking rejected for user {} on trip {}: seats {:?} taken",
                user_id, trip_id, conflicts
            );
            return Err(SeatingError::Conflict { taken: conflicts });
        }

        if seat_count > trip.available_seats {
            return Err(SeatingError::SoldOut {
                requested: seat_count,
                available: trip.available_seats,
            });
        }

        let passenger = request.passenger;
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            trip_id,
            seats: seats.iter().copied().collect(),
            num_seats: seat_count,
            total_price_cents: trip.price_cents * i64::from(seat_count),
            status: BookingStatus::Confirmed,
            passenger_name: passenger.name.trim().to_string(),
            passenger_email: passenger.email.trim().to_string(),
            passenger_phone: passenger
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            booking_reference: booking_reference(),
            created_at: now,
        };

        tx.insert_booking(&booking).await?;
        tx.adjust_available_seats(trip_id, -seat_count).await?;
        tx.delete_holds(trip_id, user_id, Some(&seats)).await?;
        tx.commit().await?;

        info!(
            "Booking {} ({}) confirmed for user {} on trip {}: seats {:?}",
            booking.booking_reference, booking.id, user_id, trip_id, booking.seats
        );

        Ok(booking)
    }

    /// Mark a booking cancelled. Cancelling twice is a no-op.
    pub async fn cancel(&self, booking_id: Uuid) -> SeatingResult<Booking> {
        let mut tx = self.ledger.begin().await?;
        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| SeatingError::NotFound(format!("Booking {}", booking_id)))?;

        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }

        tx.set_booking_status(booking_id, BookingStatus::Cancelled)
            .await?;

        if self.cancellation == CancellationPolicy::ReclaimCapacity {
            tx.lock_trip(booking.trip_id).await?;
            tx.adjust_available_seats(booking.trip_id, booking.num_seats)
                .await?;
            let seats: BTreeSet<SeatNumber> = booking.seats.iter().copied().collect();
            tx.delete_holds(booking.trip_id, booking.user_id, Some(&seats))
                .await?;
        }

        tx.commit().await?;
        booking.status = BookingStatus::Cancelled;

        info!(
            "Booking {} cancelled ({:?})",
            booking.booking_reference, self.cancellation
        );
        Ok(booking)
    }
}
