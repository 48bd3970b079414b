//! Availability resolver: which seats of a trip are held or booked right now

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::error::SeatingResult;
use crate::ledger::SeatLedger;
use crate::models::{Availability, SeatNumber, TripId};

#[derive(Clone)]
pub struct AvailabilityResolver {
    ledger: Arc<dyn SeatLedger>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityResolver {
    pub fn new(ledger: Arc<dyn SeatLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Sweep expired holds, then report held, booked and taken seats.
    /// An unknown trip simply has nothing taken.
    pub async fn availability(&self, trip_id: TripId) -> SeatingResult<Availability> {
        let now = self.clock.now();
        let swept = self.ledger.sweep_expired_holds(now).await?;
        if swept > 0 {
            debug!("Swept {} expired holds", swept);
        }

        let mut tx = self.ledger.begin().await?;
        let held: BTreeSet<SeatNumber> = tx
            .active_holds(trip_id, now)
            .await?
            .into_iter()
            .map(|hold| hold.seat_number)
            .collect();
        let booked = tx.committed_seats(trip_id).await?;
        tx.commit().await?;

        Ok(Availability::new(held, booked))
    }
}
