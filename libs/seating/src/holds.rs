//! Hold manager: temporary per-user seat holds with a fixed lifetime

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{SeatingError, SeatingResult};
use crate::ledger::SeatLedger;
use crate::models::{HoldGrant, SeatHold, SeatNumber, TripId};
use crate::policy::{ReholdPolicy, hold_expiry};

/// Places and releases seat holds
#[derive(Clone)]
pub struct HoldManager {
    ledger: Arc<dyn SeatLedger>,
    clock: Arc<dyn Clock>,
    rehold: ReholdPolicy,
}

impl HoldManager {
    pub fn new(ledger: Arc<dyn SeatLedger>, clock: Arc<dyn Clock>, rehold: ReholdPolicy) -> Self {
        Self {
            ledger,
            clock,
            rehold,
        }
    }

    /// Hold `seats` on `trip_id` for `user_id`.
    ///
    /// Expired holds on every trip are swept first. The request is granted
    /// only if none of the seats is held by another user or booked; otherwise
    /// nothing is written and the offending seats are reported in
    /// [`SeatingError::Conflict`].
    pub async fn place_hold(
        &self,
        trip_id: TripId,
        seats: &[SeatNumber],
        user_id: Uuid,
    ) -> SeatingResult<HoldGrant> {
        let requested: BTreeSet<SeatNumber> = seats.iter().copied().collect();
        if requested.is_empty() {
            return Err(SeatingError::validation("At least one seat is required"));
        }

        let now = self.clock.now();
        self.ledger.sweep_expired_holds(now).await?;

        let mut tx = self.ledger.begin().await?;
        let trip = tx
            .lock_trip(trip_id)
            .await?
            .ok_or_else(|| SeatingError::NotFound(format!("Trip {}", trip_id)))?;

        let out_of_range: Vec<SeatNumber> = requested
            .iter()
            .copied()
            .filter(|seat| !trip.has_seat(*seat))
            .collect();
        if !out_of_range.is_empty() {
            return Err(SeatingError::validation(format!(
                "Seats {:?} do not exist on trip {} (1..={})",
                out_of_range, trip_id, trip.total_seats
            )));
        }

        let mut taken: BTreeSet<SeatNumber> = tx
            .active_holds(trip_id, now)
            .await?
            .into_iter()
            .filter(|hold| hold.user_id != user_id || self.rehold == ReholdPolicy::Reject)
            .map(|hold| hold.seat_number)
            .collect();
        taken.extend(tx.committed_seats(trip_id).await?);

        let conflicts: Vec<SeatNumber> = requested.intersection(&taken).copied().collect();
        if !conflicts.is_empty() {
            warn!(
                "Hold rejected for user {} on trip {}: seats {:?} taken",
                user_id, trip_id, conflicts
            );
            return Err(SeatingError::Conflict { taken: conflicts });
        }

        if self.rehold == ReholdPolicy::Refresh {
            tx.delete_holds(trip_id, user_id, Some(&requested)).await?;
        }

        let reserved_until = hold_expiry(now);
        let holds: Vec<SeatHold> = requested
            .iter()
            .map(|seat| SeatHold {
                trip_id,
                seat_number: *seat,
                user_id,
                reserved_until,
            })
            .collect();
        tx.insert_holds(&holds).await?;
        tx.commit().await?;

        info!(
            "User {} holds seats {:?} on trip {} until {}",
            user_id, requested, trip_id, reserved_until
        );

        Ok(HoldGrant {
            trip_id,
            user_id,
            seats: requested.into_iter().collect(),
            reserved_until,
        })
    }

    /// Drop every hold `user_id` has on `trip_id`. Returns how many were removed.
    pub async fn release_holds(&self, trip_id: TripId, user_id: Uuid) -> SeatingResult<u64> {
        let mut tx = self.ledger.begin().await?;
        let released = tx.delete_holds(trip_id, user_id, None).await?;
        tx.commit().await?;

        info!(
            "Released {} holds of user {} on trip {}",
            released, user_id, trip_id
        );
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemorySeatLedger;
    use crate::models::{NewTrip, TransportType};
    use chrono::{NaiveDate, NaiveTime, TimeDelta, Utc};

    async fn setup(rehold: ReholdPolicy) -> (MemorySeatLedger, ManualClock, HoldManager, TripId) {
        let ledger = MemorySeatLedger::new();
        let trip = ledger
            .insert_trip(NewTrip {
                from_city: "Varna".to_string(),
                to_city: "Burgas".to_string(),
                transport_type: TransportType::Minibus,
                departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                departure_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                arrival_time: NaiveTime::from_hms_opt(11, 45, 0).unwrap(),
                duration_minutes: 135,
                price_cents: 1200,
                carrier: "Karat-S".to_string(),
                departure_location: "Avtogara Varna".to_string(),
                arrival_location: "Avtogara Yug".to_string(),
                total_seats: 16,
            })
            .await;
        let clock = ManualClock::new(Utc::now());
        let manager = HoldManager::new(Arc::new(ledger.clone()), Arc::new(clock.clone()), rehold);
        (ledger, clock, manager, trip.id)
    }

    #[tokio::test]
    async fn rejects_empty_seat_list() {
        let (_, _, manager, trip_id) = setup(ReholdPolicy::Duplicate).await;
        let result = manager.place_hold(trip_id, &[], Uuid::new_v4()).await;
        assert!(matches!(result, Err(SeatingError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_seats_outside_the_trip() {
        let (ledger, _, manager, trip_id) = setup(ReholdPolicy::Duplicate).await;
        for seat in [0, 17] {
            let result = manager.place_hold(trip_id, &[1, seat], Uuid::new_v4()).await;
            assert!(matches!(result, Err(SeatingError::Validation(_))));
        }
        assert!(ledger.holds().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_trip_is_not_found() {
        let (_, _, manager, _) = setup(ReholdPolicy::Duplicate).await;
        let result = manager.place_hold(999, &[1], Uuid::new_v4()).await;
        assert!(matches!(result, Err(SeatingError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_seats_in_request_are_collapsed() {
        let (ledger, _, manager, trip_id) = setup(ReholdPolicy::Duplicate).await;
        let grant = manager
            .place_hold(trip_id, &[5, 2, 5], Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(grant.seats, vec![2, 5]);
        assert_eq!(ledger.holds().await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_policy_stacks_same_user_holds() {
        let (ledger, clock, manager, trip_id) = setup(ReholdPolicy::Duplicate).await;
        let user = Uuid::new_v4();
        manager.place_hold(trip_id, &[1], user).await.unwrap();
        clock.advance(TimeDelta::minutes(1));
        manager.place_hold(trip_id, &[1], user).await.unwrap();
        assert_eq!(ledger.holds().await.len(), 2);
    }

    #[tokio::test]
    async fn refresh_policy_replaces_same_user_holds() {
        let (ledger, clock, manager, trip_id) = setup(ReholdPolicy::Refresh).await;
        let user = Uuid::new_v4();
        manager.place_hold(trip_id, &[1, 2], user).await.unwrap();
        clock.advance(TimeDelta::minutes(3));
        let grant = manager.place_hold(trip_id, &[1], user).await.unwrap();

        let holds = ledger.holds().await;
        assert_eq!(holds.len(), 2);
        let seat_one = holds.iter().find(|h| h.seat_number == 1).unwrap();
        assert_eq!(seat_one.reserved_until, grant.reserved_until);
    }

    #[tokio::test]
    async fn reject_policy_treats_own_holds_as_taken() {
        let (_, _, manager, trip_id) = setup(ReholdPolicy::Reject).await;
        let user = Uuid::new_v4();
        manager.place_hold(trip_id, &[1, 2], user).await.unwrap();
        match manager.place_hold(trip_id, &[2, 3], user).await {
            Err(SeatingError::Conflict { taken }) => assert_eq!(taken, vec![2]),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn release_removes_only_callers_holds_on_that_trip() {
        let (ledger, _, manager, trip_id) = setup(ReholdPolicy::Duplicate).await;
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        manager.place_hold(trip_id, &[1, 2], user).await.unwrap();
        manager.place_hold(trip_id, &[3], other).await.unwrap();

        assert_eq!(manager.release_holds(trip_id, user).await.unwrap(), 2);
        assert_eq!(manager.release_holds(trip_id, user).await.unwrap(), 0);

        let holds = ledger.holds().await;
        assert_eq!(holds.len(), 1);
        assert_eq!(holds[0].user_id, other);
    }
}
