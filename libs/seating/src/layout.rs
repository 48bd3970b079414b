//! Seat map derived from a trip's seat count and transport type.
//! Nothing here is persisted.

use serde::Serialize;

use crate::models::{Availability, SeatNumber, TransportType, Trip, TripId};

const POSITIONS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Number of seats in one row of the vehicle
pub fn seats_per_row(transport: TransportType) -> usize {
    match transport {
        TransportType::Train | TransportType::Bus | TransportType::Minibus => POSITIONS.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatCell {
    pub number: SeatNumber,
    pub row: u32,
    pub position: char,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMap {
    pub trip_id: TripId,
    pub transport_type: TransportType,
    pub seats_per_row: usize,
    pub poll_interval_seconds: u64,
    pub seats: Vec<SeatCell>,
}

impl SeatMap {
    /// Lay the trip's seats out row by row and colour them by occupancy.
    /// A booked seat reads as booked even if a stale hold still exists.
    pub fn build(trip: &Trip, availability: &Availability, poll_interval_seconds: u64) -> Self {
        let per_row = seats_per_row(trip.transport_type);
        let seats = (1..=trip.total_seats.max(0))
            .map(|number| {
                let index = (number - 1) as usize;
                let status = if availability.booked.contains(&number) {
                    SeatStatus::Booked
                } else if availability.held.contains(&number) {
                    SeatStatus::Held
                } else {
                    SeatStatus::Available
                };
                SeatCell {
                    number,
                    row: (index / per_row) as u32 + 1,
                    position: POSITIONS[index % per_row],
                    status,
                }
            })
            .collect();

        Self {
            trip_id: trip.id,
            transport_type: trip.transport_type,
            seats_per_row: per_row,
            poll_interval_seconds,
            seats,
        }
    }
}
