//! Seat ledger entities and the payloads that flow through the booking protocol

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trip identifier
pub type TripId = i64;

/// Seat number within a trip, `1..=total_seats`
pub type SeatNumber = i32;

/// Kind of vehicle serving a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Train,
    Bus,
    Minibus,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Train => "train",
            TransportType::Bus => "bus",
            TransportType::Minibus => "minibus",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(TransportType::Train),
            "bus" => Ok(TransportType::Bus),
            "minibus" => Ok(TransportType::Minibus),
            other => Err(format!("unknown transport type '{}'", other)),
        }
    }
}

/// One scheduled departure between two cities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub from_city: String,
    pub to_city: String,
    pub transport_type: TransportType,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub duration_minutes: i32,
    /// Price of a single seat in euro cents
    pub price_cents: i64,
    pub carrier: String,
    pub departure_location: String,
    pub arrival_location: String,
    pub total_seats: i32,
    /// Derived capacity counter, maintained alongside bookings
    pub available_seats: i32,
}

impl Trip {
    /// Whether `seat` exists on this trip
    pub fn has_seat(&self, seat: SeatNumber) -> bool {
        (1..=self.total_seats).contains(&seat)
    }
}

/// Trip creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub from_city: String,
    pub to_city: String,
    pub transport_type: TransportType,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub carrier: String,
    pub departure_location: String,
    pub arrival_location: String,
    pub total_seats: i32,
}

impl NewTrip {
    pub fn into_trip(self, id: TripId) -> Trip {
        Trip {
            id,
            from_city: self.from_city,
            to_city: self.to_city,
            transport_type: self.transport_type,
            departure_date: self.departure_date,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            duration_minutes: self.duration_minutes,
            price_cents: self.price_cents,
            carrier: self.carrier,
            departure_location: self.departure_location,
            arrival_location: self.arrival_location,
            total_seats: self.total_seats,
            available_seats: self.total_seats,
        }
    }
}

/// Temporary claim on one seat by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatHold {
    pub trip_id: TripId,
    pub seat_number: SeatNumber,
    pub user_id: Uuid,
    pub reserved_until: DateTime<Utc>,
}

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses whose seats count as occupied
    pub const OCCUPYING: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn occupies_seats(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// Passenger contact details attached to a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Finalized reservation of one or more seats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_id: TripId,
    pub seats: Vec<SeatNumber>,
    pub num_seats: i32,
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: Option<String>,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Booking joined with its trip, as listed on a user's profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithTrip {
    #[serde(flatten)]
    pub booking: Booking,
    pub trip: Trip,
}

/// Filters for trip search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripSearch {
    pub from_city: String,
    pub to_city: String,
    /// Exact departure date; `None` means "today or later"
    pub date: Option<NaiveDate>,
    /// Empty means every transport type
    pub modes: Vec<TransportType>,
}

/// Seat occupancy of a trip at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(rename = "takenSeats")]
    pub taken: BTreeSet<SeatNumber>,
    #[serde(rename = "reservedSeats")]
    pub held: BTreeSet<SeatNumber>,
    #[serde(rename = "bookedSeats")]
    pub booked: BTreeSet<SeatNumber>,
}

impl Availability {
    pub fn new(held: BTreeSet<SeatNumber>, booked: BTreeSet<SeatNumber>) -> Self {
        let taken = held.union(&booked).copied().collect();
        Self { taken, held, booked }
    }
}

/// Successful hold placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldGrant {
    pub trip_id: TripId,
    pub user_id: Uuid,
    pub seats: Vec<SeatNumber>,
    pub reserved_until: DateTime<Utc>,
}

/// Input of the booking finalizer
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub trip_id: TripId,
    pub user_id: Uuid,
    /// Explicitly chosen seats; empty falls back to `1..=num_seats`
    pub seats: Vec<SeatNumber>,
    pub num_seats: Option<i32>,
    pub passenger: Passenger,
}
