//! API models for request and response payloads

use chrono::{DateTime, NaiveDate, Utc};
use seating::models::{
    BookingRequest, BookingWithTrip, HoldGrant, Passenger, SeatNumber, TransportType,
    Trip, TripId, TripSearch,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

fn missing_fields() -> ApiError {
    ApiError::BadRequest("Missing required fields".to_string())
}

/// Body of `POST /seats/reserve`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSeatsRequest {
    pub trip_id: Option<TripId>,
    pub seats: Option<Vec<SeatNumber>>,
    pub user_id: Option<Uuid>,
}

impl ReserveSeatsRequest {
    pub fn into_parts(self) -> ApiResult<(TripId, Vec<SeatNumber>, Uuid)> {
        match (self.trip_id, self.seats, self.user_id) {
            (Some(trip_id), Some(seats), Some(user_id)) if !seats.is_empty() => {
                Ok((trip_id, seats, user_id))
            }
            _ => Err(missing_fields()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSeatsResponse {
    pub success: bool,
    pub reserved_until: DateTime<Utc>,
    pub seats: Vec<SeatNumber>,
}

impl From<HoldGrant> for ReserveSeatsResponse {
    fn from(grant: HoldGrant) -> Self {
        Self {
            success: true,
            reserved_until: grant.reserved_until,
            seats: grant.seats,
        }
    }
}

/// Body of `DELETE /seats/reserve`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSeatsRequest {
    pub trip_id: Option<TripId>,
    pub user_id: Option<Uuid>,
}

impl ReleaseSeatsRequest {
    pub fn into_parts(self) -> ApiResult<(TripId, Uuid)> {
        match (self.trip_id, self.user_id) {
            (Some(trip_id), Some(user_id)) => Ok((trip_id, user_id)),
            _ => Err(missing_fields()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReleaseSeatsResponse {
    pub success: bool,
    pub released: u64,
}

/// Body of `POST /bookings`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub trip_id: Option<TripId>,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub seats: Vec<SeatNumber>,
    pub num_seats: Option<i32>,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
    pub passenger_phone: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_booking_request(self) -> ApiResult<BookingRequest> {
        let (Some(trip_id), Some(user_id), Some(name), Some(email)) = (
            self.trip_id,
            self.user_id,
            self.passenger_name,
            self.passenger_email,
        ) else {
            return Err(missing_fields());
        };
        if self.seats.is_empty() && self.num_seats.is_none() {
            return Err(missing_fields());
        }

        Ok(BookingRequest {
            trip_id,
            user_id,
            seats: self.seats,
            num_seats: self.num_seats,
            passenger: Passenger {
                name,
                email,
                phone: self.passenger_phone.filter(|p| !p.trim().is_empty()),
            },
        })
    }
}

/// Query of `GET /search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    /// Comma separated, e.g. `bus,train`
    pub modes: Option<String>,
}

impl SearchQuery {
    pub fn into_search(self) -> ApiResult<TripSearch> {
        let modes = match self.modes.as_deref() {
            Some(list) => list
                .split(',')
                .filter(|m| !m.trim().is_empty())
                .map(|m| m.parse::<TransportType>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApiError::BadRequest)?,
            None => Vec::new(),
        };

        Ok(TripSearch {
            from_city: self.from.unwrap_or_default().trim().to_string(),
            to_city: self.to.unwrap_or_default().trim().to_string(),
            date: self.date,
            modes,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub trips: Vec<Trip>,
}

#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingWithTrip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_request_requires_every_field() {
        let body: ReserveSeatsRequest =
            serde_json::from_str(r#"{"tripId": 4, "seats": [1, 2]}"#).unwrap();
        assert!(matches!(body.into_parts(), Err(ApiError::BadRequest(_))));

        let body: ReserveSeatsRequest = serde_json::from_str(
            r#"{"tripId": 4, "seats": [], "userId": "6f1c1f8e-4a37-4d55-9b7b-3f1f1a0c2b10"}"#,
        )
        .unwrap();
        assert!(body.into_parts().is_err());
    }

    #[test]
    fn test_search_query_parses_modes() {
        let query = SearchQuery {
            from: Some(" Sofia ".into()),
            to: Some("Varna".into()),
            date: None,
            modes: Some("bus, Train,".into()),
        };
        let search = query.into_search().unwrap();
        assert_eq!(search.from_city, "Sofia");
        assert_eq!(search.modes, vec![TransportType::Bus, TransportType::Train]);

        let query = SearchQuery {
            modes: Some("ferry".into()),
            ..Default::default()
        };
        assert!(matches!(query.into_search(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_booking_request_blank_phone_is_dropped() {
        let body: CreateBookingRequest = serde_json::from_str(
            r#"{
                "tripId": 1,
                "userId": "6f1c1f8e-4a37-4d55-9b7b-3f1f1a0c2b10",
                "numSeats": 2,
                "passengerName": "Ivan Petrov",
                "passengerEmail": "ivan@example.bg",
                "passengerPhone": "  "
            }"#,
        )
        .unwrap();

        let request = body.into_booking_request().unwrap();
        assert!(request.seats.is_empty());
        assert_eq!(request.num_seats, Some(2));
        assert_eq!(request.passenger.phone, None);
    }
}
