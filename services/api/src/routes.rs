//! API service routes

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use seating::models::TripId;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{
        BookingsResponse, CreateBookingRequest, ReleaseSeatsRequest, ReleaseSeatsResponse,
        ReserveSeatsRequest, ReserveSeatsResponse, SearchQuery, TripsResponse,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/seats/reserve", post(reserve_seats).delete(release_seats))
        .route("/seats/:trip_id", get(seat_availability))
        .route("/search", get(search_trips))
        .route("/trips/:trip_id", get(get_trip))
        .route("/trips/:trip_id/seat-map", get(get_seat_map))
        .route("/bookings", post(create_booking))
        .route("/bookings/:booking_id", get(get_booking))
        .route("/bookings/:booking_id/cancel", post(cancel_booking))
        .route("/users/:user_id/bookings", get(get_user_bookings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => match common::database::health_check(pool).await {
            Ok(true) => "ok",
            _ => "unavailable",
        },
        None => "memory",
    };
    let status = if database == "unavailable" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "service": "api-service",
            "database": database,
        })),
    )
}

/// Taken, held and booked seats of a trip
pub async fn seat_availability(
    State(state): State<AppState>,
    trip_id: Result<Path<TripId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(trip_id) = trip_id?;
    let availability = state.seating.availability.availability(trip_id).await?;

    Ok(Json(availability))
}

/// Hold seats for five minutes
pub async fn reserve_seats(
    State(state): State<AppState>,
    payload: Result<Json<ReserveSeatsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let (trip_id, seats, user_id) = payload.into_parts()?;

    let grant = state.seating.holds.place_hold(trip_id, &seats, user_id).await?;

    Ok(Json(ReserveSeatsResponse::from(grant)))
}

/// Release every hold the user has on the trip
pub async fn release_seats(
    State(state): State<AppState>,
    payload: Result<Json<ReleaseSeatsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let (trip_id, user_id) = payload.into_parts()?;

    let released = state.seating.holds.release_holds(trip_id, user_id).await?;

    Ok(Json(ReleaseSeatsResponse {
        success: true,
        released,
    }))
}

/// Search trips on a route
pub async fn search_trips(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let trips = state.seating.search_trips(&query.into_search()?).await?;

    Ok(Json(TripsResponse { trips }))
}

/// Get a trip by ID
pub async fn get_trip(
    State(state): State<AppState>,
    trip_id: Result<Path<TripId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(trip_id) = trip_id?;

    Ok(Json(state.seating.trip(trip_id).await?))
}

/// Seat grid of a trip for the seat-selection view
pub async fn get_seat_map(
    State(state): State<AppState>,
    trip_id: Result<Path<TripId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(trip_id) = trip_id?;

    Ok(Json(state.seating.seat_map(trip_id).await?))
}

/// Finalize a booking
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let booking = state
        .seating
        .finalizer
        .finalize(payload.into_booking_request()?)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get a booking by ID
pub async fn get_booking(
    State(state): State<AppState>,
    booking_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(booking_id) = booking_id?;

    Ok(Json(state.seating.booking(booking_id).await?))
}

/// Cancel a booking
pub async fn cancel_booking(
    State(state): State<AppState>,
    booking_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(booking_id) = booking_id?;
    let booking = state.seating.finalizer.cancel(booking_id).await?;
    info!("Booking {} cancelled via API", booking.booking_reference);

    Ok(Json(booking))
}

/// All bookings of a user, newest first
pub async fn get_user_bookings(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(user_id) = user_id?;
    let bookings = state.seating.user_bookings(user_id).await?;

    Ok(Json(BookingsResponse { bookings }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, Response},
    };
    use chrono::{NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
    use seating::models::{NewTrip, TransportType, Trip};
    use seating::{ManualClock, MemorySeatLedger, Policies, SeatingService};
    use serde_json::Value;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        clock: ManualClock,
        trip: Trip,
    }

    async fn test_app() -> TestApp {
        let ledger = MemorySeatLedger::new();
        let trip = ledger
            .insert_trip(NewTrip {
                from_city: "Sofia".into(),
                to_city: "Varna".into(),
                transport_type: TransportType::Bus,
                departure_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
                departure_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                arrival_time: NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
                duration_minutes: 420,
                price_cents: 3500,
                carrier: "Biomet".into(),
                departure_location: "Central Bus Station Sofia".into(),
                arrival_location: "Varna Bus Station".into(),
                total_seats: 12,
            })
            .await;
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap());
        let seating = SeatingService::new(
            Arc::new(ledger),
            Arc::new(clock.clone()),
            Policies::default(),
        );

        TestApp {
            router: create_router(AppState {
                seating,
                db_pool: None,
            }),
            clock,
            trip,
        }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn reserve(trip_id: TripId, seats: &[i32], user_id: Uuid) -> Value {
        json!({ "tripId": trip_id, "seats": seats, "userId": user_id })
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app().await;
        let response = send(&app.router, Method::GET, "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "memory");
    }

    #[tokio::test]
    async fn test_reserve_then_availability() {
        let app = test_app().await;
        let user = Uuid::new_v4();

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[4, 3], user)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["seats"], json!([3, 4]));
        assert_eq!(body["reservedUntil"], "2026-11-01T12:05:00Z");

        let uri = format!("/seats/{}", app.trip.id);
        let body = json_body(send(&app.router, Method::GET, &uri, None).await).await;
        assert_eq!(body["takenSeats"], json!([3, 4]));
        assert_eq!(body["reservedSeats"], json!([3, 4]));
        assert_eq!(body["bookedSeats"], json!([]));
    }

    #[tokio::test]
    async fn test_reserve_conflict_reports_taken_seats() {
        let app = test_app().await;
        send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[5], Uuid::new_v4())),
        )
        .await;

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[5, 6], Uuid::new_v4())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Some seats are already taken");
        assert_eq!(body["takenSeats"], json!([5]));
    }

    #[tokio::test]
    async fn test_expired_hold_frees_seat() {
        let app = test_app().await;
        send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[7], Uuid::new_v4())),
        )
        .await;

        app.clock.advance(TimeDelta::minutes(5));

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[7], Uuid::new_v4())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reserve_rejects_bad_input() {
        let app = test_app().await;

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(json!({ "tripId": app.trip.id, "seats": [1] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing required fields");

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(json!({ "tripId": app.trip.id, "seats": [1], "userId": "not-a-uuid" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[13], Uuid::new_v4())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(999, &[1], Uuid::new_v4())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_release_rejects_missing_fields() {
        let app = test_app().await;

        let response = send(
            &app.router,
            Method::DELETE,
            "/seats/reserve",
            Some(json!({ "tripId": app.trip.id })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing required fields");

        let response = send(
            &app.router,
            Method::DELETE,
            "/seats/reserve",
            Some(json!({ "userId": Uuid::new_v4() })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_release_seats() {
        let app = test_app().await;
        let user = Uuid::new_v4();
        send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[1, 2], user)),
        )
        .await;

        let response = send(
            &app.router,
            Method::DELETE,
            "/seats/reserve",
            Some(json!({ "tripId": app.trip.id, "userId": user })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "success": true, "released": 2 })
        );
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let app = test_app().await;
        let user = Uuid::new_v4();
        send(
            &app.router,
            Method::POST,
            "/seats/reserve",
            Some(reserve(app.trip.id, &[9, 10], user)),
        )
        .await;

        let response = send(
            &app.router,
            Method::POST,
            "/bookings",
            Some(json!({
                "tripId": app.trip.id,
                "userId": user,
                "seats": [9, 10],
                "passengerName": "Georgi Ivanov",
                "passengerEmail": "georgi@example.bg",
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let booking = json_body(response).await;
        assert_eq!(booking["status"], "confirmed");
        assert_eq!(booking["totalPriceCents"], 7000);
        let booking_id = booking["id"].as_str().unwrap().to_string();

        let uri = format!("/trips/{}", app.trip.id);
        let trip = json_body(send(&app.router, Method::GET, &uri, None).await).await;
        assert_eq!(trip["availableSeats"], 10);

        let uri = format!("/users/{}/bookings", user);
        let listing = json_body(send(&app.router, Method::GET, &uri, None).await).await;
        assert_eq!(listing["bookings"][0]["id"], booking_id.as_str());
        assert_eq!(listing["bookings"][0]["trip"]["toCity"], "Varna");

        let uri = format!("/bookings/{}/cancel", booking_id);
        let response = send(&app.router, Method::POST, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "cancelled");

        let uri = format!("/bookings/{}", booking_id);
        let fetched = json_body(send(&app.router, Method::GET, &uri, None).await).await;
        assert_eq!(fetched["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let app = test_app().await;
        let uri = format!("/bookings/{}", Uuid::new_v4());

        let response = send(&app.router, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_and_seat_map() {
        let app = test_app().await;

        let response = send(&app.router, Method::GET, "/search?from=Sofia", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(
            send(
                &app.router,
                Method::GET,
                "/search?from=Sofia&to=Varna&modes=bus",
                None,
            )
            .await,
        )
        .await;
        assert_eq!(body["trips"].as_array().unwrap().len(), 1);

        let body = json_body(
            send(
                &app.router,
                Method::GET,
                "/search?from=Sofia&to=Varna&date=2026-11-21",
                None,
            )
            .await,
        )
        .await;
        assert!(body["trips"].as_array().unwrap().is_empty());

        let uri = format!("/trips/{}/seat-map", app.trip.id);
        let map = json_body(send(&app.router, Method::GET, &uri, None).await).await;
        assert_eq!(map["seatsPerRow"], 4);
        assert_eq!(map["seats"].as_array().unwrap().len(), 12);
    }
}
