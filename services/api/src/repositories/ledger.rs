//! PostgreSQL seat ledger
//!
//! Units of work are database transactions. `lock_trip` and `lock_booking`
//! use `SELECT ... FOR UPDATE`, so every placement, finalization and
//! cancellation touching the same trip is serialized by its row lock.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use seating::models::{
    Booking, BookingStatus, BookingWithTrip, SeatHold, SeatNumber, Trip, TripId, TripSearch,
};
use seating::{LedgerTx, SeatLedger, SeatingError, SeatingResult};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{
    BOOKING_COLUMNS, TRIP_COLUMNS, booking_from_row, hold_from_row, query_error, trip_from_row,
};

fn occupying_statuses() -> Vec<String> {
    BookingStatus::OCCUPYING
        .iter()
        .map(|status| status.as_str().to_string())
        .collect()
}

/// Seat ledger backed by PostgreSQL
#[derive(Clone)]
pub struct PgSeatLedger {
    pool: PgPool,
}

impl PgSeatLedger {
    /// Create a new ledger over a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatLedger for PgSeatLedger {
    async fn begin(&self) -> SeatingResult<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await.map_err(query_error)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    /// Rows locked by an open unit of work are skipped; that unit either
    /// deletes them itself or a later sweep picks them up.
    async fn sweep_expired_holds(&self, now: DateTime<Utc>) -> SeatingResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM seat_holds
            WHERE id IN (
                SELECT id FROM seat_holds
                WHERE reserved_until <= $1
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected())
    }

    async fn find_trip(&self, trip_id: TripId) -> SeatingResult<Option<Trip>> {
        let sql = format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.map(|row| trip_from_row(&row, "id")).transpose()
    }

    async fn search_trips(
        &self,
        search: &TripSearch,
        today: NaiveDate,
    ) -> SeatingResult<Vec<Trip>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM trips
            WHERE from_city = $1
              AND to_city = $2
              AND (($3::date IS NOT NULL AND departure_date = $3)
                   OR ($3::date IS NULL AND departure_date >= $4))
              AND (cardinality($5::text[]) = 0 OR transport_type = ANY($5))
            ORDER BY departure_date ASC, departure_time ASC, id ASC
            "#,
            TRIP_COLUMNS
        );
        let modes: Vec<String> = search.modes.iter().map(|m| m.as_str().to_string()).collect();

        let rows = sqlx::query(&sql)
            .bind(&search.from_city)
            .bind(&search.to_city)
            .bind(search.date)
            .bind(today)
            .bind(modes)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        debug!(
            "Trip search {} -> {} matched {} trips",
            search.from_city,
            search.to_city,
            rows.len()
        );

        rows.iter().map(|row| trip_from_row(row, "id")).collect()
    }

    async fn find_booking(&self, booking_id: Uuid) -> SeatingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.map(|row| booking_from_row(&row, "id")).transpose()
    }

    async fn user_bookings(&self, user_id: Uuid) -> SeatingResult<Vec<BookingWithTrip>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id AS booking_id, b.user_id, b.trip_id, b.seats, b.num_seats,
                   b.total_price_cents, b.status, b.passenger_name, b.passenger_email,
                   b.passenger_phone, b.booking_reference, b.created_at,
                   t.from_city, t.to_city, t.transport_type, t.departure_date,
                   t.departure_time, t.arrival_time, t.duration_minutes, t.price_cents,
                   t.carrier, t.departure_location, t.arrival_location, t.total_seats,
                   t.available_seats
            FROM bookings b
            JOIN trips t ON t.id = b.trip_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(BookingWithTrip {
                    booking: booking_from_row(row, "booking_id")?,
                    trip: trip_from_row(row, "trip_id")?,
                })
            })
            .collect()
    }
}

/// One PostgreSQL transaction; rolled back on drop unless committed
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_trip(&mut self, trip_id: TripId) -> SeatingResult<Option<Trip>> {
        let sql = format!("SELECT {} FROM trips WHERE id = $1 FOR UPDATE", TRIP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(trip_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;

        row.map(|row| trip_from_row(&row, "id")).transpose()
    }

    async fn active_holds(
        &mut self,
        trip_id: TripId,
        now: DateTime<Utc>,
    ) -> SeatingResult<Vec<SeatHold>> {
        let rows = sqlx::query(
            r#"
            SELECT trip_id, seat_number, user_id, reserved_until
            FROM seat_holds
            WHERE trip_id = $1 AND reserved_until > $2
            "#,
        )
        .bind(trip_id)
        .bind(now)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_error)?;

        rows.iter().map(hold_from_row).collect()
    }

    async fn committed_seats(&mut self, trip_id: TripId) -> SeatingResult<BTreeSet<SeatNumber>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT unnest(seats) AS seat
            FROM bookings
            WHERE trip_id = $1 AND status = ANY($2)
            "#,
        )
        .bind(trip_id)
        .bind(occupying_statuses())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| row.try_get::<SeatNumber, _>("seat").map_err(query_error))
            .collect()
    }

    async fn insert_holds(&mut self, holds: &[SeatHold]) -> SeatingResult<()> {
        let trip_ids: Vec<TripId> = holds.iter().map(|h| h.trip_id).collect();
        let seats: Vec<SeatNumber> = holds.iter().map(|h| h.seat_number).collect();
        let users: Vec<Uuid> = holds.iter().map(|h| h.user_id).collect();
        let expiries: Vec<DateTime<Utc>> = holds.iter().map(|h| h.reserved_until).collect();

        sqlx::query(
            r#"
            INSERT INTO seat_holds (trip_id, seat_number, user_id, reserved_until)
            SELECT * FROM UNNEST($1::bigint[], $2::int[], $3::uuid[], $4::timestamptz[])
            "#,
        )
        .bind(trip_ids)
        .bind(seats)
        .bind(users)
        .bind(expiries)
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn delete_holds(
        &mut self,
        trip_id: TripId,
        user_id: Uuid,
        seats: Option<&BTreeSet<SeatNumber>>,
    ) -> SeatingResult<u64> {
        let seats: Option<Vec<SeatNumber>> = seats.map(|s| s.iter().copied().collect());

        let result = sqlx::query(
            r#"
            DELETE FROM seat_holds
            WHERE trip_id = $1
              AND user_id = $2
              AND ($3::int[] IS NULL OR seat_number = ANY($3))
            "#,
        )
        .bind(trip_id)
        .bind(user_id)
        .bind(seats)
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> SeatingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, trip_id, seats, num_seats, total_price_cents,
                                  status, passenger_name, passenger_email, passenger_phone,
                                  booking_reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.trip_id)
        .bind(&booking.seats)
        .bind(booking.num_seats)
        .bind(booking.total_price_cents)
        .bind(booking.status.as_str())
        .bind(&booking.passenger_name)
        .bind(&booking.passenger_email)
        .bind(&booking.passenger_phone)
        .bind(&booking.booking_reference)
        .bind(booking.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn adjust_available_seats(&mut self, trip_id: TripId, delta: i32) -> SeatingResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET available_seats = available_seats + $2
            WHERE id = $1
            "#,
        )
        .bind(trip_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(SeatingError::NotFound(format!("Trip {}", trip_id)));
        }
        Ok(())
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> SeatingResult<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(booking_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;

        row.map(|row| booking_from_row(&row, "id")).transpose()
    }

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> SeatingResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(SeatingError::NotFound(format!("Booking {}", booking_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> SeatingResult<()> {
        self.tx.commit().await.map_err(query_error)
    }
}
