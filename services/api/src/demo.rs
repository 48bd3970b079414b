//! Demo timetable for the in-memory storage backend

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use seating::MemorySeatLedger;
use seating::models::{NewTrip, TransportType};
use tracing::info;

struct Departure {
    from: &'static str,
    to: &'static str,
    mode: TransportType,
    /// Minutes after midnight
    departs: i64,
    duration: i32,
    price_cents: i64,
    carrier: &'static str,
    from_station: &'static str,
    to_station: &'static str,
    seats: i32,
}

const DEPARTURES: &[Departure] = &[
    Departure {
        from: "Sofia",
        to: "Plovdiv",
        mode: TransportType::Bus,
        departs: 8 * 60,
        duration: 135,
        price_cents: 1500,
        carrier: "Union Ivkoni",
        from_station: "Central Bus Station Sofia",
        to_station: "Avtogara Yug",
        seats: 48,
    },
    Departure {
        from: "Sofia",
        to: "Plovdiv",
        mode: TransportType::Train,
        departs: 7 * 60 + 10,
        duration: 150,
        price_cents: 1120,
        carrier: "BDZ",
        from_station: "Sofia Central Station",
        to_station: "Plovdiv Central Station",
        seats: 64,
    },
    Departure {
        from: "Sofia",
        to: "Varna",
        mode: TransportType::Bus,
        departs: 9 * 60 + 30,
        duration: 420,
        price_cents: 3500,
        carrier: "Biomet",
        from_station: "Central Bus Station Sofia",
        to_station: "Varna Bus Station",
        seats: 52,
    },
    Departure {
        from: "Sofia",
        to: "Burgas",
        mode: TransportType::Train,
        departs: 6 * 60 + 30,
        duration: 390,
        price_cents: 2350,
        carrier: "BDZ",
        from_station: "Sofia Central Station",
        to_station: "Burgas Railway Station",
        seats: 64,
    },
    Departure {
        from: "Plovdiv",
        to: "Stara Zagora",
        mode: TransportType::Minibus,
        departs: 14 * 60,
        duration: 75,
        price_cents: 900,
        carrier: "Hebros Bus",
        from_station: "Avtogara Sever",
        to_station: "Stara Zagora Bus Station",
        seats: 20,
    },
];

/// Register every demo departure on each of the next `days` days starting at `today`
pub async fn seed(ledger: &MemorySeatLedger, today: NaiveDate, days: i64) -> usize {
    let mut count = 0;
    for offset in 0..days {
        let date = today + TimeDelta::days(offset);
        for d in DEPARTURES {
            let departure_time = NaiveTime::MIN + TimeDelta::minutes(d.departs);
            ledger
                .insert_trip(NewTrip {
                    from_city: d.from.to_string(),
                    to_city: d.to.to_string(),
                    transport_type: d.mode,
                    departure_date: date,
                    departure_time,
                    arrival_time: departure_time + TimeDelta::minutes(i64::from(d.duration)),
                    duration_minutes: d.duration,
                    price_cents: d.price_cents,
                    carrier: d.carrier.to_string(),
                    departure_location: d.from_station.to_string(),
                    arrival_location: d.to_station.to_string(),
                    total_seats: d.seats,
                })
                .await;
            count += 1;
        }
    }

    info!("Seeded {} demo trips", count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use seating::SeatLedger;
    use seating::models::TripSearch;

    #[tokio::test]
    async fn test_seed_covers_each_day() {
        let ledger = MemorySeatLedger::new();
        let today = Utc::now().date_naive();

        let count = seed(&ledger, today, 3).await;
        assert_eq!(count, DEPARTURES.len() * 3);

        let search = TripSearch {
            from_city: "Sofia".into(),
            to_city: "Plovdiv".into(),
            date: Some(today + TimeDelta::days(2)),
            modes: vec![],
        };
        let trips = ledger.search_trips(&search, today).await.unwrap();
        assert_eq!(trips.len(), 2);
        // Train leaves before the bus
        assert_eq!(trips[0].transport_type, TransportType::Train);
        assert_eq!(trips[0].arrival_time, NaiveTime::from_hms_opt(9, 40, 0).unwrap());
    }
}
