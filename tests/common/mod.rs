#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use airline_booking_backend::config::{Config, HoldPolicy};
use airline_booking_backend::entities::user::UserRole;
use airline_booking_backend::entities::{airport, flight, seat, user};
use airline_booking_backend::reservation::{HoldRequest, TravellerDetails};
use airline_booking_backend::{AppState, ReservationCoordinator};

/// Fresh in-memory database with the full schema. The pool holds a single
/// connection so every transaction runs to completion before the next starts;
/// row-lock contention is covered by `postgres_contention_test`.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn coordinator(db: &DatabaseConnection) -> ReservationCoordinator {
    ReservationCoordinator::new(db.clone(), HoldPolicy::default())
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        hold: HoldPolicy::default(),
        hold_sweep_interval_secs: 0,
        admin_email: "admin@airline.local".to_string(),
        admin_password: None,
    }
}

pub fn app_state(db: &DatabaseConnection) -> AppState {
    AppState::new(db.clone(), test_config())
}

/// Seeded airport by IATA code.
pub async fn airport_id(db: &DatabaseConnection, code: &str) -> Uuid {
    airport::Entity::find()
        .filter(airport::Column::Code.eq(code))
        .one(db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("airport {} is not seeded", code))
        .id
}

pub async fn create_user(db: &DatabaseConnection, email: &str, role: UserRole) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        name: Set("Test User".to_string()),
        phone: Set(None),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn create_customer(db: &DatabaseConnection) -> Uuid {
    create_user(db, &format!("{}@example.com", Uuid::new_v4().simple()), UserRole::Customer).await
}

/// Flight MAA → DEL departing `departs_in` from now.
pub async fn create_flight(
    db: &DatabaseConnection,
    base_fare: f64,
    departs_in: Duration,
    travel_class: &str,
) -> flight::Model {
    let departure = Utc::now() + departs_in;
    flight::ActiveModel {
        id: Set(Uuid::new_v4()),
        carrier_name: Set("Test Air".to_string()),
        flight_code: Set(format!("TA{}", rand_suffix())),
        origin_airport_id: Set(airport_id(db, "MAA").await),
        destination_airport_id: Set(airport_id(db, "DEL").await),
        departure_time: Set(departure.into()),
        arrival_time: Set((departure + Duration::minutes(150)).into()),
        duration_minutes: Set(150),
        stops: Set(0),
        base_fare: Set(base_fare),
        travel_class: Set(travel_class.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap()
}

fn rand_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_uppercase()
}

/// Insert seats as `(seat_number, price_delta, occupied)`, returned in the
/// given order.
pub async fn create_seats(
    db: &DatabaseConnection,
    flight_id: Uuid,
    seats: &[(&str, f64, bool)],
) -> Vec<seat::Model> {
    let mut created = Vec::with_capacity(seats.len());
    for (number, delta, occupied) in seats {
        let model = seat::ActiveModel {
            id: Set(Uuid::new_v4()),
            flight_id: Set(flight_id),
            seat_number: Set(number.to_string()),
            travel_class: Set("Economy".to_string()),
            price_delta: Set(*delta),
            is_occupied: Set(*occupied),
            held_by: Set(None),
        }
        .insert(db)
        .await
        .unwrap();
        created.push(model);
    }
    created
}

/// Economy flight ten days out with `count` free seats and no surcharges.
pub async fn simple_flight(db: &DatabaseConnection, count: usize) -> (flight::Model, Vec<seat::Model>) {
    let flight = create_flight(db, 1000.0, Duration::days(10), "Economy").await;
    let numbers: Vec<String> = (1..=count).map(|n| format!("{}A", n)).collect();
    let layout: Vec<(&str, f64, bool)> = numbers.iter().map(|n| (n.as_str(), 0.0, false)).collect();
    let seats = create_seats(db, flight.id, &layout).await;
    (flight, seats)
}

pub async fn reload_seat(db: &DatabaseConnection, seat_id: Uuid) -> seat::Model {
    seat::Entity::find_by_id(seat_id).one(db).await.unwrap().unwrap()
}

pub fn hold(flight_id: Uuid, seat_ids: Vec<Uuid>) -> HoldRequest {
    HoldRequest {
        flight_id,
        seat_ids,
        hold_minutes: None,
    }
}

pub fn traveller(first_name: &str) -> TravellerDetails {
    TravellerDetails {
        first_name: first_name.to_string(),
        middle_name: None,
        last_name: "Traveller".to_string(),
        date_of_birth: None,
        government_id_type: Some("PASSPORT".to_string()),
        government_id_number: Some("P1234567".to_string()),
        email: Some(format!("{}@example.com", first_name.to_lowercase())),
        phone: None,
    }
}
