use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::flight::{self, TRAVEL_CLASSES};
use crate::entities::{airport, seat, user};
use crate::error::{AppError, AppResult};
use crate::inventory;
use crate::sweeper;
use crate::AppState;

const MAX_ROWS: u32 = 100;

// ============ Airports ============

#[derive(Debug, Deserialize)]
pub struct CreateAirportRequest {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// Create an airport (admin)
pub async fn create_airport(
    State(state): State<AppState>,
    Json(payload): Json<CreateAirportRequest>,
) -> AppResult<Json<airport::Model>> {
    let code = payload.code.trim().to_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(AppError::ValidationFailed(
            "Airport code must be three letters".to_string(),
        ));
    }

    let existing = airport::Entity::find()
        .filter(airport::Column::Code.eq(&code))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!("Airport {} already exists", code)));
    }

    let airport = airport::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        name: Set(payload.name),
        city: Set(payload.city),
        country: Set(payload.country),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(airport = %airport.code, "Airport created");
    Ok(Json(airport))
}

// ============ Flights ============

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub carrier_name: String,
    pub flight_code: String,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub stops: i32,
    pub base_fare: f64,
    pub travel_class: String,
    pub seat_layout: SeatLayout,
}

/// Seat map generated as `rows` × `letters`, numbered `1A`, `1B`, …
#[derive(Debug, Deserialize)]
pub struct SeatLayout {
    pub rows: u32,
    pub letters: String,
    /// Surcharges for row ranges, inclusive. Later ranges win on overlap.
    #[serde(default)]
    pub row_deltas: Vec<RowDelta>,
}

#[derive(Debug, Deserialize)]
pub struct RowDelta {
    pub from_row: u32,
    pub to_row: u32,
    pub price_delta: f64,
}

#[derive(Debug, Serialize)]
pub struct FlightCreatedResponse {
    pub flight: flight::Model,
    pub seat_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFareRequest {
    pub base_fare: f64,
}

/// Create a flight with its seat map (admin)
pub async fn create_flight(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlightRequest>,
) -> AppResult<Json<FlightCreatedResponse>> {
    if payload.origin_airport_id == payload.destination_airport_id {
        return Err(AppError::ValidationFailed(
            "Origin and destination must be different".to_string(),
        ));
    }
    if !TRAVEL_CLASSES.contains(&payload.travel_class.as_str()) {
        return Err(AppError::ValidationFailed(format!(
            "Travel class must be one of {}",
            TRAVEL_CLASSES.join(", ")
        )));
    }
    if payload.arrival_time <= payload.departure_time {
        return Err(AppError::ValidationFailed(
            "Arrival must be after departure".to_string(),
        ));
    }
    if payload.stops < 0 {
        return Err(AppError::ValidationFailed("Stops cannot be negative".to_string()));
    }
    validate_fare(payload.base_fare)?;
    let seats = seat_layout(&payload.seat_layout)?;

    for airport_id in [payload.origin_airport_id, payload.destination_airport_id] {
        airport::Entity::find_by_id(airport_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::ValidationFailed(format!("Unknown airport {}", airport_id)))?;
    }

    let flight_id = Uuid::new_v4();
    let duration_minutes = (payload.arrival_time - payload.departure_time).num_minutes();
    let duration_minutes = i32::try_from(duration_minutes)
        .map_err(|_| AppError::ValidationFailed("Flight duration is too long".to_string()))?;

    let txn = state.db.begin().await?;

    let flight = flight::ActiveModel {
        id: Set(flight_id),
        carrier_name: Set(payload.carrier_name),
        flight_code: Set(payload.flight_code.trim().to_uppercase()),
        origin_airport_id: Set(payload.origin_airport_id),
        destination_airport_id: Set(payload.destination_airport_id),
        departure_time: Set(payload.departure_time.into()),
        arrival_time: Set(payload.arrival_time.into()),
        duration_minutes: Set(duration_minutes),
        stops: Set(payload.stops),
        base_fare: Set(payload.base_fare),
        travel_class: Set(payload.travel_class.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let seat_count = seats.len();
    let rows = seats.into_iter().map(|(seat_number, price_delta)| seat::ActiveModel {
        id: Set(Uuid::new_v4()),
        flight_id: Set(flight_id),
        seat_number: Set(seat_number),
        travel_class: Set(payload.travel_class.clone()),
        price_delta: Set(price_delta),
        is_occupied: Set(false),
        held_by: Set(None),
    });
    seat::Entity::insert_many(rows).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(flight_id = %flight.id, flight_code = %flight.flight_code, seat_count, "Flight created");

    Ok(Json(FlightCreatedResponse { flight, seat_count }))
}

/// Overwrite a flight's base fare (admin)
pub async fn update_fare(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Json(payload): Json<UpdateFareRequest>,
) -> AppResult<Json<flight::Model>> {
    validate_fare(payload.base_fare)?;

    let existing = inventory::get_flight(&state.db, flight_id).await?;
    let previous = existing.base_fare;

    let mut active: flight::ActiveModel = existing.into();
    active.base_fare = Set(payload.base_fare);
    let flight = active.update(&state.db).await?;

    tracing::info!(flight_id = %flight.id, previous, base_fare = flight.base_fare, "Base fare updated");

    Ok(Json(flight))
}

// ============ Bookings ============

#[derive(Debug, Serialize)]
pub struct AdminBookingResponse {
    pub id: Uuid,
    pub code: String,
    pub status: BookingStatus,
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub traveller_count: i32,
    pub total_price: f64,
    pub holds_seats: bool,
    pub hold_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// List all bookings, newest first (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminBookingResponse>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let emails: HashMap<Uuid, String> = user::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.email))
        .collect();

    let responses = bookings
        .into_iter()
        .map(|b| AdminBookingResponse {
            id: b.id,
            code: b.code,
            status: b.status,
            flight_id: b.flight_id,
            user_id: b.user_id,
            user_email: emails.get(&b.user_id).cloned().unwrap_or_default(),
            traveller_count: b.traveller_count,
            total_price: b.total_price,
            holds_seats: b.status.holds_seats(),
            hold_expires_at: b.hold_expires_at.with_timezone(&Utc),
            created_at: b.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub cancelled: usize,
}

/// Release every lapsed hold now instead of waiting for the background sweep
pub async fn sweep_holds(State(state): State<AppState>) -> AppResult<Json<SweepResponse>> {
    let cancelled = sweeper::sweep_expired_holds(&state.reservations, Utc::now()).await?;
    Ok(Json(SweepResponse { cancelled }))
}

fn validate_fare(base_fare: f64) -> AppResult<()> {
    if !base_fare.is_finite() || base_fare <= 0.0 {
        return Err(AppError::ValidationFailed(
            "Base fare must be a positive amount".to_string(),
        ));
    }
    Ok(())
}

/// Expand a layout into `(seat_number, price_delta)` pairs, row by row.
fn seat_layout(layout: &SeatLayout) -> AppResult<Vec<(String, f64)>> {
    if layout.rows == 0 || layout.rows > MAX_ROWS {
        return Err(AppError::ValidationFailed(format!(
            "Rows must be between 1 and {}",
            MAX_ROWS
        )));
    }

    let letters: Vec<char> = layout.letters.trim().to_uppercase().chars().collect();
    let distinct: HashSet<char> = letters.iter().copied().collect();
    if letters.is_empty()
        || distinct.len() != letters.len()
        || !letters.iter().all(char::is_ascii_uppercase)
    {
        return Err(AppError::ValidationFailed(
            "Seat letters must be distinct letters".to_string(),
        ));
    }

    for delta in &layout.row_deltas {
        if delta.from_row == 0 || delta.from_row > delta.to_row || delta.to_row > layout.rows {
            return Err(AppError::ValidationFailed(format!(
                "Row range {}-{} is outside the layout",
                delta.from_row, delta.to_row
            )));
        }
        if !delta.price_delta.is_finite() || delta.price_delta < 0.0 {
            return Err(AppError::ValidationFailed(
                "Seat price delta must be a non-negative amount".to_string(),
            ));
        }
    }

    let mut seats = Vec::with_capacity(layout.rows as usize * letters.len());
    for row in 1..=layout.rows {
        let price_delta = layout
            .row_deltas
            .iter()
            .rev()
            .find(|d| (d.from_row..=d.to_row).contains(&row))
            .map_or(0.0, |d| d.price_delta);

        for letter in &letters {
            seats.push((format!("{}{}", row, letter), price_delta));
        }
    }

    Ok(seats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: u32, letters: &str, row_deltas: Vec<RowDelta>) -> SeatLayout {
        SeatLayout {
            rows,
            letters: letters.to_string(),
            row_deltas,
        }
    }

    #[test]
    fn test_seat_layout_numbers_rows_and_letters() {
        let seats = seat_layout(&layout(2, "abc", vec![])).unwrap();
        let numbers: Vec<&str> = seats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(numbers, ["1A", "1B", "1C", "2A", "2B", "2C"]);
        assert!(seats.iter().all(|(_, d)| *d == 0.0));
    }

    #[test]
    fn test_seat_layout_applies_row_deltas_last_wins() {
        let deltas = vec![
            RowDelta { from_row: 1, to_row: 3, price_delta: 200.0 },
            RowDelta { from_row: 3, to_row: 3, price_delta: 500.0 },
        ];
        let seats = seat_layout(&layout(4, "A", deltas)).unwrap();
        let deltas: Vec<f64> = seats.iter().map(|(_, d)| *d).collect();
        assert_eq!(deltas, [200.0, 200.0, 500.0, 0.0]);
    }

    #[test]
    fn test_seat_layout_rejects_bad_input() {
        assert!(seat_layout(&layout(0, "AB", vec![])).is_err());
        assert!(seat_layout(&layout(3, "AA", vec![])).is_err());
        assert!(seat_layout(&layout(3, "A1", vec![])).is_err());
        let out_of_range = vec![RowDelta { from_row: 2, to_row: 9, price_delta: 10.0 }];
        assert!(seat_layout(&layout(3, "A", out_of_range)).is_err());
    }

    #[test]
    fn test_validate_fare() {
        assert!(validate_fare(1500.0).is_ok());
        assert!(validate_fare(0.0).is_err());
        assert!(validate_fare(f64::NAN).is_err());
    }
}
