use std::cmp::Ordering;
use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{airport, flight};
use crate::error::{AppError, AppResult};
use crate::inventory;
use crate::pricing::PriceBreakdown;
use crate::reservation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FlightSearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Departure date, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// `price` or `duration`.
    pub sort_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey {
    Price,
    Duration,
}

#[derive(Debug, Serialize)]
pub struct AirportInfo {
    pub id: Uuid,
    pub code: String,
    pub city: String,
}

impl From<&airport::Model> for AirportInfo {
    fn from(a: &airport::Model) -> Self {
        Self {
            id: a.id,
            code: a.code.clone(),
            city: a.city.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlightResponse {
    pub id: Uuid,
    pub carrier_name: String,
    pub flight_code: String,
    pub origin: AirportInfo,
    pub destination: AirportInfo,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub stops: i32,
    pub base_fare: f64,
    pub travel_class: String,
    pub dynamic_price: f64,
    pub available_seats: u64,
}

#[derive(Debug, Serialize)]
pub struct FlightDetailResponse {
    #[serde(flatten)]
    pub flight: FlightResponse,
    pub pricing: Option<PriceBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub id: Uuid,
    pub seat_number: String,
    pub travel_class: String,
    pub price_delta: f64,
    pub is_occupied: bool,
}

/// Search upcoming flights, each priced at the current dynamic fare
pub async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightSearchQuery>,
) -> AppResult<Json<Vec<FlightResponse>>> {
    let date = query
        .date
        .as_deref()
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                AppError::ValidationFailed("Date must be in YYYY-MM-DD format".to_string())
            })
        })
        .transpose()?;
    let sort_key = match query.sort_by.as_deref() {
        None => None,
        Some("price") => Some(SortKey::Price),
        Some("duration") => Some(SortKey::Duration),
        Some(_) => {
            return Err(AppError::ValidationFailed(
                "sort_by must be 'price' or 'duration'".to_string(),
            ))
        }
    };

    let now = Utc::now();
    let airports = airports_by_id(&state).await?;
    let flights = flight::Entity::find()
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    let mut responses = Vec::new();
    for f in flights {
        // Skip departed flights
        if f.departure_time.with_timezone(&Utc) < now {
            continue;
        }
        if let Some(date) = date {
            if f.departure_time.date_naive() != date {
                continue;
            }
        }

        let (Some(origin), Some(dest)) = (
            airports.get(&f.origin_airport_id),
            airports.get(&f.destination_airport_id),
        ) else {
            continue;
        };
        if !airport_matches(origin, query.origin.as_deref())
            || !airport_matches(dest, query.destination.as_deref())
        {
            continue;
        }

        let (response, _) = priced(&state, f, origin, dest, now).await?;
        responses.push(response);
    }

    match sort_key {
        Some(SortKey::Price) => responses.sort_by(|a, b| {
            a.dynamic_price
                .partial_cmp(&b.dynamic_price)
                .unwrap_or(Ordering::Equal)
        }),
        Some(SortKey::Duration) => responses.sort_by_key(|r| r.duration_minutes),
        None => {}
    }

    Ok(Json(responses))
}

/// Get flight details with the full price breakdown
pub async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<FlightDetailResponse>> {
    let f = inventory::get_flight(&state.db, flight_id).await?;
    let airports = airports_by_id(&state).await?;
    let origin = airports
        .get(&f.origin_airport_id)
        .ok_or_else(|| AppError::Internal("Origin airport not found".to_string()))?;
    let dest = airports
        .get(&f.destination_airport_id)
        .ok_or_else(|| AppError::Internal("Destination airport not found".to_string()))?;

    let (flight, pricing) = priced(&state, f, origin, dest, Utc::now()).await?;

    Ok(Json(FlightDetailResponse { flight, pricing }))
}

pub async fn flight_price(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<PriceBreakdown>> {
    Ok(Json(state.reservations.price_quote(flight_id).await?))
}

pub async fn flight_seats(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<Vec<SeatResponse>>> {
    inventory::get_flight(&state.db, flight_id).await?;
    let seats = inventory::seat_map(&state.db, flight_id).await?;

    Ok(Json(
        seats
            .into_iter()
            .map(|s| SeatResponse {
                id: s.id,
                seat_number: s.seat_number,
                travel_class: s.travel_class,
                price_delta: s.price_delta,
                is_occupied: s.is_occupied,
            })
            .collect(),
    ))
}

pub async fn list_airports(State(state): State<AppState>) -> AppResult<Json<Vec<airport::Model>>> {
    let airports = airport::Entity::find()
        .order_by_asc(airport::Column::Code)
        .all(&state.db)
        .await?;

    Ok(Json(airports))
}

async fn airports_by_id(state: &AppState) -> AppResult<HashMap<Uuid, airport::Model>> {
    Ok(airport::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect())
}

/// Case-insensitive substring match against the city or IATA code.
fn airport_matches(airport: &airport::Model, needle: Option<&str>) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    airport.city.to_lowercase().contains(&needle) || airport.code.to_lowercase().contains(&needle)
}

/// Attach the dynamic price to a flight. A pricing failure degrades to the
/// base fare.
async fn priced(
    state: &AppState,
    f: flight::Model,
    origin: &airport::Model,
    dest: &airport::Model,
    now: DateTime<Utc>,
) -> AppResult<(FlightResponse, Option<PriceBreakdown>)> {
    let breakdown = match reservation::quote(&state.db, &f, now).await {
        Ok(breakdown) => Some(breakdown),
        Err(AppError::Pricing(e)) => {
            tracing::warn!(flight_id = %f.id, error = %e, "Dynamic pricing failed, showing base fare");
            None
        }
        Err(e) => return Err(e),
    };
    let available_seats = match &breakdown {
        Some(b) => b.available_seats,
        None => inventory::occupancy(&state.db, f.id).await?.available(),
    };

    let response = FlightResponse {
        id: f.id,
        carrier_name: f.carrier_name,
        flight_code: f.flight_code,
        origin: origin.into(),
        destination: dest.into(),
        departure_time: f.departure_time.with_timezone(&Utc),
        arrival_time: f.arrival_time.with_timezone(&Utc),
        duration_minutes: f.duration_minutes,
        stops: f.stops,
        base_fare: f.base_fare,
        travel_class: f.travel_class,
        dynamic_price: breakdown.as_ref().map_or(f.base_fare, |b| b.display_price),
        available_seats,
    };

    Ok((response, breakdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chennai() -> airport::Model {
        airport::Model {
            id: Uuid::new_v4(),
            code: "MAA".to_string(),
            name: "Chennai International".to_string(),
            city: "Chennai".to_string(),
            country: "India".to_string(),
        }
    }

    #[test]
    fn test_airport_matches_city_or_code() {
        let a = chennai();
        assert!(airport_matches(&a, None));
        assert!(airport_matches(&a, Some("  ")));
        assert!(airport_matches(&a, Some("chen")));
        assert!(airport_matches(&a, Some("maa")));
        assert!(!airport_matches(&a, Some("Delhi")));
    }
}
