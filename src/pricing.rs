//! Demand-sensitive fare calculation.
//!
//! The engine is a pure function over explicit snapshots: it never touches
//! storage, so callers may run it outside any lock. The result carries every
//! factor and intermediate value so a quote can be audited after the fact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Price never drops below this share of the base fare.
pub const FLOOR_MULTIPLIER: f64 = 0.7;
/// Price never exceeds this multiple of the base fare.
pub const CAP_MULTIPLIER: f64 = 4.0;

/// Flight fields the engine reads.
#[derive(Debug, Clone)]
pub struct FlightSnapshot {
    pub flight_id: Uuid,
    pub base_fare: f64,
    pub departure_time: DateTime<Utc>,
    pub travel_class: String,
}

/// Seat counts for one flight.
///
/// Occupancy is observed through two independent signals that may drift
/// apart: seats linked to travellers of live bookings, and seats whose
/// occupied flag is set. The larger of the two is used so the engine never
/// undercounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatOccupancy {
    pub total_seats: u64,
    pub linked_seats: u64,
    pub flagged_seats: u64,
}

impl SeatOccupancy {
    pub fn occupied(&self) -> u64 {
        self.linked_seats.max(self.flagged_seats)
    }

    pub fn available(&self) -> u64 {
        self.total_seats.saturating_sub(self.occupied())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DemandSnapshot {
    /// Confirmed bookings on the flight.
    pub completed_bookings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub flight_id: Uuid,
    pub base_fare: f64,
    pub total_seats: u64,
    pub available_seats: u64,
    pub remaining_pct: f64,
    pub scarcity_multiplier: f64,
    pub hours_until_departure: f64,
    pub urgency_multiplier: f64,
    pub demand_count: u64,
    pub demand_ratio: f64,
    pub demand_multiplier: f64,
    pub travel_class: String,
    pub class_multiplier: f64,
    pub raw_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Clamped price at cent precision.
    pub final_price: f64,
    /// `final_price` rounded up to a whole currency unit; this is what is sold.
    pub display_price: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("base fare {0} is not a valid amount")]
    InvalidBaseFare(f64),
}

pub fn price(
    flight: &FlightSnapshot,
    seats: &SeatOccupancy,
    demand: &DemandSnapshot,
    now: DateTime<Utc>,
) -> Result<PriceBreakdown, PricingError> {
    let base_fare = flight.base_fare;
    if !base_fare.is_finite() || base_fare < 0.0 {
        return Err(PricingError::InvalidBaseFare(base_fare));
    }

    let available_seats = seats.available();
    let remaining_pct = if seats.total_seats == 0 {
        0.0
    } else {
        round_to(available_seats as f64 / seats.total_seats as f64, 4)
    };
    let scarcity_multiplier = if seats.total_seats == 0 {
        1.0
    } else {
        scarcity_factor(remaining_pct)
    };

    let seconds_left = (flight.departure_time - now).num_seconds() as f64;
    let hours_until_departure = (seconds_left / 3600.0).max(-1.0);
    let urgency_multiplier = urgency_factor(hours_until_departure);

    let demand_count = demand.completed_bookings;
    let demand_ratio = if seats.total_seats > 0 {
        demand_count as f64 / seats.total_seats as f64
    } else {
        demand_count as f64
    };
    let demand_multiplier = demand_factor(demand_ratio);

    let class_multiplier = class_factor(&flight.travel_class);

    let raw_price =
        base_fare * scarcity_multiplier * urgency_multiplier * demand_multiplier * class_multiplier;

    let min_price = round_to(base_fare * FLOOR_MULTIPLIER, 2);
    let max_price = round_to(base_fare * CAP_MULTIPLIER, 2);
    let final_price = round_to(raw_price, 2).clamp(min_price, max_price);

    Ok(PriceBreakdown {
        flight_id: flight.flight_id,
        base_fare: round_to(base_fare, 2),
        total_seats: seats.total_seats,
        available_seats,
        remaining_pct,
        scarcity_multiplier,
        hours_until_departure: round_to(hours_until_departure, 2),
        urgency_multiplier,
        demand_count,
        demand_ratio: round_to(demand_ratio, 4),
        demand_multiplier,
        travel_class: flight.travel_class.clone(),
        class_multiplier,
        raw_price: round_to(raw_price, 2),
        min_price,
        max_price,
        final_price,
        display_price: final_price.ceil(),
    })
}

fn scarcity_factor(remaining_pct: f64) -> f64 {
    if remaining_pct <= 0.05 {
        2.0
    } else if remaining_pct <= 0.20 {
        1.5
    } else if remaining_pct <= 0.50 {
        1.2
    } else {
        1.0
    }
}

fn urgency_factor(hours_until_departure: f64) -> f64 {
    // Departed flights keep their price
    if hours_until_departure < 0.0 {
        1.0
    } else if hours_until_departure < 6.0 {
        1.5
    } else if hours_until_departure < 24.0 {
        1.3
    } else if hours_until_departure < 72.0 {
        1.1
    } else {
        1.0
    }
}

fn demand_factor(demand_ratio: f64) -> f64 {
    if demand_ratio >= 0.5 {
        1.4
    } else if demand_ratio >= 0.3 {
        1.2
    } else if demand_ratio >= 0.1 {
        1.1
    } else {
        1.0
    }
}

fn class_factor(travel_class: &str) -> f64 {
    let label = travel_class.to_lowercase();
    if label.contains("business") {
        1.6
    } else if label.contains("first") {
        2.2
    } else {
        1.0
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
