use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::{self, BookingSummary};
use crate::reservation::{
    CancelReceipt, HoldReceipt, HoldRequest, PassengersAttached, PaymentReceipt, TravellerDetails,
};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddPassengersRequest {
    pub travellers: Vec<TravellerDetails>,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    #[serde(default = "default_simulate_success")]
    pub simulate_success: bool,
}

fn default_simulate_success() -> bool {
    true
}

/// Hold seats and open a pending booking
pub async fn initiate_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<HoldRequest>,
) -> AppResult<Json<HoldReceipt>> {
    Ok(Json(state.reservations.initiate(claims.sub, payload).await?))
}

pub async fn add_passengers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AddPassengersRequest>,
) -> AppResult<Json<PassengersAttached>> {
    ensure_owner(&state, &claims, booking_id).await?;
    Ok(Json(
        state
            .reservations
            .add_passengers(booking_id, payload.travellers)
            .await?,
    ))
}

pub async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<PayRequest>,
) -> AppResult<Json<PaymentReceipt>> {
    ensure_owner(&state, &claims, booking_id).await?;
    Ok(Json(
        state
            .reservations
            .pay(booking_id, payload.simulate_success)
            .await?,
    ))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<CancelReceipt>> {
    ensure_owner(&state, &claims, booking_id).await?;
    Ok(Json(state.reservations.cancel(booking_id).await?))
}

/// Get current user's bookings, newest first
pub async fn booking_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingSummary>>> {
    Ok(Json(state.reservations.history_for_user(claims.sub).await?))
}

/// Another customer's booking is reported as missing rather than forbidden.
async fn ensure_owner(state: &AppState, claims: &Claims, booking_id: Uuid) -> AppResult<()> {
    let booking = ledger::find_booking(&state.db, booking_id).await?;
    if booking.user_id != claims.sub {
        return Err(AppError::NotFound(format!("Booking {} not found", booking_id)));
    }
    Ok(())
}
