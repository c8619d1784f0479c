//! Reservation coordinator.
//!
//! A booking moves through three steps: a seat hold that creates it in
//! `PENDING`, passenger attachment, and payment settlement. Each step runs in
//! its own transaction, so it either fully applies or leaves no trace. The
//! hold step is the only one that needs cross-booking mutual exclusion; it
//! gets it from row locks on the requested seats.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::HoldPolicy;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::entities::{booking_seat, flight, traveller, user};
use crate::error::{AppError, AppResult};
use crate::inventory;
use crate::ledger::{self, BookingSummary};
use crate::pricing::{self, round_to, PriceBreakdown};
use crate::utils::codes;

pub const PAYMENT_METHOD: &str = "SIMULATED";

/// Tries per step when a freshly issued code hits the unique index.
const COLLISION_ATTEMPTS: u32 = 2;

struct PendingHold<'a> {
    booking_id: Uuid,
    user_id: Uuid,
    flight: &'a flight::Model,
    seat_ids: &'a [Uuid],
    traveller_count: i32,
    total_price: f64,
    created_at: DateTime<Utc>,
    hold_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoldRequest {
    pub flight_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub hold_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HoldReceipt {
    pub booking_id: Uuid,
    pub temp_code: String,
    pub flight_id: Uuid,
    pub reserved_seat_ids: Vec<Uuid>,
    pub fare_per_passenger: f64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub hold_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TravellerDetails {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub government_id_type: Option<String>,
    pub government_id_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl TravellerDetails {
    fn validate(&self) -> AppResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::ValidationFailed(
                "Traveller first and last name are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PassengersAttached {
    pub booking_id: Uuid,
    pub travellers_created: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDisposition {
    Confirmed,
    Failed,
    AlreadyConfirmed,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub booking_id: Uuid,
    pub status: PaymentDisposition,
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CancelReceipt {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub seats_released: u64,
}

#[derive(Clone)]
pub struct ReservationCoordinator {
    db: DatabaseConnection,
    hold: HoldPolicy,
}

impl ReservationCoordinator {
    pub fn new(db: DatabaseConnection, hold: HoldPolicy) -> Self {
        Self { db, hold }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Hold seats for a user and open a `PENDING` booking.
    pub async fn initiate(&self, user_id: Uuid, request: HoldRequest) -> AppResult<HoldReceipt> {
        let now = Utc::now();
        let hold_minutes = self.hold_minutes(request.hold_minutes)?;
        let seat_ids = dedup_seat_ids(&request.seat_ids);
        if seat_ids.is_empty() {
            return Err(AppError::ValidationFailed(
                "At least one seat must be selected".to_string(),
            ));
        }
        let traveller_count = i32::try_from(seat_ids.len())
            .map_err(|_| AppError::ValidationFailed("Too many seats requested".to_string()))?;

        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let flight = inventory::get_flight(&self.db, request.flight_id).await?;
        let seats = inventory::get_seats(&self.db, &seat_ids).await?;
        if let Some(stray) = seats.iter().find(|s| s.flight_id != flight.id) {
            return Err(AppError::ValidationFailed(format!(
                "Seat {} does not belong to flight {}",
                stray.id, flight.flight_code
            )));
        }

        if !flight.base_fare.is_finite() || flight.base_fare < 0.0 {
            return Err(AppError::ValidationFailed(format!(
                "Flight {} has no valid base fare",
                flight.flight_code
            )));
        }

        // Priced on the unlocked snapshot; the charge can drift slightly from a quote shown earlier
        let fare_per_passenger = match quote(&self.db, &flight, now).await {
            Ok(breakdown) => breakdown.display_price,
            Err(e) => {
                tracing::warn!(flight_id = %flight.id, error = %e, "Dynamic pricing failed, charging base fare");
                flight.base_fare
            }
        };
        let seat_addons: f64 = seats.iter().map(|s| s.price_delta).sum();
        let total_price = round_to(fare_per_passenger * seat_ids.len() as f64 + seat_addons, 2);

        let pending = PendingHold {
            booking_id: Uuid::new_v4(),
            user_id,
            flight: &flight,
            seat_ids: &seat_ids,
            traveller_count,
            total_price,
            created_at: now,
            hold_expires_at: now + Duration::minutes(hold_minutes),
        };
        let temp_code = retry_on_collision("hold", || self.hold_seats(&pending)).await?;

        tracing::info!(
            booking_id = %pending.booking_id,
            flight_id = %flight.id,
            seat_count = seat_ids.len(),
            total_price,
            "Seats held"
        );

        Ok(HoldReceipt {
            booking_id: pending.booking_id,
            temp_code,
            flight_id: flight.id,
            reserved_seat_ids: seat_ids.clone(),
            fare_per_passenger,
            total_price,
            status: BookingStatus::Pending,
            hold_expires_at: pending.hold_expires_at,
        })
    }

    /// Lock the seats, recheck them, and write the `PENDING` booking in one
    /// transaction. Returns the temporary code.
    async fn hold_seats(&self, pending: &PendingHold<'_>) -> AppResult<String> {
        let txn = self.db.begin().await?;

        let locked = inventory::lock_seats(&txn, pending.seat_ids).await?;
        if let Some(taken) = locked.iter().find(|s| s.is_occupied) {
            txn.rollback().await?;
            tracing::warn!(
                flight_id = %pending.flight.id,
                seat_number = %taken.seat_number,
                "Hold rejected, seat already reserved"
            );
            return Err(AppError::Conflict(format!(
                "Seat {} is already reserved",
                taken.seat_number
            )));
        }

        let temp_code = issue_unique_code(
            &txn,
            codes::temporary_code,
            codes::fallback_temporary_code(pending.booking_id),
        )
        .await?;

        inventory::occupy_seats(&txn, pending.seat_ids, pending.booking_id).await?;

        booking::ActiveModel {
            id: Set(pending.booking_id),
            user_id: Set(pending.user_id),
            flight_id: Set(pending.flight.id),
            traveller_count: Set(pending.traveller_count),
            travel_class: Set(pending.flight.travel_class.clone()),
            total_price: Set(pending.total_price),
            code: Set(temp_code.clone()),
            status: Set(BookingStatus::Pending),
            hold_expires_at: Set(pending.hold_expires_at.into()),
            created_at: Set(pending.created_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(integrity_or_database)?;

        txn.commit().await.map_err(integrity_or_database)?;

        Ok(temp_code)
    }

    /// Attach one traveller per held seat.
    pub async fn add_passengers(
        &self,
        booking_id: Uuid,
        travellers: Vec<TravellerDetails>,
    ) -> AppResult<PassengersAttached> {
        let booking = ledger::find_booking(&self.db, booking_id).await?;
        ensure_pending(&booking)?;
        if travellers.len() != booking.traveller_count as usize {
            return Err(AppError::ValidationFailed(format!(
                "Number of travellers must match reserved seats: expected {}, got {}",
                booking.traveller_count,
                travellers.len()
            )));
        }
        for details in &travellers {
            details.validate()?;
        }

        let txn = self.db.begin().await?;
        let booking = ledger::lock_booking(&txn, booking_id).await?;
        ensure_pending(&booking)?;

        let linked: HashSet<Uuid> = ledger::linked_seat_ids(&txn, booking_id)
            .await?
            .into_iter()
            .collect();
        let assignable: Vec<_> = inventory::seats_held_by(&txn, booking_id)
            .await?
            .into_iter()
            .filter(|s| !linked.contains(&s.id))
            .collect();

        if assignable.len() < travellers.len() {
            return Err(AppError::ValidationFailed(
                "Not enough reserved seats available to attach travellers".to_string(),
            ));
        }

        let mut created = 0;
        for (details, seat) in travellers.into_iter().zip(assignable) {
            let traveller_id = Uuid::new_v4();
            traveller::ActiveModel {
                id: Set(traveller_id),
                booking_id: Set(booking_id),
                first_name: Set(details.first_name),
                middle_name: Set(details.middle_name),
                last_name: Set(details.last_name),
                date_of_birth: Set(details.date_of_birth),
                government_id_type: Set(details.government_id_type),
                government_id_number: Set(details.government_id_number),
                email: Set(details.email),
                phone: Set(details.phone),
            }
            .insert(&txn)
            .await?;

            booking_seat::ActiveModel {
                id: Set(Uuid::new_v4()),
                booking_id: Set(booking_id),
                traveller_id: Set(traveller_id),
                seat_id: Set(seat.id),
                seat_price: Set(seat.price_delta),
            }
            .insert(&txn)
            .await?;

            created += 1;
        }

        txn.commit().await?;

        tracing::info!(booking_id = %booking_id, travellers = created, "Passengers attached");

        Ok(PassengersAttached {
            booking_id,
            travellers_created: created,
        })
    }

    /// Record a simulated payment and settle the booking.
    pub async fn pay(&self, booking_id: Uuid, simulate_success: bool) -> AppResult<PaymentReceipt> {
        let receipt =
            retry_on_collision("payment", || self.settle_payment(booking_id, simulate_success))
                .await?;

        tracing::info!(booking_id = %booking_id, status = ?receipt.status, "Payment settled");

        Ok(receipt)
    }

    async fn settle_payment(
        &self,
        booking_id: Uuid,
        simulate_success: bool,
    ) -> AppResult<PaymentReceipt> {
        let now = Utc::now();
        let txn = self.db.begin().await?;
        let booking = ledger::lock_booking(&txn, booking_id).await?;

        match booking.status {
            BookingStatus::Confirmed => {
                txn.rollback().await?;
                return Ok(PaymentReceipt {
                    booking_id,
                    status: PaymentDisposition::AlreadyConfirmed,
                    code: Some(booking.code),
                    message: "Booking already confirmed".to_string(),
                });
            }
            BookingStatus::Failed | BookingStatus::Cancelled => {
                txn.rollback().await?;
                return Err(AppError::ValidationFailed(format!(
                    "Booking is {} and cannot be paid",
                    booking.status.as_str()
                )));
            }
            BookingStatus::Pending => {}
        }

        payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            method: Set(PAYMENT_METHOD.to_string()),
            amount: Set(booking.total_price),
            status: Set(if simulate_success {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            }),
            paid_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut active: booking::ActiveModel = booking.into();
        let receipt = if simulate_success {
            let code = issue_unique_code(
                &txn,
                codes::confirmation_code,
                codes::fallback_confirmation_code(booking_id),
            )
            .await?;
            active.code = Set(code.clone());
            active.status = Set(BookingStatus::Confirmed);

            PaymentReceipt {
                booking_id,
                status: PaymentDisposition::Confirmed,
                code: Some(code),
                message: "Payment processed".to_string(),
            }
        } else {
            let released = inventory::release_held_seats(&txn, booking_id).await?;
            active.status = Set(BookingStatus::Failed);

            PaymentReceipt {
                booking_id,
                status: PaymentDisposition::Failed,
                code: None,
                message: format!("Payment failed, {} seat(s) released", released),
            }
        };

        active.update(&txn).await.map_err(integrity_or_database)?;
        txn.commit().await.map_err(integrity_or_database)?;

        Ok(receipt)
    }

    /// Cancel a pending or confirmed booking and release its seats.
    pub async fn cancel(&self, booking_id: Uuid) -> AppResult<CancelReceipt> {
        let txn = self.db.begin().await?;
        let booking = ledger::lock_booking(&txn, booking_id).await?;

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            txn.rollback().await?;
            return Err(AppError::ValidationFailed(format!(
                "Only confirmed or pending bookings can be cancelled, booking is {}",
                booking.status.as_str()
            )));
        }

        let seats_released = inventory::release_held_seats(&txn, booking_id).await?;

        let mut active: booking::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Cancelled);
        active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(booking_id = %booking_id, seats_released, "Booking cancelled");

        Ok(CancelReceipt {
            booking_id,
            status: BookingStatus::Cancelled,
            seats_released,
        })
    }

    pub async fn history_for_user(&self, user_id: Uuid) -> AppResult<Vec<BookingSummary>> {
        ledger::history(&self.db, user_id).await
    }

    pub async fn price_quote(&self, flight_id: Uuid) -> AppResult<PriceBreakdown> {
        let flight = inventory::get_flight(&self.db, flight_id).await?;
        quote(&self.db, &flight, Utc::now()).await
    }

    fn hold_minutes(&self, requested: Option<i64>) -> AppResult<i64> {
        let minutes = requested.unwrap_or(self.hold.default_minutes);
        if minutes < 1 || minutes > self.hold.max_minutes {
            return Err(AppError::ValidationFailed(format!(
                "Hold must last between 1 and {} minutes",
                self.hold.max_minutes
            )));
        }
        Ok(minutes)
    }
}

/// Price a flight from the current seat and demand snapshot.
pub async fn quote<C: ConnectionTrait>(
    conn: &C,
    flight: &flight::Model,
    now: DateTime<Utc>,
) -> AppResult<PriceBreakdown> {
    let occupancy = inventory::occupancy(conn, flight.id).await?;
    let demand = inventory::demand(conn, flight.id).await?;

    Ok(pricing::price(
        &inventory::flight_snapshot(flight),
        &occupancy,
        &demand,
        now,
    )?)
}

/// Draw codes until one is unused, giving up after a bounded number of
/// attempts and returning `fallback` instead.
pub async fn issue_unique_code<C, F>(conn: &C, mut candidate: F, fallback: String) -> AppResult<String>
where
    C: ConnectionTrait,
    F: FnMut() -> String + Send,
{
    for attempt in 1..=codes::MAX_CODE_ATTEMPTS {
        let code = candidate();
        if !ledger::code_exists(conn, &code).await? {
            return Ok(code);
        }
        tracing::debug!(attempt, "Generated code already in use");
    }

    tracing::warn!(fallback = %fallback, "Code attempts exhausted, using fallback");
    Ok(fallback)
}

/// Run a code-issuing step again when its code lost a race to a concurrent
/// writer. The failed attempt rolled back, so the rerun starts clean.
async fn retry_on_collision<T, F, Fut>(step: &str, mut attempt_step: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match attempt_step().await {
            Err(AppError::Integrity(detail)) if attempt < COLLISION_ATTEMPTS => {
                tracing::warn!(step, attempt, detail = %detail, "Code collided at write, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn ensure_pending(booking: &booking::Model) -> AppResult<()> {
    if booking.status != BookingStatus::Pending {
        return Err(AppError::ValidationFailed(format!(
            "Booking is {}, passengers can only be added while pending",
            booking.status.as_str()
        )));
    }
    Ok(())
}

fn dedup_seat_ids(seat_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    seat_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn integrity_or_database(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Integrity(detail),
        _ => AppError::Database(err),
    }
}
