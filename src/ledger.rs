//! Read side of the booking ledger. Bookings, travellers, seat links and
//! payments are written by the reservation coordinator only.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{booking_seat, flight, seat, traveller};
use crate::error::{AppError, AppResult};

pub async fn find_booking<C: ConnectionTrait>(conn: &C, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
}

/// Load a booking under a row lock so concurrent steps on the same booking
/// run one after another.
pub async fn lock_booking(txn: &DatabaseTransaction, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
}

pub async fn code_exists<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<bool> {
    let count = booking::Entity::find()
        .filter(booking::Column::Code.eq(code))
        .count(conn)
        .await?;

    Ok(count > 0)
}

pub async fn linked_seat_ids<C: ConnectionTrait>(conn: &C, booking_id: Uuid) -> AppResult<Vec<Uuid>> {
    let links = booking_seat::Entity::find()
        .filter(booking_seat::Column::BookingId.eq(booking_id))
        .all(conn)
        .await?;

    Ok(links.into_iter().map(|l| l.seat_id).collect())
}

/// Pending bookings whose hold ran out before `now`.
pub async fn expired_holds<C: ConnectionTrait>(conn: &C, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
    let expired = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .filter(booking::Column::HoldExpiresAt.lt(DateTime::<FixedOffset>::from(now)))
        .order_by_asc(booking::Column::HoldExpiresAt)
        .all(conn)
        .await?;

    Ok(expired.into_iter().map(|b| b.id).collect())
}

#[derive(Debug, Serialize)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub code: String,
    pub flight_id: Uuid,
    pub flight_code: Option<String>,
    pub status: BookingStatus,
    pub travel_class: String,
    pub traveller_count: i32,
    pub total_price: f64,
    pub hold_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub travellers: Vec<TravellerSummary>,
    pub seats: Vec<SeatSummary>,
}

#[derive(Debug, Serialize)]
pub struct TravellerSummary {
    pub traveller_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub seat_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeatSummary {
    pub seat_number: String,
    pub travel_class: String,
    /// Price captured when the seat was linked.
    pub price: f64,
}

/// A user's bookings, newest first, with travellers and linked seats.
pub async fn history<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<BookingSummary>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(conn)
        .await?;

    if bookings.is_empty() {
        return Ok(Vec::new());
    }

    let booking_ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    let flight_ids: Vec<Uuid> = bookings.iter().map(|b| b.flight_id).collect();

    let travellers = traveller::Entity::find()
        .filter(traveller::Column::BookingId.is_in(booking_ids.clone()))
        .all(conn)
        .await?;
    let links = booking_seat::Entity::find()
        .filter(booking_seat::Column::BookingId.is_in(booking_ids))
        .all(conn)
        .await?;
    let seats: HashMap<Uuid, seat::Model> = seat::Entity::find()
        .filter(seat::Column::Id.is_in(links.iter().map(|l| l.seat_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let flights: HashMap<Uuid, flight::Model> = flight::Entity::find()
        .filter(flight::Column::Id.is_in(flight_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    let summaries = bookings
        .into_iter()
        .map(|b| {
            let booking_links: Vec<&booking_seat::Model> =
                links.iter().filter(|l| l.booking_id == b.id).collect();

            let passengers = travellers
                .iter()
                .filter(|t| t.booking_id == b.id)
                .map(|t| TravellerSummary {
                    traveller_id: t.id,
                    first_name: t.first_name.clone(),
                    last_name: t.last_name.clone(),
                    email: t.email.clone(),
                    phone: t.phone.clone(),
                    seat_number: booking_links
                        .iter()
                        .find(|l| l.traveller_id == t.id)
                        .and_then(|l| seats.get(&l.seat_id))
                        .map(|s| s.seat_number.clone()),
                })
                .collect();

            let seat_lines = booking_links
                .iter()
                .filter_map(|l| {
                    seats.get(&l.seat_id).map(|s| SeatSummary {
                        seat_number: s.seat_number.clone(),
                        travel_class: s.travel_class.clone(),
                        price: l.seat_price,
                    })
                })
                .collect();

            BookingSummary {
                booking_id: b.id,
                code: b.code,
                flight_id: b.flight_id,
                flight_code: flights.get(&b.flight_id).map(|f| f.flight_code.clone()),
                status: b.status,
                travel_class: b.travel_class,
                traveller_count: b.traveller_count,
                total_price: b.total_price,
                hold_expires_at: b.hold_expires_at.with_timezone(&Utc),
                created_at: b.created_at.with_timezone(&Utc),
                travellers: passengers,
                seats: seat_lines,
            }
        })
        .collect();

    Ok(summaries)
}
