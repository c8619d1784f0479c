//! Flight and seat storage.
//!
//! Every function takes any sea-orm connection, so the same reads run on the
//! pool or inside a transaction. Seat occupancy is only ever written here, and
//! only through a transaction opened by the reservation coordinator.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{booking_seat, flight, seat};
use crate::error::{AppError, AppResult};
use crate::pricing::{DemandSnapshot, FlightSnapshot, SeatOccupancy};

pub async fn get_flight<C: ConnectionTrait>(conn: &C, flight_id: Uuid) -> AppResult<flight::Model> {
    flight::Entity::find_by_id(flight_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))
}

/// Fetch exactly the requested seats, failing if any id is unknown.
pub async fn get_seats<C: ConnectionTrait>(conn: &C, seat_ids: &[Uuid]) -> AppResult<Vec<seat::Model>> {
    let seats = seat::Entity::find()
        .filter(seat::Column::Id.is_in(seat_ids.iter().copied()))
        .order_by_asc(seat::Column::Id)
        .all(conn)
        .await?;

    ensure_complete(&seats, seat_ids)?;
    Ok(seats)
}

/// Re-read seats under `SELECT ... FOR UPDATE`.
///
/// Rows are locked in id order so two holds over overlapping seat sets queue
/// behind each other instead of deadlocking. The rows returned reflect any
/// commit that happened while waiting for the lock.
pub async fn lock_seats(txn: &DatabaseTransaction, seat_ids: &[Uuid]) -> AppResult<Vec<seat::Model>> {
    let seats = seat::Entity::find()
        .filter(seat::Column::Id.is_in(seat_ids.iter().copied()))
        .order_by_asc(seat::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;

    ensure_complete(&seats, seat_ids)?;
    Ok(seats)
}

fn ensure_complete(seats: &[seat::Model], seat_ids: &[Uuid]) -> AppResult<()> {
    let found: HashSet<Uuid> = seats.iter().map(|s| s.id).collect();
    let missing: Vec<String> = seat_ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Seats not found: {}", missing.join(", "))))
    }
}

pub async fn occupy_seats(
    txn: &DatabaseTransaction,
    seat_ids: &[Uuid],
    booking_id: Uuid,
) -> AppResult<u64> {
    let result = seat::Entity::update_many()
        .col_expr(seat::Column::IsOccupied, Expr::value(true))
        .col_expr(seat::Column::HeldBy, Expr::value(Some(booking_id)))
        .filter(seat::Column::Id.is_in(seat_ids.iter().copied()))
        .exec(txn)
        .await?;

    Ok(result.rows_affected)
}

/// Free every seat the booking holds. Seats since taken over by another
/// booking are left alone.
pub async fn release_held_seats<C: ConnectionTrait>(conn: &C, booking_id: Uuid) -> AppResult<u64> {
    let result = seat::Entity::update_many()
        .col_expr(seat::Column::IsOccupied, Expr::value(false))
        .col_expr(seat::Column::HeldBy, Expr::value(Option::<Uuid>::None))
        .filter(seat::Column::HeldBy.eq(booking_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Seats held by a booking, in seat-number order.
pub async fn seats_held_by<C: ConnectionTrait>(conn: &C, booking_id: Uuid) -> AppResult<Vec<seat::Model>> {
    Ok(seat::Entity::find()
        .filter(seat::Column::HeldBy.eq(booking_id))
        .filter(seat::Column::IsOccupied.eq(true))
        .order_by_asc(seat::Column::SeatNumber)
        .all(conn)
        .await?)
}

pub async fn seat_map<C: ConnectionTrait>(conn: &C, flight_id: Uuid) -> AppResult<Vec<seat::Model>> {
    Ok(seat::Entity::find()
        .filter(seat::Column::FlightId.eq(flight_id))
        .order_by_asc(seat::Column::SeatNumber)
        .all(conn)
        .await?)
}

pub fn flight_snapshot(flight: &flight::Model) -> FlightSnapshot {
    FlightSnapshot {
        flight_id: flight.id,
        base_fare: flight.base_fare,
        departure_time: flight.departure_time.with_timezone(&Utc),
        travel_class: flight.travel_class.clone(),
    }
}

pub async fn occupancy<C: ConnectionTrait>(conn: &C, flight_id: Uuid) -> AppResult<SeatOccupancy> {
    let total_seats = seat::Entity::find()
        .filter(seat::Column::FlightId.eq(flight_id))
        .count(conn)
        .await?;

    let flagged_seats = seat::Entity::find()
        .filter(seat::Column::FlightId.eq(flight_id))
        .filter(seat::Column::IsOccupied.eq(true))
        .count(conn)
        .await?;

    // Links of failed or cancelled bookings stay as history, not occupancy
    let linked_seats = booking_seat::Entity::find()
        .inner_join(booking::Entity)
        .filter(booking::Column::FlightId.eq(flight_id))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .count(conn)
        .await?;

    Ok(SeatOccupancy {
        total_seats,
        linked_seats,
        flagged_seats,
    })
}

pub async fn demand<C: ConnectionTrait>(conn: &C, flight_id: Uuid) -> AppResult<DemandSnapshot> {
    let completed_bookings = booking::Entity::find()
        .filter(booking::Column::FlightId.eq(flight_id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .count(conn)
        .await?;

    Ok(DemandSnapshot { completed_bookings })
}
