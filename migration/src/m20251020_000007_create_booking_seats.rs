use sea_orm_migration::{prelude::*, schema::*};

use super::m20251020_000004_create_seats::Seat;
use super::m20251020_000005_create_bookings::Booking;
use super::m20251020_000006_create_travellers::Traveller;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingSeat::Table)
                    .if_not_exists()
                    .col(uuid(BookingSeat::Id).primary_key())
                    .col(uuid(BookingSeat::BookingId).not_null())
                    .col(uuid(BookingSeat::TravellerId).not_null().unique_key())
                    .col(uuid(BookingSeat::SeatId).not_null())
                    .col(double(BookingSeat::SeatPrice).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_seat_booking")
                            .from(BookingSeat::Table, BookingSeat::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_seat_traveller")
                            .from(BookingSeat::Table, BookingSeat::TravellerId)
                            .to(Traveller::Table, Traveller::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_seat_seat")
                            .from(BookingSeat::Table, BookingSeat::SeatId)
                            .to(Seat::Table, Seat::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One seat per booking, but the same seat may appear in later bookings
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_seat_booking_seat")
                    .table(BookingSeat::Table)
                    .col(BookingSeat::BookingId)
                    .col(BookingSeat::SeatId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingSeat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingSeat {
    Table,
    Id,
    BookingId,
    TravellerId,
    SeatId,
    SeatPrice,
}
