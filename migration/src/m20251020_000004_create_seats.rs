use sea_orm_migration::{prelude::*, schema::*};

use super::m20251020_000003_create_flights::Flight;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Seat::Table)
                    .if_not_exists()
                    .col(uuid(Seat::Id).primary_key())
                    .col(uuid(Seat::FlightId).not_null())
                    .col(string_len(Seat::SeatNumber, 8).not_null())
                    .col(string_len(Seat::TravelClass, 16).not_null())
                    .col(double(Seat::PriceDelta).not_null().default(0.0))
                    .col(boolean(Seat::IsOccupied).not_null().default(false))
                    .col(uuid_null(Seat::HeldBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seat_flight")
                            .from(Seat::Table, Seat::FlightId)
                            .to(Flight::Table, Flight::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seat_flight_number")
                    .table(Seat::Table)
                    .col(Seat::FlightId)
                    .col(Seat::SeatNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Seat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Seat {
    Table,
    Id,
    FlightId,
    SeatNumber,
    TravelClass,
    PriceDelta,
    IsOccupied,
    HeldBy,
}
