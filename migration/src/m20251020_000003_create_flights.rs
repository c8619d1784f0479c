use sea_orm_migration::{prelude::*, schema::*};

use super::m20251020_000001_create_airports::Airport;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flight::Table)
                    .if_not_exists()
                    .col(uuid(Flight::Id).primary_key())
                    .col(string_len(Flight::CarrierName, 60).not_null())
                    .col(string_len(Flight::FlightCode, 10).not_null())
                    .col(uuid(Flight::OriginAirportId).not_null())
                    .col(uuid(Flight::DestinationAirportId).not_null())
                    .col(timestamp_with_time_zone(Flight::DepartureTime).not_null())
                    .col(timestamp_with_time_zone(Flight::ArrivalTime).not_null())
                    .col(integer(Flight::DurationMinutes).not_null())
                    .col(integer(Flight::Stops).not_null().default(0))
                    .col(double(Flight::BaseFare).not_null())
                    .col(string_len(Flight::TravelClass, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Flight::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(Flight::OriginAirportId)
                            .ne(Expr::col(Flight::DestinationAirportId)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flight_origin_airport")
                            .from(Flight::Table, Flight::OriginAirportId)
                            .to(Airport::Table, Airport::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flight_destination_airport")
                            .from(Flight::Table, Flight::DestinationAirportId)
                            .to(Airport::Table, Airport::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flight::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Flight {
    Table,
    Id,
    CarrierName,
    FlightCode,
    OriginAirportId,
    DestinationAirportId,
    DepartureTime,
    ArrivalTime,
    DurationMinutes,
    Stops,
    BaseFare,
    TravelClass,
    CreatedAt,
}
