use sea_orm_migration::{prelude::*, schema::*};

use super::m20251020_000005_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Traveller::Table)
                    .if_not_exists()
                    .col(uuid(Traveller::Id).primary_key())
                    .col(uuid(Traveller::BookingId).not_null())
                    .col(string_len(Traveller::FirstName, 100).not_null())
                    .col(string_len_null(Traveller::MiddleName, 100))
                    .col(string_len(Traveller::LastName, 100).not_null())
                    .col(date_null(Traveller::DateOfBirth))
                    .col(string_len_null(Traveller::GovernmentIdType, 40))
                    .col(string_len_null(Traveller::GovernmentIdNumber, 60))
                    .col(string_len_null(Traveller::Email, 255))
                    .col(string_len_null(Traveller::Phone, 32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_traveller_booking")
                            .from(Traveller::Table, Traveller::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Traveller::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Traveller {
    Table,
    Id,
    BookingId,
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    GovernmentIdType,
    GovernmentIdNumber,
    Email,
    Phone,
}
