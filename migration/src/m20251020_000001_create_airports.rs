use sea_orm_migration::{prelude::*, schema::*};
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Airport::Table)
                    .if_not_exists()
                    .col(uuid(Airport::Id).primary_key())
                    .col(string_len(Airport::Code, 3).not_null().unique_key())
                    .col(string_len(Airport::Name, 100).not_null())
                    .col(string_len(Airport::City, 60).not_null())
                    .col(string_len(Airport::Country, 60).not_null())
                    .to_owned(),
            )
            .await?;

        // Seed the airports the sample network flies between
        let insert = Query::insert()
            .into_table(Airport::Table)
            .columns([Airport::Id, Airport::Code, Airport::Name, Airport::City, Airport::Country])
            .values_panic([Uuid::new_v4().into(), "MAA".into(), "Chennai International".into(), "Chennai".into(), "India".into()])
            .values_panic([Uuid::new_v4().into(), "DEL".into(), "Indira Gandhi International".into(), "Delhi".into(), "India".into()])
            .values_panic([Uuid::new_v4().into(), "BLR".into(), "Kempegowda International".into(), "Bengaluru".into(), "India".into()])
            .values_panic([Uuid::new_v4().into(), "BOM".into(), "Chhatrapati Shivaji Maharaj International".into(), "Mumbai".into(), "India".into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Airport::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Airport {
    Table,
    Id,
    Code,
    Name,
    City,
    Country,
}
