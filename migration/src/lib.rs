pub use sea_orm_migration::prelude::*;

mod m20251020_000001_create_airports;
mod m20251020_000002_create_users;
mod m20251020_000003_create_flights;
mod m20251020_000004_create_seats;
mod m20251020_000005_create_bookings;
mod m20251020_000006_create_travellers;
mod m20251020_000007_create_booking_seats;
mod m20251020_000008_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_create_airports::Migration),
            Box::new(m20251020_000002_create_users::Migration),
            Box::new(m20251020_000003_create_flights::Migration),
            Box::new(m20251020_000004_create_seats::Migration),
            Box::new(m20251020_000005_create_bookings::Migration),
            Box::new(m20251020_000006_create_travellers::Migration),
            Box::new(m20251020_000007_create_booking_seats::Migration),
            Box::new(m20251020_000008_create_payments::Migration),
        ]
    }
}
