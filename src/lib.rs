pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod inventory;
pub mod ledger;
pub mod middleware;
pub mod pricing;
pub mod reservation;
pub mod routes;
pub mod sweeper;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use reservation::ReservationCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub reservations: ReservationCoordinator,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let reservations = ReservationCoordinator::new(db.clone(), config.hold);
        Self {
            db,
            config,
            reservations,
        }
    }
}
