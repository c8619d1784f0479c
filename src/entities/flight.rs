use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cabin labels accepted when a flight or seat map is created.
pub const TRAVEL_CLASSES: [&str; 3] = ["Economy", "Business", "First"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flight")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub carrier_name: String,
    pub flight_code: String,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTimeWithTimeZone,
    pub arrival_time: DateTimeWithTimeZone,
    pub duration_minutes: i32,
    pub stops: i32,
    /// Baseline fare; drifts when an external demand feed rewrites it.
    pub base_fare: f64,
    pub travel_class: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::airport::Entity",
        from = "Column::OriginAirportId",
        to = "super::airport::Column::Id"
    )]
    OriginAirport,
    #[sea_orm(
        belongs_to = "super::airport::Entity",
        from = "Column::DestinationAirportId",
        to = "super::airport::Column::Id"
    )]
    DestinationAirport,
    #[sea_orm(has_many = "super::seat::Entity")]
    Seats,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::seat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seats.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
