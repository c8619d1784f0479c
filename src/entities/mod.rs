pub mod airport;
pub mod booking;
pub mod booking_seat;
pub mod flight;
pub mod payment;
pub mod seat;
pub mod traveller;
pub mod user;
