use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{admin, auth, bookings, flights};
use crate::middleware::auth::{auth_middleware, require_admin, require_customer};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_booking_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let booking_governor = create_booking_governor();

    // Public routes (rate limited per IP)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let public_routes = Router::new()
        .route("/flights", get(flights::search_flights))
        .route("/flights/{id}", get(flights::get_flight))
        .route("/flights/{id}/price", get(flights::flight_price))
        .route("/flights/{id}/seats", get(flights::flight_seats))
        .route("/airports", get(flights::list_airports))
        .layer(public_governor);

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/airports", post(admin::create_airport))
        .route("/flights", post(admin::create_flight))
        .route("/flights/{id}/fare", put(admin::update_fare))
        .route("/bookings", get(admin::list_all_bookings))
        .route("/holds/sweep", post(admin::sweep_holds))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Customer booking routes (requires auth + customer role, rate limited per user)
    let booking_routes = Router::new()
        .route("/initiate", post(bookings::initiate_booking))
        .route("/history", get(bookings::booking_history))
        .route("/{id}/passengers", post(bookings::add_passengers))
        .route("/{id}/pay", post(bookings::pay_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .layer(booking_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/bookings", booking_routes)
        .with_state(state)
}
