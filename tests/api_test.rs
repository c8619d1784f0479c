mod common;

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use airline_booking_backend::entities::user::UserRole;
use airline_booking_backend::routes::create_router;
use airline_booking_backend::utils::jwt::create_token;

use common::*;

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn token_for(user_id: uuid::Uuid, role: UserRole) -> String {
    create_token(user_id, "someone@example.com", role, &test_config().jwt_secret, 1).unwrap()
}

#[tokio::test]
async fn test_register_login_and_book_over_http() {
    let db = setup_db().await;
    let app = create_router(app_state(&db));
    let (flight, seats) = simple_flight(&db, 2).await;

    let (status, registered) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "Pax@Example.com", "password": "correct-horse", "name": "Pax"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["user"]["role"], "customer");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "pax@example.com", "password": "correct-horse", "name": "Again"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, login) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "pax@example.com", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, hold) = call(
        &app,
        Method::POST,
        "/api/bookings/initiate",
        Some(&token),
        Some(json!({"flight_id": flight.id, "seat_ids": [seats[0].id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hold["status"], "PENDING");
    let booking_id = hold["booking_id"].as_str().unwrap().to_string();

    let (status, conflict) = call(
        &app,
        Method::POST,
        "/api/bookings/initiate",
        Some(&token),
        Some(json!({"flight_id": flight.id, "seat_ids": [seats[0].id]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "CONFLICT");

    let (status, paid) = call(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/pay", booking_id),
        Some(&token),
        Some(json!({"simulate_success": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "CONFIRMED");

    let (status, history) = call(&app, Method::GET, "/api/bookings/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["status"], "CONFIRMED");
    assert_eq!(history[0]["code"], paid["code"]);
}

#[tokio::test]
async fn test_bookings_are_private_to_their_owner() {
    let db = setup_db().await;
    let app = create_router(app_state(&db));
    let (flight, seats) = simple_flight(&db, 1).await;

    let owner = token_for(create_customer(&db).await, UserRole::Customer);
    let intruder = token_for(create_customer(&db).await, UserRole::Customer);

    let (_, hold) = call(
        &app,
        Method::POST,
        "/api/bookings/initiate",
        Some(&owner),
        Some(json!({"flight_id": flight.id, "seat_ids": [seats[0].id]})),
    )
    .await;
    let booking_id = hold["booking_id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/cancel", booking_id),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/api/bookings/history", None, None).await;
    assert!(status.is_client_error());

    let admin = token_for(create_user(&db, "ops@example.com", UserRole::Admin).await, UserRole::Admin);
    let (status, _) = call(&app, Method::GET, "/api/bookings/history", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_flight_search_and_seat_map() {
    let db = setup_db().await;
    let app = create_router(app_state(&db));
    let cheap = create_flight(&db, 900.0, Duration::days(20), "Economy").await;
    create_seats(&db, cheap.id, &[("1A", 0.0, false), ("1B", 150.0, true)]).await;
    let pricey = create_flight(&db, 5000.0, Duration::days(20), "Business").await;
    create_seats(&db, pricey.id, &[("1A", 0.0, false)]).await;

    let (status, flights) = call(
        &app,
        Method::GET,
        "/api/flights?origin=chennai&destination=DEL&sort_by=price",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let flights = flights.as_array().unwrap();
    assert_eq!(flights.len(), 2);
    assert_eq!(flights[0]["id"], json!(cheap.id));
    assert!(flights[0]["dynamic_price"].as_f64().unwrap() <= flights[1]["dynamic_price"].as_f64().unwrap());

    let (status, none) = call(&app, Method::GET, "/api/flights?origin=Mumbai", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(none.as_array().unwrap().is_empty());

    let (status, _) = call(&app, Method::GET, "/api/flights?date=20-10-2026", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let date = (Utc::now() + Duration::days(20)).format("%Y-%m-%d").to_string();
    let (status, dated) = call(&app, Method::GET, &format!("/api/flights?date={}", date), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dated.as_array().unwrap().len() <= 2);

    let (status, seat_map) = call(&app, Method::GET, &format!("/api/flights/{}/seats", cheap.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seat_map[1]["seat_number"], "1B");
    assert_eq!(seat_map[1]["is_occupied"], true);
    assert!(seat_map[1].get("held_by").is_none());

    let (status, quote) = call(&app, Method::GET, &format!("/api/flights/{}/price", cheap.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["available_seats"], 1);
    assert_eq!(quote["min_price"], 630.0);
}

#[tokio::test]
async fn test_admin_creates_flight_with_seat_map() {
    let db = setup_db().await;
    let app = create_router(app_state(&db));
    let admin = token_for(create_user(&db, "ops@example.com", UserRole::Admin).await, UserRole::Admin);
    let customer = token_for(create_customer(&db).await, UserRole::Customer);

    let (status, airports) = call(&app, Method::GET, "/api/airports", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let id_of = |code: &str| {
        airports
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["code"] == code)
            .map(|a| a["id"].clone())
            .unwrap()
    };

    let departure = Utc::now() + Duration::days(3);
    let payload = json!({
        "carrier_name": "Test Air",
        "flight_code": "ta101",
        "origin_airport_id": id_of("BLR"),
        "destination_airport_id": id_of("BOM"),
        "departure_time": departure,
        "arrival_time": departure + Duration::minutes(95),
        "base_fare": 3200.0,
        "travel_class": "Economy",
        "seat_layout": {
            "rows": 3,
            "letters": "ABC",
            "row_deltas": [{"from_row": 1, "to_row": 1, "price_delta": 450.0}]
        }
    });

    let (status, _) = call(&app, Method::POST, "/api/admin/flights", Some(&customer), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = call(&app, Method::POST, "/api/admin/flights", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["seat_count"], 9);
    assert_eq!(created["flight"]["flight_code"], "TA101");
    assert_eq!(created["flight"]["duration_minutes"], 95);
    let flight_id = created["flight"]["id"].as_str().unwrap().to_string();

    let (_, seats) = call(&app, Method::GET, &format!("/api/flights/{}/seats", flight_id), None, None).await;
    let seats = seats.as_array().unwrap();
    assert_eq!(seats.len(), 9);
    assert_eq!(seats[0]["seat_number"], "1A");
    assert_eq!(seats[0]["price_delta"], 450.0);
    assert_eq!(seats[3]["price_delta"], 0.0);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/admin/flights/{}/fare", flight_id),
        Some(&admin),
        Some(json!({"base_fare": 2800.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["base_fare"], 2800.0);

    let (status, same_airport) = call(
        &app,
        Method::POST,
        "/api/admin/flights",
        Some(&admin),
        Some(json!({
            "carrier_name": "Test Air",
            "flight_code": "TA102",
            "origin_airport_id": id_of("BLR"),
            "destination_airport_id": id_of("BLR"),
            "departure_time": departure,
            "arrival_time": departure + Duration::minutes(60),
            "base_fare": 1000.0,
            "travel_class": "Economy",
            "seat_layout": {"rows": 1, "letters": "A"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(same_airport["code"], "VALIDATION_FAILED");

    let (status, swept) = call(&app, Method::POST, "/api/admin/holds/sweep", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(swept["cancelled"], 0);
}
