//! End-to-end booking flow against the in-memory contact store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use ocean_booking::booking::{FixedOutcomeSimulator, PaymentStatus, UserChoiceSimulator};
use ocean_booking::crm::InMemoryContactStore;
use ocean_booking::{app, AppState};

const EMAIL: &str = "diver@example.com";

/// Trip offsets kept well away from the 15-day discount threshold, so a run
/// straddling UTC midnight cannot change which side of it a trip lands on.
const DISCOUNTED: i64 = 30;
const UNDISCOUNTED: i64 = 5;

fn test_app() -> Router {
    let state = AppState::new(
        Arc::new(InMemoryContactStore::new()),
        Arc::new(UserChoiceSimulator),
        Duration::minutes(30),
    );
    app(state)
}

fn trip_date(days_out: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days_out))
        .format("%Y-%m-%d")
        .to_string()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-session-token", token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/session", None, Some(json!({ "email": EMAIL }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresInSeconds"], 1800);
    body["token"].as_str().unwrap().to_string()
}

fn step_one(days_out: i64) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "phone": "555-0100",
        "adults": 2,
        "childrenUnder18": 1,
        "childrenOver18": 0,
        "tripDate": trip_date(days_out),
        "price": "1.00"
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flow_requires_session() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/booking", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "session_expired");

    let (status, _) = send(&app, Method::GET, "/booking", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_booking_flow() {
    let app = test_app();
    let token = login(&app).await;
    let token = Some(token.as_str());

    // Dashboard before booking.
    let (status, body) = send(&app, Method::GET, "/booking", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], EMAIL);
    assert!(body["booking"].is_null());

    // Save a draft, then submit step one. The client-sent price is ignored.
    let (status, _) = send(&app, Method::PUT, "/booking/draft", token, Some(json!({ "firstName": "Ada" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/booking", token, Some(step_one(DISCOUNTED))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextStep"], "GoToReview");
    assert_eq!(body["booking"]["price"], "800.00");
    assert_eq!(body["booking"]["paymentStatus"], "Pending");
    assert_eq!(body["quote"]["discount"]["amount"], "200.00");
    assert_eq!(body["editability"]["tripFieldsEditable"], true);

    // Review shows the breakdown.
    let (status, body) = send(&app, Method::GET, "/booking/review", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"]["subtotal"]["amount"], "1000.00");
    assert_eq!(body["price"]["finalPrice"]["amount"], "800.00");

    // A failed payment is not terminal.
    let (status, body) = send(&app, Method::POST, "/booking/payment", token, Some(json!({ "outcome": "Failed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["terminal"], false);
    assert_eq!(body["outcome"]["nextStep"], "GoToDashboard");
    assert_eq!(body["booking"]["paymentStatus"], "Failed");
    let (status, _) = send(&app, Method::GET, "/booking/draft", token, None).await;
    assert_eq!(status, StatusCode::OK);

    // Retry and pay: draft is cleared.
    let (status, body) = send(&app, Method::POST, "/booking/payment", token, Some(json!({ "outcome": "Paid" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["terminal"], true);
    assert_eq!(body["booking"]["paymentStatus"], "Paid");
    let (status, _) = send(&app, Method::GET, "/booking/draft", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Review is not offered again.
    let (status, body) = send(&app, Method::GET, "/booking/review", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextStep"], "GoToDashboard");
    assert!(body.get("booking").is_none());

    // Trip is frozen; personal details still change.
    let mut edit = step_one(UNDISCOUNTED);
    edit["adults"] = json!(5);
    edit["phone"] = json!("555-9999");
    edit["personalOnly"] = json!(true);
    let (status, body) = send(&app, Method::POST, "/booking", token, Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextStep"], "GoToDashboard");
    assert_eq!(body["editability"]["tripFieldsEditable"], false);
    assert_eq!(body["booking"]["adults"], 2);
    assert_eq!(body["booking"]["phone"], "555-9999");
    assert_eq!(body["booking"]["price"], "800.00");

    // Logout ends the session.
    let (status, _) = send(&app, Method::DELETE, "/session", token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/session", token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submission_cannot_change_email() {
    let app = test_app();
    let token = login(&app).await;
    let mut body = step_one(DISCOUNTED);
    body["email"] = json!("someone-else@example.com");
    let (status, body) = send(&app, Method::POST, "/booking", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_quote_endpoint() {
    let app = test_app();
    let quote = |body: Value, token: Option<String>| {
        let app = app.clone();
        async move { send(&app, Method::POST, "/booking/quote", token.as_deref(), Some(body)).await }
    };

    let (status, _) = quote(json!({ "adults": 1, "tripDate": trip_date(UNDISCOUNTED) }), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = Some(login(&app).await);
    let (status, body) = quote(json!({ "adults": 1, "tripDate": trip_date(UNDISCOUNTED) }), token.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subtotal"]["amount"], "700.00");
    assert_eq!(body["finalPrice"]["amount"], "700.00");
    assert_eq!(body["discountApplied"], false);
    assert_eq!(body["finalPrice"]["currency"], "USD");

    let (status, body) = quote(json!({ "adults": 1, "tripDate": trip_date(DISCOUNTED) }), token.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalPrice"]["amount"], "560.00");

    let (status, _) = quote(json!({ "adults": 0, "tripDate": trip_date(UNDISCOUNTED) }), token.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = quote(json!({ "adults": 1, "tripDate": trip_date(-1) }), token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_interop_surface() {
    let app = test_app();
    let uri = format!("/contact/{EMAIL}");

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No booking found for this email");

    let (status, _) = send(&app, Method::POST, "/contact", None, Some(json!({ "email": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut create = step_one(DISCOUNTED);
    create["email"] = json!(EMAIL);
    create["childrenUnder18"] = json!(-1);
    let (status, _) = send(&app, Method::POST, "/contact", None, Some(create.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    create["childrenUnder18"] = json!(1);
    let (status, body) = send(&app, Method::POST, "/contact", None, Some(create)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "800.00");

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Ada");

    // Booking PATCH re-prices from the merged trip.
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/booking"),
        None,
        Some(json!({ "childrenOver18": 2, "price": "5.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 500 + 400 + 100 + 300 = 1300, discounted to 1040.00
    assert_eq!(body["price"], "1040.00");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/payment"),
        None,
        Some(json!({ "status": "Refunded" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payment status: Refunded");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/payment"),
        None,
        Some(json!({ "status": "Paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentStatus"], "Paid");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/contact/ghost@example.com/payment",
        None,
        Some(json!({ "status": "Paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fixed_payment_outcome() {
    let state = AppState::new(
        Arc::new(InMemoryContactStore::new()),
        Arc::new(FixedOutcomeSimulator(PaymentStatus::Failed)),
        Duration::minutes(30),
    );
    let app = app(state);
    let token = login(&app).await;

    let (status, _) = send(&app, Method::POST, "/booking", Some(&token), Some(step_one(UNDISCOUNTED))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/booking/payment",
        Some(&token),
        Some(json!({ "outcome": "Paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["paymentStatus"], "Failed");
    assert_eq!(body["message"], "Payment failed. Please try again after sometime.");
}

#[tokio::test]
async fn test_paid_booking_cannot_be_unpaid_and_repriced() {
    let app = test_app();
    let uri = format!("/contact/{EMAIL}");
    let mut create = step_one(DISCOUNTED);
    create["email"] = json!(EMAIL);
    let (status, _) = send(&app, Method::POST, "/contact", None, Some(create)).await;
    assert_eq!(status, StatusCode::OK);

    let payment = format!("{uri}/payment");
    let (status, _) = send(&app, Method::PATCH, &payment, None, Some(json!({ "status": "Paid" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::PATCH, &payment, None, Some(json!({ "status": "Pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/booking"),
        None,
        Some(json!({ "adults": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentStatus"], "Paid");
    assert_eq!(body["adults"], 2);
    assert_eq!(body["price"], "800.00");
}

#[tokio::test]
async fn test_malformed_bodies_use_error_contract() {
    let app = test_app();
    let token = login(&app).await;

    let mut fractional = step_one(DISCOUNTED);
    fractional["email"] = json!(EMAIL);
    fractional["adults"] = json!(1.5);
    let mut stringly = fractional.clone();
    stringly["adults"] = json!("2");

    for body in [fractional, stringly] {
        let (status, body) = send(&app, Method::POST, "/contact", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "validation_error");
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        "/booking/draft",
        Some(&token),
        Some(json!({ "adults": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");

    // Malformed JSON and a missing content type.
    for request in [
        Request::builder()
            .method(Method::POST)
            .uri("/contact")
            .header("content-type", "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap(),
        Request::builder()
            .method(Method::POST)
            .uri("/contact")
            .body(Body::from(json!({ "email": EMAIL }).to_string()))
            .unwrap(),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_type"], "validation_error");
    }
}
