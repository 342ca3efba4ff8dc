//! HTTP boundary tests (router driven in-process with `oneshot`)

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use banking_ledger::gateway::{self, AUTH_USER_HEADER, state::AppState, types::error_codes};
use banking_ledger::ledger::{AccountId, AccountReader, Currency, MemoryLedger, TransferService};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> (Router, MemoryLedger, AccountId, AccountId, AccountId) {
    let ledger = MemoryLedger::new();
    let a = ledger.open_account("alice", Currency::Usd, dec("1000")).unwrap().id;
    let b = ledger.open_account("bob", Currency::Usd, dec("1000")).unwrap().id;
    let c = ledger.open_account("carol", Currency::Eur, dec("1000")).unwrap().id;

    let state = Arc::new(AppState::new(TransferService::new(ledger.clone()), None));
    (gateway::router(state), ledger, a, b, c)
}

fn post_transfer(user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/transfers")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(AUTH_USER_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(AUTH_USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_transfer_success() {
    let (app, ledger, a, b, _) = setup();

    let (status, body) = send(
        &app,
        post_transfer(
            Some("alice"),
            json!({"from_account_id": a, "to_account_id": b, "amount": "100"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "ok");
    assert_eq!(body["data"]["from_account"]["balance"], "900");
    assert_eq!(body["data"]["to_account"]["balance"], "1100");
    assert_eq!(body["data"]["from_entry"]["amount"], "-100");
    assert_eq!(body["data"]["to_entry"]["amount"], "100");
    assert_eq!(body["data"]["transfer"]["amount"], "100");

    assert_eq!(ledger.get_account(a).await.unwrap().balance, dec("900"));
}

#[tokio::test]
async fn test_transfer_error_statuses() {
    let (app, ledger, a, b, c) = setup();

    let cases = [
        ("alice", a, b, "10000", StatusCode::UNPROCESSABLE_ENTITY, error_codes::INSUFFICIENT_BALANCE),
        ("alice", a, c, "10", StatusCode::BAD_REQUEST, error_codes::CURRENCY_MISMATCH),
        ("bob", a, b, "10", StatusCode::FORBIDDEN, error_codes::INVALID_OWNER),
        ("alice", a, b, "-50", StatusCode::BAD_REQUEST, error_codes::NEGATIVE_AMOUNT),
        ("alice", a, b, "ten", StatusCode::BAD_REQUEST, error_codes::INVALID_AMOUNT),
        ("alice", a, 999, "10", StatusCode::NOT_FOUND, error_codes::ACCOUNT_NOT_FOUND),
    ];

    for (user, from, to, amount, status, code) in cases {
        let (got_status, body) = send(
            &app,
            post_transfer(
                Some(user),
                json!({"from_account_id": from, "to_account_id": to, "amount": amount}),
            ),
        )
        .await;
        assert_eq!(got_status, status, "{user} {from}->{to} {amount}");
        assert_eq!(body["code"], code, "{user} {from}->{to} {amount}");
        assert!(body.get("data").is_none());
    }

    assert!(ledger.entries().is_empty());
    assert!(ledger.transfers().is_empty());
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let (app, ledger, a, b, _) = setup();

    let (status, body) = send(
        &app,
        post_transfer(None, json!({"from_account_id": a, "to_account_id": b, "amount": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], error_codes::MISSING_AUTH);

    let (status, _) = send(
        &app,
        post_transfer(Some("  "), json!({"from_account_id": a, "to_account_id": b, "amount": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(ledger.transfers().is_empty());
}

#[tokio::test]
async fn test_invalid_parameters() {
    let (app, _, a, _, _) = setup();

    // Ids must be positive
    let (status, body) = send(
        &app,
        post_transfer(
            Some("alice"),
            json!({"from_account_id": a, "to_account_id": 0, "amount": "1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::INVALID_PARAMETER);

    // Amount must be a JSON string
    let (status, body) = send(
        &app,
        post_transfer(
            Some("alice"),
            json!({"from_account_id": a, "to_account_id": 2, "amount": 1.5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::INVALID_PARAMETER);

    // Missing field
    let (status, _) = send(
        &app,
        post_transfer(Some("alice"), json!({"from_account_id": a})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_account_owner_only() {
    let (app, _, a, _, _) = setup();
    let uri = format!("/api/v1/accounts/{a}");

    let (status, body) = send(&app, get(&uri, Some("alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"], "alice");
    assert_eq!(body["data"]["balance"], "1000");
    assert_eq!(body["data"]["currency"], "USD");

    let (status, body) = send(&app, get(&uri, Some("bob"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], error_codes::INVALID_OWNER);

    let (status, _) = send(&app, get("/api/v1/accounts/999", Some("alice"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let (app, _, _, _, _) = setup();

    let (status, body) = send(&app, get("/api/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert!(body["data"]["timestamp_ms"].as_i64().unwrap() > 0);
    assert!(body["data"]["version"].is_string());
}
