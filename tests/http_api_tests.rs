//! HTTP surface tests driven through the router without a socket

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{identity_for, login_message, Harness, Wallet};
use wallet_auth_server::models::UserRole;
use wallet_auth_server::routes;
use wallet_auth_server::state::AppState;

fn app(harness: &Harness) -> Router {
    routes::app_router(AppState::new(harness.service.clone(), None))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_nonce_verify_profile_flow() {
    let wallet = Wallet::new(21);
    let harness = Harness::new(vec![identity_for(&wallet.address(), UserRole::Admin)]);

    let (status, body) = send(
        app(&harness),
        post_json("/auth/nonce", json!({ "address": wallet.address() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let nonce = body["nonce"].as_str().unwrap().to_string();
    assert_eq!(nonce.len(), 64);

    let message = login_message(&nonce);
    let (status, body) = send(
        app(&harness),
        post_json(
            "/auth/verify",
            json!({
                "address": wallet.address(),
                "signature": wallet.sign(&message),
                "message": message,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], common::TOKEN_TTL_SECONDS);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(app(&harness), get("/auth/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["address"], wallet.address());
    assert_eq!(body["first_name"], "Ada");
}

#[tokio::test]
async fn test_replayed_verify_requires_new_challenge() {
    let wallet = Wallet::new(22);
    let harness = Harness::new(vec![identity_for(&wallet.address(), UserRole::Guest)]);

    let nonce = harness
        .service
        .issue_challenge(&wallet.address())
        .unwrap()
        .nonce;
    let message = login_message(&nonce);
    let payload = json!({
        "address": wallet.address(),
        "signature": wallet.sign(&message),
        "message": message,
    });

    let (status, _) = send(app(&harness), post_json("/auth/verify", payload.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app(&harness), post_json("/auth/verify", payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "CHALLENGE_REQUIRED");
}

#[tokio::test]
async fn test_profile_requires_bearer_token() {
    let harness = Harness::new(vec![]);

    let (status, body) = send(app(&harness), get("/auth/profile", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");

    let (status, body) = send(app(&harness), get("/auth/profile", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_invalid_address_is_bad_request() {
    let harness = Harness::new(vec![]);

    let (status, body) = send(
        app(&harness),
        post_json("/auth/nonce", json!({ "address": "0xnot-an-address" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_empty_fields_are_rejected_before_the_handshake() {
    let harness = Harness::new(vec![]);

    let (status, body) = send(
        app(&harness),
        post_json(
            "/auth/verify",
            json!({ "address": "", "signature": "", "message": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bad_signature_does_not_reveal_the_failing_check() {
    let wallet = Wallet::new(23);
    let harness = Harness::new(vec![identity_for(&wallet.address(), UserRole::Guest)]);

    let nonce = harness
        .service
        .issue_challenge(&wallet.address())
        .unwrap()
        .nonce;
    let message = login_message(&nonce);

    let (status, body) = send(
        app(&harness),
        post_json(
            "/auth/verify",
            json!({
                "address": wallet.address(),
                "signature": Wallet::new(24).sign(&message),
                "message": message,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(
        body["error"]["message"],
        "Unauthorized: Authentication failed"
    );
}

#[tokio::test]
async fn test_health_endpoints() {
    let harness = Harness::new(vec![]);

    let (status, body) = send(app(&harness), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not configured");

    let (status, body) = send(app(&harness), get("/auth/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "wallet-auth-server");
}
