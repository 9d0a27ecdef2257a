use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use portal_otp_auth::router::build_router;

use crate::helpers::{DEVICE, Harness, OTHER_DEVICE};

fn app(h: &Harness) -> Router {
    build_router(Arc::clone(&h.core))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn issue(h: &Harness, email: &str) -> String {
    let (status, _) = send(
        app(h),
        post_json("/api/request_otp", json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    h.last_code()
}

#[tokio::test]
async fn should_answer_health_probes() {
    let h = Harness::new();
    for probe in ["/healthz", "/readyz"] {
        let (status, body) = send(app(&h), get(probe)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "otp-auth");
    }
}

#[tokio::test]
async fn should_reject_malformed_email_with_400() {
    let h = Harness::new();
    let (status, body) = send(
        app(&h),
        post_json("/api/request_otp", json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_ADDRESS");
    assert!(h.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_report_validity_when_issuing() {
    let h = Harness::new();
    let (status, body) = send(
        app(&h),
        post_json("/api/request_otp", json!({ "email": "User@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validity_secs"], 300);
    assert_eq!(h.sent.lock().unwrap()[0].0, "user@example.com");
}

#[tokio::test]
async fn should_run_full_portal_flow_over_http() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;

    let (status, body) = send(
        app(&h),
        post_json("/api/verify_otp", json!({ "otp": code, "mac": DEVICE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["expires_in_secs"], 3600);
    assert_eq!(body["router_granted"], true);
    let token = body["token"].as_str().unwrap().to_owned();
    assert_eq!(token.len(), 43);

    let (status, body) = send(
        app(&h),
        get(&format!("/api/check_auth?mac={DEVICE}&token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["email"], "guest@example.com");

    let (status, body) = send(
        app(&h),
        post_json("/api/check_auth", json!({ "device_id": OTHER_DEVICE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": false }));

    let (status, body) = send(app(&h), get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_otps"], 0);
    assert_eq!(body["used_otps"], 1);
    assert_eq!(body["live_sessions"], 1);
    assert_eq!(body["notifier_enabled"], false);
}

#[tokio::test]
async fn should_accept_query_string_verification() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;

    let (status, body) = send(
        app(&h),
        get(&format!("/api/verify_otp?otp={code}&mac={DEVICE}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn should_reject_reused_code_with_401() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;

    let (status, _) = send(
        app(&h),
        post_json("/api/verify_otp", json!({ "otp": code, "mac": DEVICE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(&h),
        post_json("/api/verify_otp", json!({ "otp": code, "mac": OTHER_DEVICE })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "ALREADY_USED");
}

#[tokio::test]
async fn should_reject_missing_device_with_400() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;

    let (status, body) = send(
        app(&h),
        post_json("/api/verify_otp", json!({ "otp": code })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "MISSING_INPUT");
    assert!(h.grants.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_forward_peer_ip_to_router() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;

    let mut req = post_json("/api/verify_otp", json!({ "otp": code, "mac": DEVICE }));
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 42], 51234))));
    let (status, _) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::OK);

    let grants = h.grants.lock().unwrap().clone();
    assert_eq!(
        grants,
        vec![(DEVICE.to_owned(), Some("10.0.0.42".to_owned()))]
    );
}

#[tokio::test]
async fn should_attach_request_id() {
    let h = Harness::new();
    let resp = app(&h).oneshot(get("/api/stats")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));

    let req = Request::get("/api/stats")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let resp = app(&h).oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn should_hide_full_token_on_dashboard() {
    let h = Harness::new();
    let code = issue(&h, "guest@example.com").await;
    let (_, verified) = send(
        app(&h),
        post_json("/api/verify_otp", json!({ "otp": code, "mac": DEVICE })),
    )
    .await;
    let token = verified["token"].as_str().unwrap();

    let resp = app(&h).oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains(token));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["sessions"][0]["token_prefix"], &token[..16]);
    assert_eq!(body["otps"][0]["status"], "USED");
}

#[tokio::test]
async fn should_accept_form_posts_from_portal_page() {
    let h = Harness::new();

    let (status, body) = send(
        app(&h),
        post_form("/api/request_otp", "email=Guest%40Example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let code = h.last_code();
    assert_eq!(h.sent.lock().unwrap()[0].0, "guest@example.com");

    let (status, body) = send(
        app(&h),
        post_form("/api/verify_otp", &format!("otp={code}&mac=AA%3ABB%3ACC%3ADD%3AEE%3AFF")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["token"].is_string());

    let (status, body) = send(
        app(&h),
        post_form("/api/check_auth", "mac=AA%3ABB%3ACC%3ADD%3AEE%3AFF"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn should_route_empty_bodies_to_typed_errors() {
    let h = Harness::new();

    let (status, body) = send(app(&h), post_empty("/api/verify_otp")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "MISSING_INPUT");

    let (status, body) = send(app(&h), post_empty("/api/request_otp")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_ADDRESS");
    assert!(h.core.otp_snapshot().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_json_as_missing_input() {
    let h = Harness::new();
    let req = Request::post("/api/verify_otp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "MISSING_INPUT");
}

#[tokio::test]
async fn should_answer_unauthenticated_400_without_device() {
    let h = Harness::new();

    for req in [
        get("/api/check_auth"),
        post_empty("/api/check_auth"),
        post_json("/api/check_auth", json!({ "mac": "  " })),
    ] {
        let (status, body) = send(app(&h), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "authenticated": false }));
    }
}
