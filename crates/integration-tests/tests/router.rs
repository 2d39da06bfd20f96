//! Requests through the full storefront router.
//!
//! The backend is unreachable, so only routes that render without it, or
//! that redirect before touching it, are exercised here.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use thryft_integration_tests::test_config;
use thryft_storefront::state::AppState;
use tower::ServiceExt;

fn app() -> Router {
    thryft_storefront::app(AppState::new(test_config()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_fails_without_backend() {
    let response = app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_static_page_carries_security_headers() {
    let response = app().oneshot(get("/about")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let csp = headers
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.contains("script-src 'self' 'nonce-"));
    assert!(headers.contains_key(header::X_CONTENT_TYPE_OPTIONS));
    assert!(headers.contains_key("x-request-id"));

    let html = body_text(response).await;
    assert!(html.contains("Thryft"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let response = app().oneshot(get("/no/such/page")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sell_requires_sign_in() {
    let response = app().oneshot(get("/sell")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?return_to=%2Fsell");
}

#[tokio::test]
async fn test_profile_and_admin_require_sign_in() {
    for path in ["/profile", "/admin"] {
        let response = app().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert!(location(&response).starts_with("/auth/login?return_to="));
    }
}

#[tokio::test]
async fn test_collections_redirect_to_categories() {
    let response = app().oneshot(get("/collections/iphone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&response), "/categories");
}

#[tokio::test]
async fn test_saved_toggle_without_session_is_unauthorized() {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/saved/{}/toggle", thryft_core::ProductId::random()))
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = app()
        .oneshot(get("/auth/login?return_to=/cart"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("/auth/google?return_to=%2Fcart"));
}

#[tokio::test]
async fn test_empty_cart_renders() {
    let response = app().oneshot(get("/cart")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
