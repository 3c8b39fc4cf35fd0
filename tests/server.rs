//! HTTP surface tests: status mapping and reference-field collapsing.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use klein_cli::server::{router, ServerState};

fn app(base_url: &str) -> axum::Router {
    router(ServerState {
        base_url: base_url.to_string(),
        poll_interval: Duration::from_millis(10),
        poll_limit: Some(10),
    })
}

async fn post_generate(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_prompt_or_key_is_rejected_before_any_network_call() {
    let provider = MockServer::start().await;

    for body in [
        json!({}),
        json!({ "prompt": "a cat" }),
        json!({ "apiKey": "test-key" }),
        json!({ "prompt": "   ", "apiKey": "test-key" }),
    ] {
        let (status, value) = post_generate(app(&provider.uri()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "prompt and apiKey are required");
    }

    assert!(provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn successful_generation_returns_the_sample_url() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/img.png" })),
        )
        .mount(&provider)
        .await;

    let (status, value) = post_generate(
        app(&provider.uri()),
        json!({ "prompt": "a cat", "apiKey": "test-key" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["url"], "https://x/img.png");
}

#[tokio::test]
async fn variant_field_selects_the_pro_endpoint() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-pro"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/pro.png" })),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let (status, value) = post_generate(
        app(&provider.uri()),
        json!({ "prompt": "a cat", "apiKey": "test-key", "variant": "pro" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["url"], "https://x/pro.png");
}

#[tokio::test]
async fn provider_status_passes_through() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({ "detail": "Out of credits" })),
        )
        .mount(&provider)
        .await;

    let (status, value) = post_generate(
        app(&provider.uri()),
        json!({ "prompt": "a cat", "apiKey": "test-key" }),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(value["error"], "Out of credits");
}

#[tokio::test]
async fn protocol_violation_maps_to_500() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&provider)
        .await;

    let (status, value) = post_generate(
        app(&provider.uri()),
        json!({ "prompt": "a cat", "apiKey": "test-key" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], "no polling handle in response");
}

#[tokio::test]
async fn inline_image_wins_over_image_url() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .and(body_string_contains("aW5saW5l"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/img.png" })),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let (status, _) = post_generate(
        app(&provider.uri()),
        json!({
            "prompt": "a cat",
            "apiKey": "test-key",
            "image": "aW5saW5l",
            "imageUrl": format!("{}/never-fetched.png", provider.uri()),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // Only the submission reached the provider; the URL was not fetched.
    assert_eq!(provider.received_requests().await.unwrap().len(), 1);
}
