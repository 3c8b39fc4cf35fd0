//! Submit-then-poll workflow tests against a mock provider.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use klein_cli::api::{FluxClient, PollMode};
use klein_cli::core::{FluxError, GenerationRequest, ModelVariant, ReferenceImage};

fn client(server: &MockServer) -> FluxClient {
    FluxClient::new("test-key", server.uri()).with_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn missing_prompt_or_key_fails_without_network() {
    let server = MockServer::start().await;

    let err = client(&server)
        .submit(&GenerationRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxError::Validation(_)));
    assert_eq!(err.status_code(), 400);

    let err = FluxClient::new("", server.uri())
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxError::Validation(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_sample_short_circuits_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .and(header("x-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/img.png" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap();

    assert_eq!(url, "https://x/img.png");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pro_variant_targets_the_pro_endpoint_exclusively() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-pro"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/pro.png" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = client(&server)
        .submit(&GenerationRequest::new("a cat").with_variant(ModelVariant::Pro))
        .await
        .unwrap();

    assert_eq!(url, "https://x/pro.png");
}

#[tokio::test]
async fn missing_polling_handle_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::Protocol(_)));
    assert_eq!(err.to_string(), "no polling handle in response");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn polls_until_ready_then_returns_sample() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/1", server.uri());

    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/poll/1"))
        .and(header("x-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Pending" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/poll/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Ready",
            "result": { "sample": "https://x/final.png" }
        })))
        .mount(&server)
        .await;

    let url = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap();

    assert_eq!(url, "https://x/final.png");
    // One submission plus exactly three polls.
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn unrecognized_terminal_status_fails_with_status_in_message() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/2", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "Content Moderated" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::Generation(_)));
    assert_eq!(err.to_string(), "generation failed: Content Moderated");
}

#[tokio::test]
async fn explicit_error_field_wins_over_synthesized_message() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/3", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Error",
            "error": "seed rejected"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "seed rejected");
}

#[tokio::test]
async fn ready_without_sample_is_a_failure() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/4", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "Ready", "result": {} })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::Generation(_)));
    assert_eq!(err.to_string(), "generation failed: Ready");
}

#[tokio::test]
async fn provider_error_preserves_status_and_detail_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({ "detail": "Out of credits" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    match err {
        FluxError::Provider { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "Out of credits");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn poll_http_error_terminates_the_loop() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/5", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/5"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "exploded" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    match err {
        FluxError::Provider { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "exploded");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn inline_reference_is_forwarded_byte_for_byte() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .and(body_string_contains("QUJDREVG"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/img.png" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .submit(
            &GenerationRequest::new("a cat")
                .with_reference(ReferenceImage::Inline("QUJDREVG".to_string())),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn url_reference_is_fetched_once_and_encoded() {
    let server = MockServer::start().await;
    let encoded = BASE64.encode(b"raw image bytes");

    Mock::given(method("GET"))
        .and(path("/ref.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw image bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/flux-2-klein"))
        .and(body_string_contains(encoded.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sample": "https://x/img.png" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .submit(
            &GenerationRequest::new("a cat")
                .with_reference(ReferenceImage::Url(format!("{}/ref.png", server.uri()))),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_reference_fetch_propagates_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(
            &GenerationRequest::new("a cat")
                .with_reference(ReferenceImage::Url(format!("{}/gone.png", server.uri()))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::Fetch { status: Some(404), .. }));
    assert_eq!(err.status_code(), 404);
    // The submission endpoint was never reached.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bounded_mode_reports_timeout_after_the_cap() {
    let server = MockServer::start().await;
    let poll_url = format!("{}/poll/6", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "polling_url": poll_url })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Pending" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .with_poll_mode(PollMode::Bounded(3))
        .submit(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, FluxError::PollTimeout(3)));
    // One submission plus the capped three polls.
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn preload_accepts_decodable_images_and_rejects_garbage() {
    let server = MockServer::start().await;

    let mut png = Vec::new();
    image::RgbaImage::new(2, 2)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not an image".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .preload(&format!("{}/ok.png", server.uri()))
        .await
        .unwrap();

    let err = client
        .preload(&format!("{}/bad.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FluxError::Preload(_)));
}
