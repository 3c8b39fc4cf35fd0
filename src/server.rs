use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::api::{FluxClient, PollMode};
use crate::config::Config;
use crate::core::{GenerationRequest, ModelVariant, ReferenceImage};

/// Provider settings shared by every request. The credential is not
/// part of this: callers supply it per request and the proxy only
/// forwards it.
#[derive(Clone)]
pub struct ServerState {
    pub base_url: String,
    pub poll_interval: Duration,
    pub poll_limit: Option<u32>,
}

impl ServerState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            poll_interval: Duration::from_millis(config.api.poll_interval_ms),
            poll_limit: config.api.poll_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    /// Base64 reference image; takes precedence over `imageUrl`.
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    variant: Option<ModelVariant>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<ServerState>,
    Json(body): Json<GenerateBody>,
) -> impl IntoResponse {
    let prompt = body.prompt.unwrap_or_default();
    let api_key = body.api_key.unwrap_or_default();
    if prompt.trim().is_empty() || api_key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "prompt and apiKey are required" })),
        );
    }

    // The two optional fields collapse into the tagged reference union
    // here; inline data wins when a caller sends both.
    let reference = body
        .image
        .map(ReferenceImage::Inline)
        .or_else(|| body.image_url.map(ReferenceImage::Url));

    let request = GenerationRequest {
        prompt,
        variant: body.variant.unwrap_or_default(),
        reference,
    };

    let mut client =
        FluxClient::new(api_key, state.base_url.clone()).with_poll_interval(state.poll_interval);
    if let Some(cap) = state.poll_limit {
        client = client.with_poll_mode(PollMode::Bounded(cap));
    }

    match client.submit(&request).await {
        Ok(url) => (StatusCode::OK, Json(json!({ "url": url }))),
        Err(e) => {
            tracing::warn!("Generation failed: {}", e);
            (
                StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

/// Bind and serve the proxy until shutdown.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = ServerState::from_config(config);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Proxy listening on http://{}", addr);
    tracing::info!("  GET  /health");
    tracing::info!("  POST /api/generate");

    axum::serve(listener, app).await?;
    Ok(())
}
