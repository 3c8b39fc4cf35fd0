mod types;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

pub use types::*;

use crate::config::Config;
use crate::core::{FluxError, GenerationRequest, ReferenceImage};
use crate::http_client::HTTP_CLIENT;

/// Output resolution sent with every submission.
pub const IMAGE_SIZE: u32 = 768;

/// Delay between result polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Provider status meaning "keep polling".
const STATUS_PENDING: &str = "Pending";
/// Provider status meaning "done, sample available".
const STATUS_READY: &str = "Ready";

/// How long the polling loop is allowed to run. Interactive use is
/// unbounded on purpose: generation can legitimately outlast any fixed
/// timeout. Automated contexts cap the iterations and get a distinct
/// timeout error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    Unbounded,
    Bounded(u32),
}

/// FLUX API client. Stateless across invocations: it holds credentials
/// and endpoints, never job state, and it does not retry on its own.
pub struct FluxClient {
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    poll_mode: PollMode,
}

impl FluxClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_mode: PollMode::Unbounded,
        }
    }

    /// Create a new client from config
    pub fn from_config(config: &Config) -> Result<Self, FluxError> {
        let api_key = config
            .api_key()
            .ok_or_else(FluxError::missing_key)?
            .to_string();

        let mut client = Self::new(api_key, config.api.base_url.clone());
        client.poll_interval = Duration::from_millis(config.api.poll_interval_ms);
        if let Some(cap) = config.api.poll_limit {
            client.poll_mode = PollMode::Bounded(cap);
        }
        Ok(client)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_mode(mut self, mode: PollMode) -> Self {
        self.poll_mode = mode;
        self
    }

    /// Submit a generation request and drive it to a terminal state.
    ///
    /// Returns the URL of the generated sample. Validation happens
    /// before any network traffic; a direct sample in the submission
    /// response short-circuits the polling loop entirely.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<String, FluxError> {
        if request.prompt.trim().is_empty() || self.api_key.trim().is_empty() {
            return Err(FluxError::missing_input());
        }

        let input_image = match &request.reference {
            // Inline payloads are forwarded as-is, no re-encoding.
            Some(ReferenceImage::Inline(data)) => Some(data.clone()),
            Some(ReferenceImage::Url(url)) => Some(self.fetch_reference(url).await?),
            None => None,
        };

        let payload = SubmitPayload {
            prompt: request.prompt.clone(),
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
            prompt_upsampling: false,
            input_image,
        };

        let endpoint = request.variant.endpoint(&self.base_url);
        tracing::debug!("Submitting generation request to: {}", endpoint);

        let response = HTTP_CLIENT
            .post(&endpoint)
            .header("x-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Submission response status: {}", status);

        if !status.is_success() {
            return Err(FluxError::Provider {
                status: status.as_u16(),
                message: extract_error_message(status.as_u16(), &body),
            });
        }

        let submission: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| FluxError::Protocol(format!("malformed submission response: {e}")))?;

        // Synchronous completion: no polling needed.
        if let Some(sample) = submission.sample {
            return Ok(sample);
        }

        let polling_url = submission
            .polling_url
            .ok_or_else(|| FluxError::Protocol("no polling handle in response".to_string()))?;

        self.poll(&polling_url).await
    }

    /// Poll the result endpoint until a terminal status. Pending is the
    /// only non-terminal status; every other status, recognized or not,
    /// ends the loop.
    async fn poll(&self, polling_url: &str) -> Result<String, FluxError> {
        let mut polls = 0u32;
        loop {
            if let PollMode::Bounded(cap) = self.poll_mode {
                if polls >= cap {
                    return Err(FluxError::PollTimeout(cap));
                }
            }
            polls += 1;

            tokio::time::sleep(self.poll_interval).await;

            let response = HTTP_CLIENT
                .get(polling_url)
                .header("x-key", &self.api_key)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                return Err(FluxError::Provider {
                    status: status.as_u16(),
                    message: extract_error_message(status.as_u16(), &body),
                });
            }

            let poll: PollResponse = serde_json::from_str(&body)
                .map_err(|e| FluxError::Protocol(format!("malformed poll response: {e}")))?;

            tracing::debug!("Poll {}: status {}", polls, poll.status);

            match poll.status.as_str() {
                STATUS_PENDING => continue,
                STATUS_READY => {
                    return match poll.result.as_ref().and_then(|r| r.sample.clone()) {
                        Some(sample) => Ok(sample),
                        None => Err(FluxError::Generation(poll.failure_message())),
                    };
                }
                _ => return Err(FluxError::Generation(poll.failure_message())),
            }
        }
    }

    /// Fetch the generated image and decode it, so callers never end up
    /// presenting a URL the client cannot actually render.
    pub async fn preload(&self, url: &str) -> Result<(), FluxError> {
        let response = HTTP_CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| FluxError::Preload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FluxError::Preload(format!(
                "image fetch returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FluxError::Preload(e.to_string()))?;

        image::load_from_memory(&bytes).map_err(|e| FluxError::Preload(e.to_string()))?;
        Ok(())
    }

    /// Download the generated image to disk, returning the saved path.
    pub async fn download(&self, url: &str, output_dir: &Path) -> Result<std::path::PathBuf> {
        fs::create_dir_all(output_dir).await?;

        let response = HTTP_CLIENT.get(url).send().await?;
        let bytes = response.bytes().await?;

        let format = image::guess_format(&bytes).context("Downloaded file is not an image")?;
        let ext = match format {
            image::ImageFormat::Jpeg => "jpg",
            image::ImageFormat::WebP => "webp",
            _ => "png",
        };

        let filename = format!(
            "klein_{}.{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            ext
        );
        let path = output_dir.join(filename);
        fs::write(&path, &bytes).await?;

        tracing::info!("Saved image to: {}", path.display());
        Ok(path)
    }

    /// Fetch a remote reference image exactly once and base64-encode
    /// its bytes for the provider payload.
    async fn fetch_reference(&self, url: &str) -> Result<String, FluxError> {
        let response = HTTP_CLIENT.get(url).send().await.map_err(|e| FluxError::Fetch {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FluxError::Fetch {
                message: format!("reference image fetch returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FluxError::Fetch {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        })?;

        Ok(BASE64.encode(&bytes))
    }
}

#[async_trait::async_trait]
impl crate::core::GenerateBackend for FluxClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<String, FluxError> {
        FluxClient::submit(self, request).await
    }

    async fn preload(&self, url: &str) -> Result<(), FluxError> {
        FluxClient::preload(self, url).await
    }
}

/// Pull a human-readable message out of a provider error body,
/// preferring `detail`, then `message`, then `error`, then the raw
/// text, then a generic string naming the status.
fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(v) if !v.is_null() => return v.to_string(),
                _ => {}
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("error ({status})")
    } else {
        trimmed.to_string()
    }
}

/// Load an image file and encode as base64
pub async fn load_image_base64(path: &Path) -> Result<String> {
    let data = fs::read(path).await?;
    image::guess_format(&data).context("File is not a recognized image format")?;
    Ok(BASE64.encode(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_over_message_over_error() {
        let body = r#"{"detail":"quota exceeded","message":"m","error":"e"}"#;
        assert_eq!(extract_error_message(429, body), "quota exceeded");

        let body = r#"{"message":"bad key","error":"e"}"#;
        assert_eq!(extract_error_message(401, body), "bad key");

        let body = r#"{"error":"boom"}"#;
        assert_eq!(extract_error_message(500, body), "boom");
    }

    #[test]
    fn error_message_falls_back_to_raw_text_then_generic() {
        assert_eq!(extract_error_message(503, "upstream down"), "upstream down");
        assert_eq!(extract_error_message(503, "   "), "error (503)");
        assert_eq!(extract_error_message(418, ""), "error (418)");
    }

    #[test]
    fn structured_non_string_detail_is_stringified() {
        let body = r#"{"detail":[{"loc":["prompt"],"msg":"field required"}]}"#;
        let msg = extract_error_message(422, body);
        assert!(msg.contains("field required"));
    }
}
