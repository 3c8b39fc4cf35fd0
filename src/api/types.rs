use serde::{Deserialize, Serialize};

/// Request body for the generation endpoints.
#[derive(Debug, Serialize)]
pub struct SubmitPayload {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub prompt_upsampling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_image: Option<String>, // base64 encoded
}

/// Response to a submission: either a finished sample right away, or a
/// polling handle for asynchronous completion.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub sample: Option<String>,
    pub polling_url: Option<String>,
}

/// One poll of the result endpoint.
#[derive(Debug, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub status: String,
    pub result: Option<PollResult>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PollResult {
    pub sample: Option<String>,
}

impl PollResponse {
    /// Message for a terminal non-Ready status: explicit fields first,
    /// then a synthesized one naming the status.
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.detail.clone())
            .unwrap_or_else(|| format!("generation failed: {}", self.status))
    }
}
