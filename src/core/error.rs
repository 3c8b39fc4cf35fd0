use thiserror::Error;

/// Everything that can go wrong between accepting a prompt and handing
/// back a finished image URL. Each variant maps to the HTTP status the
/// proxy surface reports via [`FluxError::status_code`].
#[derive(Error, Debug)]
pub enum FluxError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to fetch reference image: {message}")]
    Fetch {
        message: String,
        /// Upstream status of the failed fetch, when one was received.
        status: Option<u16>,
    },

    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    Generation(String),

    #[error("failed to decode generated image: {0}")]
    Preload(String),

    #[error("polling did not complete within {0} attempts")]
    PollTimeout(u32),
}

impl FluxError {
    pub fn missing_input() -> Self {
        FluxError::Validation("prompt and API key are required".to_string())
    }

    pub fn missing_key() -> Self {
        FluxError::Validation(
            "API key not configured. Set BFL_API_KEY environment variable or run: klein config set api.key <your-key>"
                .to_string(),
        )
    }

    /// HTTP status reflecting the failure origin: 400 for validation,
    /// passthrough for provider errors, 500 for protocol violations.
    pub fn status_code(&self) -> u16 {
        match self {
            FluxError::Validation(_) => 400,
            FluxError::Fetch { status, .. } => status.unwrap_or(502),
            FluxError::Provider { status, .. } => *status,
            FluxError::Protocol(_) => 500,
            FluxError::Generation(_) => 500,
            FluxError::Preload(_) => 502,
            FluxError::PollTimeout(_) => 504,
        }
    }
}

impl From<reqwest::Error> for FluxError {
    fn from(err: reqwest::Error) -> Self {
        FluxError::Provider {
            status: err.status().map(|s| s.as_u16()).unwrap_or(502),
            message: err.to_string(),
        }
    }
}
