use serde::{Deserialize, Serialize};

/// Which provider model handles the request. Exactly two endpoints
/// exist; selection is a pure function of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    #[default]
    Klein,
    Pro,
}

impl ModelVariant {
    /// Path segment under the provider base URL.
    pub fn slug(&self) -> &'static str {
        match self {
            ModelVariant::Klein => "flux-2-klein",
            ModelVariant::Pro => "flux-2-pro",
        }
    }

    pub fn endpoint(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.slug())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Klein => "klein",
            ModelVariant::Pro => "pro",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pro" => ModelVariant::Pro,
            _ => ModelVariant::Klein,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["klein", "pro"]
    }
}

/// Conditioning image for edit-style generation. The two sources are
/// mutually exclusive by construction: either the caller already holds
/// the encoded bytes, or it holds a URL for the proxy to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceImage {
    /// Base64-encoded image bytes, forwarded as-is.
    Inline(String),
    /// Remote image fetched and encoded by the proxy.
    Url(String),
}

/// A single generation request as accepted by the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,

    #[serde(default)]
    pub variant: ModelVariant,

    pub reference: Option<ReferenceImage>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            variant: ModelVariant::default(),
            reference: None,
        }
    }

    pub fn with_variant(mut self, variant: ModelVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Check if this is an edit request (has a conditioning image)
    pub fn is_edit(&self) -> bool {
        self.reference.is_some()
    }
}
