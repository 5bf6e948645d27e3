use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One event of a streamed chat reply. Fragments are deltas, not
/// cumulative snapshots.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Knobs for image generation.
#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    /// "1:1" when unset.
    pub aspect_ratio: Option<String>,
    /// Hex colors the palette should primarily consist of.
    pub palette_colors: Vec<String>,
}

/// Raw image bytes plus their mime type.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn from_base64(mime_type: impl Into<String>, b64: &str) -> Result<Self, GatewayError> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| GatewayError::InvalidResponse(format!("Bad base64 image data: {}", e)))?;
        Ok(Self {
            mime_type: mime_type.into(),
            data,
        })
    }

    /// Inline data-URL form, the shape the stores and history keep.
    pub fn to_data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.mime_type, b64)
    }
}
