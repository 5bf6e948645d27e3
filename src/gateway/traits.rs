use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{GatewayError, ImageData, ImageOptions, StreamEvent};

/// Boundary to the external generative AI provider: text, image and speech.
/// Implementations are opaque to the rest of the engine; every failure
/// surfaces as a `GatewayError`.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Single-shot chat completion.
    async fn complete_chat(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Streamed chat completion. Fragments arrive on `tx` in order; the
    /// stream is finite and not restartable.
    async fn stream_chat(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), GatewayError>;

    /// Returns `None` when the model replies without an image.
    async fn generate_image(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Option<ImageData>, GatewayError>;

    /// Transform an existing image per `instruction` (e.g. background
    /// removal). Returns `None` when the model replies without an image.
    async fn edit_image(
        &self,
        source: &ImageData,
        instruction: &str,
    ) -> Result<Option<ImageData>, GatewayError>;

    /// Synthesized speech as raw 16-bit LE PCM bytes, mono. Returns `None`
    /// when the model yields no audio.
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Option<Vec<u8>>, GatewayError>;
}
