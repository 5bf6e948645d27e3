pub mod gemini;
pub mod traits;
pub mod types;

pub use gemini::GeminiGateway;
pub use traits::AiGateway;
pub use types::{GatewayError, ImageData, ImageOptions, StreamEvent};
