pub mod image;
pub mod message;
pub mod session;
pub mod theme;
pub mod voice;

pub use image::GeneratedImage;
pub use message::{Message, Role};
pub use session::ChatSession;
pub use theme::ThemeConfig;
pub use voice::{Voice, DEFAULT_VOICE, VOICES};
