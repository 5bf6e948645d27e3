//! App-wide constants: identity, model ids, storage slots, palettes, voices.

pub const APP_NAME: &str = "Muse";

/// Persistent storage slots. Each holds one JSON blob, written wholesale.
pub const SLOT_THEME: &str = "theme-config";
pub const SLOT_SESSIONS: &str = "chat-sessions";
pub const SLOT_IMAGES: &str = "image-history";

pub const CHAT_MODEL: &str = "gemini-3-flash-preview";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

pub const SYSTEM_INSTRUCTION: &str =
    "Your name is Muse. You are a helpful assistant for conversation, image creation and ideas.";

pub const WELCOME_MESSAGE: &str = "Hi! I'm Muse. How can I help you today?";
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

pub const IMAGE_REPLY: &str = "I've generated this image for you based on your prompt.";
pub const IMAGE_APOLOGY: &str = "I'm sorry, I couldn't generate that image right now.";

/// Default keyword set for the image-generation intent heuristic.
/// Case-insensitive substring match; deliberately crude and overridable.
pub const GENERATION_KEYWORDS: &[&str] = &["generate", "create image"];

/// Style suffixes for batch variation generation.
pub const VARIATION_STYLES: &[&str] =
    &["Photorealistic", "Digital Art", "Oil Painting", "Cyberpunk"];

pub const ASPECT_RATIOS: &[&str] = &["1:1", "9:16", "16:9", "5:3", "4:3", "21:9"];

pub const BG_REMOVAL_INSTRUCTION: &str =
    "Remove the background of this image and return only the main subject on a transparent background.";

/// Synthesized speech arrives as 16-bit LE PCM, mono, at this rate.
pub const TTS_SAMPLE_RATE: u32 = 24_000;

pub const PASTEL_COLORS: &[&str] = &[
    "#F0F9FF", "#FDF2F8", "#ECFDF5", "#FFFBEB", "#F5F3FF", "#E9D5FF", "#F9FAFB", "#FEF2F2",
    "#F0FDF4", "#FFF7ED", "#F0FDFA", "#EFF6FF", "#FAF5FF", "#FDF4FF", "#FFFBF0", "#F5FEFD",
];

pub const DARK_COLORS: &[&str] = &[
    "#0F172A", "#1E1B4B", "#2E1065", "#111827", "#064E3B", "#450A0A", "#171717", "#27272A",
    "#020617", "#1E293B", "#312E81", "#3730A3", "#5B21B6", "#701A75", "#831843", "#164E63",
];

/// UI chrome colors paired with each palette family.
pub const UI_COLOR_FOR_PASTEL: &str = "#1E293B";
pub const UI_COLOR_FOR_DARK: &str = "#F8FAFC";

pub const DEFAULT_ACCENT: &str = "#3B82F6";
