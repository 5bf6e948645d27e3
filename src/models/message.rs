use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One chat turn. `content` is mutated in place (keyed by `id`) while a
/// streamed reply is arriving; messages are never deleted individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Inline image reference (data URL), for uploads and generated images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl Message {
    pub fn user(content: impl Into<String>, image: Option<String>) -> Self {
        Self::new(Role::User, content, image)
    }

    pub fn assistant(content: impl Into<String>, image: Option<String>) -> Self {
        Self::new(Role::Assistant, content, image)
    }

    fn new(role: Role, content: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            image,
            attachments: Vec::new(),
        }
    }
}
