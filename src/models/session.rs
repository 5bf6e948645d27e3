use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

use crate::config;

/// One conversation thread. `messages` is append-only and never reordered;
/// `updated_at` tracks the most recent mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh session seeded with the assistant welcome message.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: config::DEFAULT_SESSION_TITLE.to_string(),
            messages: vec![Message::assistant(config::WELCOME_MESSAGE, None)],
            updated_at: Utc::now(),
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
