use std::sync::Mutex;

use crate::config;
use crate::models::{ChatSession, Message};
use crate::services::events::{ChangeNotifier, StateEvent};
use crate::services::storage::Storage;

/// Canonical in-memory session list, newest first. All mutations are
/// identity-keyed and atomic: they fully apply or fully no-op, and a
/// snapshot is mirrored to storage after every committed mutation.
///
/// Unknown session or message ids make an operation a silent no-op rather
/// than an error: such calls originate from stale closures over
/// since-replaced state and must never destabilize the caller.
pub struct SessionStore {
    sessions: Mutex<Vec<ChatSession>>,
    active_id: Mutex<Option<String>>,
    storage: Storage,
    notifier: ChangeNotifier,
}

impl SessionStore {
    pub fn new(storage: Storage, notifier: ChangeNotifier) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            active_id: Mutex::new(None),
            storage,
            notifier,
        }
    }

    /// Load sessions from storage, once, at startup. An absent, empty or
    /// malformed slot synthesizes one default session with the welcome
    /// message.
    pub async fn hydrate(&self) {
        let saved: Option<Vec<ChatSession>> = self.storage.read_json(config::SLOT_SESSIONS).await;

        let snapshot = match saved {
            Some(list) if !list.is_empty() => {
                let first_id = list[0].id.clone();
                *self.sessions.lock().unwrap() = list.clone();
                *self.active_id.lock().unwrap() = Some(first_id);
                list
            }
            _ => {
                let initial = ChatSession::new();
                *self.active_id.lock().unwrap() = Some(initial.id.clone());
                let list = vec![initial];
                *self.sessions.lock().unwrap() = list.clone();
                list
            }
        };

        self.sync(snapshot).await;
    }

    /// Create a fresh session, prepend it and mark it active.
    pub async fn create_session(&self) -> ChatSession {
        let session = ChatSession::new();
        let snapshot = {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.insert(0, session.clone());
            *self.active_id.lock().unwrap() = Some(session.id.clone());
            sessions.clone()
        };
        self.sync(snapshot).await;
        session
    }

    /// Append `message` to the identified session and refresh its
    /// `updated_at`. Only the targeted session changes.
    pub async fn append_message(&self, session_id: &str, message: Message) {
        let snapshot = {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) else {
                return;
            };
            session.push_message(message);
            sessions.clone()
        };
        self.sync(snapshot).await;
    }

    /// Replace the content of one message, found by id. Replace, not
    /// append: the caller hands in the full accumulated text, so a
    /// redelivered fragment cannot duplicate itself.
    pub async fn patch_message_content(&self, session_id: &str, message_id: &str, content: &str) {
        let snapshot = {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) else {
                return;
            };
            let Some(message) = session.messages.iter_mut().find(|m| m.id == message_id) else {
                return;
            };
            message.content = content.to_string();
            session.updated_at = chrono::Utc::now();
            sessions.clone()
        };
        self.sync(snapshot).await;
    }

    pub async fn rename_session(&self, session_id: &str, title: &str) {
        let snapshot = {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) else {
                return;
            };
            session.title = title.to_string();
            session.updated_at = chrono::Utc::now();
            sessions.clone()
        };
        self.sync(snapshot).await;
    }

    /// Mark an existing session active; unknown ids are ignored.
    pub fn set_active(&self, session_id: &str) {
        let sessions = self.sessions.lock().unwrap();
        if sessions.iter().any(|s| s.id == session_id) {
            *self.active_id.lock().unwrap() = Some(session_id.to_string());
        }
    }

    pub fn active_id(&self) -> Option<String> {
        self.active_id.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn session(&self, session_id: &str) -> Option<ChatSession> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    async fn sync(&self, snapshot: Vec<ChatSession>) {
        if let Err(e) = self.storage.write_json(config::SLOT_SESSIONS, &snapshot).await {
            tracing::error!("Failed to persist sessions: {}", e);
        }
        self.notifier.emit(StateEvent::SessionsChanged);
    }
}

/// Shorten free text to a session title.
pub fn truncate_title(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    if first_line.len() > 50 {
        let boundary = first_line
            .char_indices()
            .take_while(|(i, _)| *i < 47)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(47);
        format!("{}...", &first_line[..boundary])
    } else {
        first_line.to_string()
    }
}
