use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Committed-mutation notifications, the only output the engine exposes
/// upward to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    SessionsChanged,
    ImagesChanged,
    ThemeChanged,
}

/// Fan-out of state events to any number of subscribers. Subscribers that
/// drop their receiver are pruned on the next emit.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    subscribers: Arc<Mutex<Vec<UnboundedSender<StateEvent>>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<StateEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn emit(&self, event: StateEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
