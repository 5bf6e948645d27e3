use std::sync::Mutex;

use crate::config;
use crate::models::ThemeConfig;
use crate::services::events::{ChangeNotifier, StateEvent};
use crate::services::storage::Storage;

/// Holds the current theme; selections replace the whole value.
pub struct ThemeStore {
    theme: Mutex<ThemeConfig>,
    storage: Storage,
    notifier: ChangeNotifier,
}

impl ThemeStore {
    pub fn new(storage: Storage, notifier: ChangeNotifier) -> Self {
        Self {
            theme: Mutex::new(ThemeConfig::default()),
            storage,
            notifier,
        }
    }

    pub async fn hydrate(&self) {
        if let Some(saved) = self.storage.read_json::<ThemeConfig>(config::SLOT_THEME).await {
            *self.theme.lock().unwrap() = saved;
        }
    }

    pub async fn select(&self, theme: ThemeConfig) {
        *self.theme.lock().unwrap() = theme.clone();
        if let Err(e) = self.storage.write_json(config::SLOT_THEME, &theme).await {
            tracing::error!("Failed to persist theme: {}", e);
        }
        self.notifier.emit(StateEvent::ThemeChanged);
    }

    pub fn current(&self) -> ThemeConfig {
        self.theme.lock().unwrap().clone()
    }
}
