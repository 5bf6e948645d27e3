use std::sync::Mutex;

use crate::config;
use crate::models::GeneratedImage;
use crate::services::events::{ChangeNotifier, StateEvent};
use crate::services::storage::Storage;

/// Append-only gallery of generated images, newest first.
pub struct ImageHistory {
    images: Mutex<Vec<GeneratedImage>>,
    storage: Storage,
    notifier: ChangeNotifier,
}

impl ImageHistory {
    pub fn new(storage: Storage, notifier: ChangeNotifier) -> Self {
        Self {
            images: Mutex::new(Vec::new()),
            storage,
            notifier,
        }
    }

    pub async fn hydrate(&self) {
        if let Some(saved) = self
            .storage
            .read_json::<Vec<GeneratedImage>>(config::SLOT_IMAGES)
            .await
        {
            *self.images.lock().unwrap() = saved;
        }
    }

    pub async fn record(&self, image: GeneratedImage) {
        let snapshot = {
            let mut images = self.images.lock().unwrap();
            images.insert(0, image);
            images.clone()
        };
        self.sync(snapshot).await;
    }

    /// Prepend a batch as one block, keeping its internal order.
    pub async fn record_many(&self, batch: Vec<GeneratedImage>) {
        if batch.is_empty() {
            return;
        }
        let snapshot = {
            let mut images = self.images.lock().unwrap();
            images.splice(0..0, batch);
            images.clone()
        };
        self.sync(snapshot).await;
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.images.lock().unwrap().clone()
    }

    async fn sync(&self, snapshot: Vec<GeneratedImage>) {
        if let Err(e) = self.storage.write_json(config::SLOT_IMAGES, &snapshot).await {
            tracing::error!("Failed to persist image history: {}", e);
        }
        self.notifier.emit(StateEvent::ImagesChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> ImageHistory {
        ImageHistory::new(Storage::open_in_memory().unwrap(), ChangeNotifier::new())
    }

    #[tokio::test]
    async fn newest_entry_comes_first() {
        let history = history();
        history
            .record(GeneratedImage::new("data:image/png;base64,a", "first"))
            .await;
        history
            .record(GeneratedImage::new("data:image/png;base64,b", "second"))
            .await;

        let images = history.images();
        assert_eq!(images[0].prompt, "second");
        assert_eq!(images[1].prompt, "first");
    }

    #[tokio::test]
    async fn batch_is_prepended_in_order() {
        let history = history();
        history
            .record(GeneratedImage::new("data:image/png;base64,z", "old"))
            .await;
        history
            .record_many(vec![
                GeneratedImage::new("data:image/png;base64,a", "batch 1"),
                GeneratedImage::new("data:image/png;base64,b", "batch 2"),
            ])
            .await;

        let prompts: Vec<_> = history.images().iter().map(|i| i.prompt.clone()).collect();
        assert_eq!(prompts, vec!["batch 1", "batch 2", "old"]);
    }

    #[tokio::test]
    async fn survives_restart() {
        let storage = Storage::open_in_memory().unwrap();

        let writer = ImageHistory::new(storage.clone(), ChangeNotifier::new());
        writer
            .record(GeneratedImage::new("data:image/png;base64,a", "kept"))
            .await;
        writer
            .record(GeneratedImage::new("data:image/png;base64,b", "also kept"))
            .await;

        let reader = ImageHistory::new(storage, ChangeNotifier::new());
        reader.hydrate().await;

        assert_eq!(reader.images().len(), 2);
        assert_eq!(reader.images()[0].prompt, "also kept");
    }
}
