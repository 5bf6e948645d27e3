pub mod chat;
pub mod events;
pub mod images;
pub mod sessions;
pub mod speech;
pub mod storage;
pub mod studio;
pub mod theme;

pub use chat::ChatController;
pub use events::{ChangeNotifier, StateEvent};
pub use images::ImageHistory;
pub use sessions::SessionStore;
pub use speech::{AudioPlayer, ProcessPlayer, SpeechController};
pub use storage::Storage;
pub use studio::ImageStudio;
pub use theme::ThemeStore;
