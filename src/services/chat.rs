use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config;
use crate::gateway::{AiGateway, ImageOptions, StreamEvent};
use crate::models::{GeneratedImage, Message};
use crate::services::images::ImageHistory;
use crate::services::sessions::{truncate_title, SessionStore};

/// Turns one submitted user turn into exactly one model interaction and
/// drives the session store through it. Gateway failures degrade to an
/// apology message (image path) or a truncated partial reply (chat path);
/// they never escape this boundary.
pub struct ChatController {
    gateway: Arc<dyn AiGateway>,
    sessions: Arc<SessionStore>,
    images: Arc<ImageHistory>,
    keywords: Vec<String>,
    stream_responses: bool,
}

impl ChatController {
    pub fn new(
        gateway: Arc<dyn AiGateway>,
        sessions: Arc<SessionStore>,
        images: Arc<ImageHistory>,
    ) -> Self {
        Self {
            gateway,
            sessions,
            images,
            keywords: config::GENERATION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            stream_responses: true,
        }
    }

    /// Override the image-intent keyword set.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Disable streaming; chat replies then arrive in one shot.
    pub fn with_streaming(mut self, stream_responses: bool) -> Self {
        self.stream_responses = stream_responses;
        self
    }

    /// Crude intent heuristic: case-insensitive substring match against the
    /// keyword set. Known to misfire on prose like "how photosynthesis
    /// generates energy"; kept configurable instead of clever.
    fn wants_image(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase()))
    }

    /// Submit one user turn. Empty text with no attachment is a no-op:
    /// no network call, no mutation.
    pub async fn submit(&self, session_id: &str, text: &str, attached_image: Option<String>) {
        if text.trim().is_empty() && attached_image.is_none() {
            return;
        }
        let Some(session) = self.sessions.session(session_id) else {
            return;
        };

        let is_image_request = attached_image.is_none() && self.wants_image(text);

        // The user's turn lands before any network latency
        self.sessions
            .append_message(session_id, Message::user(text, attached_image))
            .await;

        if session.title == config::DEFAULT_SESSION_TITLE && !text.trim().is_empty() {
            self.sessions
                .rename_session(session_id, &truncate_title(text))
                .await;
        }

        if is_image_request {
            self.run_image_turn(session_id, text).await;
        } else if self.stream_responses {
            self.run_chat_turn(session_id, text).await;
        } else {
            self.run_completion_turn(session_id, text).await;
        }
    }

    /// Image path: one blocking generation, one resulting message.
    async fn run_image_turn(&self, session_id: &str, prompt: &str) {
        let generated = self
            .gateway
            .generate_image(prompt, &ImageOptions::default())
            .await;

        match generated {
            Ok(Some(image)) => {
                let url = image.to_data_url();
                self.sessions
                    .append_message(
                        session_id,
                        Message::assistant(config::IMAGE_REPLY, Some(url.clone())),
                    )
                    .await;
                self.images.record(GeneratedImage::new(url, prompt)).await;
            }
            Ok(None) => {
                self.append_apology(session_id).await;
            }
            Err(e) => {
                tracing::warn!("Image generation failed: {}", e);
                self.append_apology(session_id).await;
            }
        }
    }

    async fn append_apology(&self, session_id: &str) {
        self.sessions
            .append_message(session_id, Message::assistant(config::IMAGE_APOLOGY, None))
            .await;
    }

    /// Chat path: an empty assistant message goes in immediately (so a
    /// pending indicator can render), then each arriving fragment is
    /// folded onto an accumulator and patched back in arrival order. An
    /// early error keeps whatever partial content is already committed.
    async fn run_chat_turn(&self, session_id: &str, prompt: &str) {
        let pending = Message::assistant("", None);
        let message_id = pending.id.clone();
        self.sessions.append_message(session_id, pending).await;

        let (tx, mut rx) = mpsc::channel::<StreamEvent>(64);

        let gateway = self.gateway.clone();
        let prompt = prompt.to_string();
        tokio::spawn(async move {
            if let Err(e) = gateway.stream_chat(&prompt, tx.clone()).await {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        let mut accumulated = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::Delta(fragment) => {
                    accumulated.push_str(&fragment);
                    self.sessions
                        .patch_message_content(session_id, &message_id, &accumulated)
                        .await;
                }
                StreamEvent::Done => break,
                StreamEvent::Error(error) => {
                    tracing::warn!("Chat stream ended early: {}", error);
                    break;
                }
            }
        }
    }

    /// Non-streaming chat path: the pending message fills in one patch.
    async fn run_completion_turn(&self, session_id: &str, prompt: &str) {
        let pending = Message::assistant("", None);
        let message_id = pending.id.clone();
        self.sessions.append_message(session_id, pending).await;

        match self.gateway.complete_chat(prompt).await {
            Ok(content) => {
                self.sessions
                    .patch_message_content(session_id, &message_id, &content)
                    .await;
            }
            Err(e) => {
                tracing::warn!("Chat completion failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::gateway::{GatewayError, ImageData};
    use crate::models::Role;
    use crate::services::events::ChangeNotifier;
    use crate::services::storage::Storage;

    #[derive(Default)]
    struct FakeGateway {
        fragments: Vec<String>,
        image: Mutex<Option<Result<Option<ImageData>, String>>>,
        stream_error_after: Option<usize>,
        calls: AtomicUsize,
        image_calls: AtomicUsize,
    }

    impl FakeGateway {
        fn streaming(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                ..Default::default()
            }
        }

        fn with_image(result: Result<Option<ImageData>, String>) -> Self {
            Self {
                image: Mutex::new(Some(result)),
                ..Default::default()
            }
        }

        fn total_calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiGateway for FakeGateway {
        async fn complete_chat(&self, _prompt: &str) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fragments.concat())
        }

        async fn stream_chat(
            &self,
            _prompt: &str,
            tx: mpsc::Sender<StreamEvent>,
        ) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (n, fragment) in self.fragments.iter().enumerate() {
                if self.stream_error_after == Some(n) {
                    let _ = tx.send(StreamEvent::Error("connection lost".into())).await;
                    return Ok(());
                }
                let _ = tx.send(StreamEvent::Delta(fragment.clone())).await;
            }
            let _ = tx.send(StreamEvent::Done).await;
            Ok(())
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _options: &ImageOptions,
        ) -> Result<Option<ImageData>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            match self.image.lock().unwrap().take() {
                Some(Ok(image)) => Ok(image),
                Some(Err(msg)) => Err(GatewayError::RequestFailed(msg)),
                None => Ok(None),
            }
        }

        async fn edit_image(
            &self,
            _source: &ImageData,
            _instruction: &str,
        ) -> Result<Option<ImageData>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn synthesize_speech(
            &self,
            _text: &str,
            _voice: &str,
        ) -> Result<Option<Vec<u8>>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    struct Fixture {
        controller: ChatController,
        sessions: Arc<SessionStore>,
        images: Arc<ImageHistory>,
        gateway: Arc<FakeGateway>,
    }

    async fn fixture(gateway: FakeGateway) -> (Fixture, String) {
        let storage = Storage::open_in_memory().unwrap();
        let notifier = ChangeNotifier::new();
        let sessions = Arc::new(SessionStore::new(storage.clone(), notifier.clone()));
        let images = Arc::new(ImageHistory::new(storage, notifier));
        let gateway = Arc::new(gateway);
        let session = sessions.create_session().await;
        let controller =
            ChatController::new(gateway.clone(), sessions.clone(), images.clone());
        (
            Fixture {
                controller,
                sessions,
                images,
                gateway,
            },
            session.id,
        )
    }

    fn png() -> ImageData {
        ImageData {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn empty_submit_is_a_noop() {
        let (fx, session_id) = fixture(FakeGateway::default()).await;

        fx.controller.submit(&session_id, "   ", None).await;

        assert_eq!(fx.sessions.session(&session_id).unwrap().messages.len(), 1);
        assert_eq!(fx.gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_session_makes_no_gateway_call() {
        let (fx, _) = fixture(FakeGateway::streaming(&["hi"])).await;

        fx.controller.submit("no-such-session", "hello", None).await;

        assert_eq!(fx.gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn chat_turn_streams_into_one_assistant_message() {
        let (fx, session_id) = fixture(FakeGateway::streaming(&["Hel", "lo", " world"])).await;

        fx.controller.submit(&session_id, "say hello", None).await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        // welcome, user turn, streamed reply
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "say hello");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Hello world");
    }

    #[tokio::test]
    async fn stream_error_keeps_partial_content() {
        let gateway = FakeGateway {
            fragments: vec!["Hel".into(), "lo".into()],
            stream_error_after: Some(1),
            ..Default::default()
        };
        let (fx, session_id) = fixture(gateway).await;

        fx.controller.submit(&session_id, "say hello", None).await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        assert_eq!(messages.last().unwrap().content, "Hel");
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn image_intent_appends_image_reply_and_records_history() {
        let (fx, session_id) = fixture(FakeGateway::with_image(Ok(Some(png())))).await;

        fx.controller
            .submit(&session_id, "generate a sunset over the sea", None)
            .await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        let reply = messages.last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, config::IMAGE_REPLY);
        assert!(reply.image.as_deref().unwrap().starts_with("data:image/png"));

        let history = fx.images.images();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "generate a sunset over the sea");
    }

    #[tokio::test]
    async fn null_image_result_appends_one_apology_and_no_history() {
        let (fx, session_id) = fixture(FakeGateway::with_image(Ok(None))).await;

        fx.controller
            .submit(&session_id, "generate a sunset", None)
            .await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.last().unwrap().content, config::IMAGE_APOLOGY);
        assert!(fx.images.images().is_empty());
    }

    #[tokio::test]
    async fn gateway_error_appends_apology() {
        let (fx, session_id) =
            fixture(FakeGateway::with_image(Err("boom".to_string()))).await;

        fx.controller
            .submit(&session_id, "generate a sunset", None)
            .await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        assert_eq!(messages.last().unwrap().content, config::IMAGE_APOLOGY);
        assert!(fx.images.images().is_empty());
    }

    #[tokio::test]
    async fn attachment_forces_chat_path() {
        let (fx, session_id) = fixture(FakeGateway::streaming(&["nice photo"])).await;

        fx.controller
            .submit(
                &session_id,
                "generate a caption",
                Some("data:image/png;base64,AQID".to_string()),
            )
            .await;

        assert_eq!(fx.gateway.image_calls.load(Ordering::SeqCst), 0);
        let messages = fx.sessions.session(&session_id).unwrap().messages;
        assert_eq!(messages[1].image.as_deref(), Some("data:image/png;base64,AQID"));
        assert_eq!(messages.last().unwrap().content, "nice photo");
    }

    #[tokio::test]
    async fn first_user_turn_titles_the_session() {
        let (fx, session_id) = fixture(FakeGateway::streaming(&["ok"])).await;

        fx.controller
            .submit(&session_id, "plan a trip to the coast", None)
            .await;

        let session = fx.sessions.session(&session_id).unwrap();
        assert_eq!(session.title, "plan a trip to the coast");
    }

    #[tokio::test]
    async fn keyword_match_is_case_insensitive_substring() {
        let (fx, _) = fixture(FakeGateway::default()).await;

        assert!(fx.controller.wants_image("Please GENERATE some art"));
        assert!(fx.controller.wants_image("could you create image of a dog"));
        // documented misfire of the substring heuristic
        assert!(fx
            .controller
            .wants_image("tell me how photosynthesis generates energy"));
        assert!(!fx.controller.wants_image("hello there"));
    }

    #[tokio::test]
    async fn non_streaming_turn_fills_reply_in_one_patch() {
        let (fx, session_id) = fixture(FakeGateway::streaming(&["Hello ", "world"])).await;
        let controller = fx.controller.with_streaming(false);

        controller.submit(&session_id, "say hello", None).await;

        let messages = fx.sessions.session(&session_id).unwrap().messages;
        assert_eq!(messages.last().unwrap().content, "Hello world");
        assert_eq!(fx.gateway.total_calls(), 1);
    }

    #[tokio::test]
    async fn keyword_set_is_configurable() {
        let (fx, _) = fixture(FakeGateway::default()).await;
        let controller = fx.controller.with_keywords(vec!["draw".to_string()]);

        assert!(controller.wants_image("draw me a map"));
        assert!(!controller.wants_image("generate a report"));
    }
}
