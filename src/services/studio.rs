use std::sync::Arc;

use futures::future::join_all;

use crate::config;
use crate::gateway::{AiGateway, GatewayError, ImageData, ImageOptions};
use crate::models::GeneratedImage;
use crate::services::images::ImageHistory;

/// Standalone image tooling: style variations, generation with explicit
/// options, background removal.
pub struct ImageStudio {
    gateway: Arc<dyn AiGateway>,
    images: Arc<ImageHistory>,
}

impl ImageStudio {
    pub fn new(gateway: Arc<dyn AiGateway>, images: Arc<ImageHistory>) -> Self {
        Self { gateway, images }
    }

    /// One variation per fixed style, generated concurrently. Failed
    /// variations are dropped; survivors land in the history as one batch.
    pub async fn generate_variations(&self, prompt: &str) -> Vec<GeneratedImage> {
        let tasks = config::VARIATION_STYLES.iter().map(|style| {
            let styled = format!("{} in {} style", prompt, style);
            async move {
                match self
                    .gateway
                    .generate_image(&styled, &ImageOptions::default())
                    .await
                {
                    Ok(Some(image)) => Some((*style, image)),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!("Variation '{}' failed: {}", style, e);
                        None
                    }
                }
            }
        });

        let generated: Vec<GeneratedImage> = join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .map(|(style, image)| {
                GeneratedImage::new(image.to_data_url(), format!("{} ({})", prompt, style))
            })
            .collect();

        self.images.record_many(generated.clone()).await;
        generated
    }

    /// One generation with explicit aspect ratio and palette influence.
    pub async fn generate_advanced(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        palette_colors: &[String],
    ) -> Result<Option<GeneratedImage>, GatewayError> {
        let options = ImageOptions {
            aspect_ratio: Some(aspect_ratio.to_string()),
            palette_colors: palette_colors.to_vec(),
        };

        match self.gateway.generate_image(prompt, &options).await? {
            Some(image) => {
                let entry = GeneratedImage::new(image.to_data_url(), prompt).with_metadata(
                    serde_json::json!({
                        "aspectRatio": aspect_ratio,
                        "colors": palette_colors,
                    }),
                );
                self.images.record(entry.clone()).await;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Strip an image's background, returning the edited image. The result
    /// is handed back to the caller, not recorded in the history.
    pub async fn remove_background(
        &self,
        source: &ImageData,
    ) -> Result<Option<ImageData>, GatewayError> {
        self.gateway
            .edit_image(source, config::BG_REMOVAL_INSTRUCTION)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::gateway::StreamEvent;
    use crate::services::events::ChangeNotifier;
    use crate::services::storage::Storage;

    #[derive(Default)]
    struct RecordingGateway {
        prompts: Mutex<Vec<String>>,
        options: Mutex<Vec<ImageOptions>>,
        instructions: Mutex<Vec<String>>,
        fail_styles: Vec<String>,
    }

    fn png() -> ImageData {
        ImageData {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[async_trait]
    impl AiGateway for RecordingGateway {
        async fn complete_chat(&self, _prompt: &str) -> Result<String, GatewayError> {
            Ok(String::new())
        }

        async fn stream_chat(
            &self,
            _prompt: &str,
            _tx: mpsc::Sender<StreamEvent>,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn generate_image(
            &self,
            prompt: &str,
            options: &ImageOptions,
        ) -> Result<Option<ImageData>, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.options.lock().unwrap().push(options.clone());
            if self.fail_styles.iter().any(|s| prompt.contains(s.as_str())) {
                return Err(GatewayError::RequestFailed("style refused".into()));
            }
            Ok(Some(png()))
        }

        async fn edit_image(
            &self,
            _source: &ImageData,
            instruction: &str,
        ) -> Result<Option<ImageData>, GatewayError> {
            self.instructions.lock().unwrap().push(instruction.to_string());
            Ok(Some(png()))
        }

        async fn synthesize_speech(
            &self,
            _text: &str,
            _voice: &str,
        ) -> Result<Option<Vec<u8>>, GatewayError> {
            Ok(None)
        }
    }

    fn studio(gateway: RecordingGateway) -> (ImageStudio, Arc<ImageHistory>, Arc<RecordingGateway>) {
        let images = Arc::new(ImageHistory::new(
            Storage::open_in_memory().unwrap(),
            ChangeNotifier::new(),
        ));
        let gateway = Arc::new(gateway);
        (
            ImageStudio::new(gateway.clone(), images.clone()),
            images,
            gateway,
        )
    }

    #[tokio::test]
    async fn variations_cover_every_style() {
        let (studio, images, gateway) = studio(RecordingGateway::default());

        let generated = studio.generate_variations("a lighthouse").await;

        assert_eq!(generated.len(), config::VARIATION_STYLES.len());
        assert_eq!(images.images().len(), config::VARIATION_STYLES.len());

        let prompts = gateway.prompts.lock().unwrap();
        for style in config::VARIATION_STYLES {
            assert!(prompts
                .iter()
                .any(|p| p == &format!("a lighthouse in {} style", style)));
        }
    }

    #[tokio::test]
    async fn failed_variations_are_skipped() {
        let gateway = RecordingGateway {
            fail_styles: vec!["Cyberpunk".to_string()],
            ..Default::default()
        };
        let (studio, images, _) = studio(gateway);

        let generated = studio.generate_variations("a lighthouse").await;

        assert_eq!(generated.len(), config::VARIATION_STYLES.len() - 1);
        assert_eq!(images.images().len(), config::VARIATION_STYLES.len() - 1);
        assert!(generated.iter().all(|g| !g.prompt.contains("Cyberpunk")));
    }

    #[tokio::test]
    async fn advanced_generation_passes_options_and_records_metadata() {
        let (studio, images, gateway) = studio(RecordingGateway::default());

        let palette = vec!["#FF0000".to_string(), "#00FF00".to_string()];
        let entry = studio
            .generate_advanced("a poster", "16:9", &palette)
            .await
            .unwrap()
            .unwrap();

        let options = gateway.options.lock().unwrap();
        assert_eq!(options[0].aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(options[0].palette_colors, palette);

        assert_eq!(entry.metadata.as_ref().unwrap()["aspectRatio"], "16:9");
        assert_eq!(images.images().len(), 1);
    }

    #[tokio::test]
    async fn background_removal_uses_fixed_instruction_and_skips_history() {
        let (studio, images, gateway) = studio(RecordingGateway::default());

        let edited = studio.remove_background(&png()).await.unwrap();

        assert!(edited.is_some());
        assert_eq!(
            gateway.instructions.lock().unwrap()[0],
            config::BG_REMOVAL_INSTRUCTION
        );
        assert!(images.images().is_empty());
    }
}
