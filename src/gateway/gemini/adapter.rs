use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tokio::sync::mpsc;

use super::models::*;
use super::stream::pump_sse_stream;
use crate::config;
use crate::gateway::traits::AiGateway;
use crate::gateway::types::{GatewayError, ImageData, ImageOptions, StreamEvent};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiGateway {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiGateway {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse an API error response body into a user-friendly message.
    fn parse_error_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(msg) = parsed["error"]["message"].as_str() {
                return format!("HTTP {}: {}", status.as_u16(), msg);
            }
        }
        format!("HTTP {}: Request failed", status.as_u16())
    }

    fn system_instruction() -> GeminiContent {
        GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: Some(config::SYSTEM_INSTRUCTION.to_string()),
                ..Default::default()
            }],
        }
    }

    fn user_content(parts: Vec<GeminiPart>) -> Vec<GeminiContent> {
        vec![GeminiContent {
            role: "user".to_string(),
            parts,
        }]
    }

    fn text_part(text: &str) -> GeminiPart {
        GeminiPart {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    async fn post(
        &self,
        model: &str,
        method: &str,
        request: &GeminiRequest,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}/models/{}:{}", self.base_url, model, method);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GatewayError::Auth("Invalid API key".to_string()));
        }

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited {
                retry_after_secs: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(Self::parse_error_message(
                status, &body,
            )));
        }

        Ok(response)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GatewayError> {
        let response = self.post(model, "generateContent", request).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(GatewayError::RequestFailed(
                error.message.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(body)
    }

    /// First inline binary payload of the response, if the model returned one.
    fn first_inline_payload(body: GeminiResponse) -> Result<Option<ImageData>, GatewayError> {
        let parts = body
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(inline) = part.inline_data {
                return ImageData::from_base64(inline.mime_type, &inline.data).map(Some);
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn complete_chat(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = GeminiRequest {
            contents: Self::user_content(vec![Self::text_part(prompt)]),
            system_instruction: Some(Self::system_instruction()),
            generation_config: None,
        };

        let body = self.generate(config::CHAT_MODEL, &request).await?;

        body.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().filter_map(|p| p.text).next())
            .ok_or_else(|| GatewayError::InvalidResponse("No content in response".to_string()))
    }

    async fn stream_chat(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), GatewayError> {
        let request = GeminiRequest {
            contents: Self::user_content(vec![Self::text_part(prompt)]),
            system_instruction: Some(Self::system_instruction()),
            generation_config: None,
        };

        let response = self
            .post(config::CHAT_MODEL, "streamGenerateContent?alt=sse", &request)
            .await?;

        pump_sse_stream(response, tx).await;

        Ok(())
    }

    async fn generate_image(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Option<ImageData>, GatewayError> {
        let mut final_prompt = prompt.to_string();
        if !options.palette_colors.is_empty() {
            final_prompt.push_str(&format!(
                ". Use a color palette primarily consisting of: {}.",
                options.palette_colors.join(", ")
            ));
        }

        let request = GeminiRequest {
            contents: Self::user_content(vec![Self::text_part(&final_prompt)]),
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: options.aspect_ratio.clone().unwrap_or_else(|| "1:1".into()),
                }),
                ..Default::default()
            }),
        };

        let body = self.generate(config::IMAGE_MODEL, &request).await?;
        Self::first_inline_payload(body)
    }

    async fn edit_image(
        &self,
        source: &ImageData,
        instruction: &str,
    ) -> Result<Option<ImageData>, GatewayError> {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&source.data);
        let request = GeminiRequest {
            contents: Self::user_content(vec![
                GeminiPart {
                    inline_data: Some(GeminiInlineData {
                        mime_type: source.mime_type.clone(),
                        data: b64,
                    }),
                    ..Default::default()
                },
                Self::text_part(instruction),
            ]),
            system_instruction: None,
            generation_config: None,
        };

        let body = self.generate(config::IMAGE_MODEL, &request).await?;
        Self::first_inline_payload(body)
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Option<Vec<u8>>, GatewayError> {
        let request = GeminiRequest {
            contents: Self::user_content(vec![Self::text_part(text)]),
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        let body = self.generate(config::SPEECH_MODEL, &request).await?;

        match Self::first_inline_payload(body)? {
            Some(audio) => Ok(Some(audio.data)),
            None => Ok(None),
        }
    }
}
