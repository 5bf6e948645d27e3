use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::models::GeminiResponse;
use crate::gateway::types::StreamEvent;

/// Incremental SSE framing over raw response bytes. Chunks may split UTF-8
/// sequences and SSE events arbitrarily, so both are buffered until whole.
#[derive(Default)]
pub struct SseParser {
    byte_buf: Vec<u8>,
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the `data:` payloads of every SSE
    /// event completed by it, in order.
    pub fn push(&mut self, chunk: &Bytes) -> Vec<String> {
        self.byte_buf.extend_from_slice(chunk);

        // Decode as much valid UTF-8 as possible from the byte buffer
        let decoded = match std::str::from_utf8(&self.byte_buf) {
            Ok(s) => {
                let decoded = s.to_string();
                self.byte_buf.clear();
                decoded
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to == 0 {
                    return Vec::new();
                }
                let decoded = String::from_utf8_lossy(&self.byte_buf[..valid_up_to]).into_owned();
                self.byte_buf.drain(..valid_up_to);
                decoded
            }
        };

        // The API uses \r\n line endings; normalize before framing
        self.buffer.push_str(&decoded.replace("\r\n", "\n"));

        let mut payloads = Vec::new();
        while let Some(event_end) = self.buffer.find("\n\n") {
            let event_text = self.buffer[..event_end].to_string();
            self.buffer.drain(..event_end + 2);

            let mut data = String::new();
            for line in event_text.lines() {
                if let Some(payload) = line.strip_prefix("data: ") {
                    data.push_str(payload);
                } else if let Some(payload) = line.strip_prefix("data:") {
                    data.push_str(payload);
                }
            }

            if !data.is_empty() {
                payloads.push(data);
            }
        }
        payloads
    }
}

/// Drain a streamed `generateContent` response, forwarding each text part
/// as a `Delta` and closing with `Done`. Parse failures on individual
/// events are skipped; an error payload ends the stream.
pub async fn pump_sse_stream(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut stream = response.bytes_stream();
    let mut parser = SseParser::new();

    while let Some(chunk_result) = stream.next().await {
        let bytes = match chunk_result {
            Ok(b) => b,
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Error(format!("Stream error: {}", e)))
                    .await;
                return;
            }
        };

        for data in parser.push(&bytes) {
            match serde_json::from_str::<GeminiResponse>(&data) {
                Ok(response) => {
                    if let Some(error) = &response.error {
                        let msg = error
                            .message
                            .clone()
                            .unwrap_or_else(|| "Unknown error".to_string());
                        let _ = tx.send(StreamEvent::Error(msg)).await;
                        return;
                    }

                    for text in text_parts(&response) {
                        if tx.send(StreamEvent::Delta(text)).await.is_err() {
                            return; // receiver dropped
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to parse SSE data: {}", e);
                    // Don't abort on parse errors - partial events may occur
                }
            }
        }
    }

    let _ = tx.send(StreamEvent::Done).await;
}

fn text_parts(response: &GeminiResponse) -> Vec<String> {
    let mut texts = Vec::new();
    if let Some(candidates) = &response.candidates {
        if let Some(candidate) = candidates.first() {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    if let Some(text) = &part.text {
                        texts.push(text.clone());
                    }
                }
            }
        }
    }
    texts
}
