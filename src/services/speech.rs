use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::config;
use crate::gateway::AiGateway;
use crate::models::voice::{find_voice, DEFAULT_VOICE};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Malformed audio payload: {0}")]
    Decode(String),

    #[error("Audio output failed: {0}")]
    Output(String),
}

/// Decode the gateway's compact wire format (16-bit little-endian PCM,
/// single channel) into playable samples.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<i16>, PlaybackError> {
    if bytes.len() % 2 != 0 {
        return Err(PlaybackError::Decode(format!(
            "PCM16 payload has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Audio output seam. The default implementation shells out to host
/// players; a GUI presentation layer can substitute its own sink.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play mono PCM samples to completion, or until `cancel` fires.
    async fn play_pcm(
        &self,
        samples: Vec<i16>,
        sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<(), PlaybackError>;

    /// Degraded substitute: speak `text` with the host platform's local
    /// text-to-speech.
    async fn speak_text(&self, text: &str, cancel: CancellationToken)
        -> Result<(), PlaybackError>;
}

/// Plays raw PCM through `aplay` and falls back to `spd-say` for local
/// speech synthesis.
pub struct ProcessPlayer;

#[async_trait]
impl AudioPlayer for ProcessPlayer {
    async fn play_pcm(
        &self,
        samples: Vec<i16>,
        sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<(), PlaybackError> {
        // kill_on_drop: cancellation drops the child and silences it
        let mut child = tokio::process::Command::new("aplay")
            .args(["-q", "-t", "raw", "-f", "S16_LE", "-c", "1", "-r"])
            .arg(sample_rate.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Output(format!("Failed to start aplay: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlaybackError::Output("aplay stdin unavailable".to_string()))?;

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in &samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        let playback = async {
            stdin.write_all(&bytes).await?;
            drop(stdin); // close the pipe so the player drains and exits
            child.wait().await
        };
        tokio::pin!(playback);

        tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            result = &mut playback => match result {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(PlaybackError::Output(format!(
                    "aplay exited with {}",
                    status
                ))),
                Err(e) => Err(PlaybackError::Output(e.to_string())),
            },
        }
    }

    async fn speak_text(
        &self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<(), PlaybackError> {
        let mut child = tokio::process::Command::new("spd-say")
            .arg("--wait")
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Output(format!("Failed to start spd-say: {}", e)))?;

        tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            result = child.wait() => match result {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(PlaybackError::Output(format!(
                    "spd-say exited with {}",
                    status
                ))),
                Err(e) => Err(PlaybackError::Output(e.to_string())),
            },
        }
    }
}

struct ActivePlayback {
    generation: u64,
    token: CancellationToken,
}

/// Speaks assistant text aloud. `toggle` is the whole contract: a call
/// while idle starts playback, a call while speaking cancels it. Only one
/// playback is ever active.
pub struct SpeechController {
    gateway: Arc<dyn AiGateway>,
    player: Arc<dyn AudioPlayer>,
    voice: Mutex<String>,
    current: Mutex<Option<ActivePlayback>>,
    generations: AtomicU64,
}

impl SpeechController {
    pub fn new(gateway: Arc<dyn AiGateway>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            gateway,
            player,
            voice: Mutex::new(DEFAULT_VOICE.to_string()),
            current: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// Switch the synthesis voice; unknown names are ignored.
    pub fn set_voice(&self, name: &str) {
        match find_voice(name) {
            Some(voice) => *self.voice.lock().unwrap() = voice.name.to_string(),
            None => tracing::warn!("Unknown voice '{}'", name),
        }
    }

    pub fn voice(&self) -> String {
        self.voice.lock().unwrap().clone()
    }

    pub fn is_speaking(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    pub async fn toggle(&self, text: &str) {
        let (generation, token) = {
            let mut current = self.current.lock().unwrap();
            if let Some(active) = current.take() {
                active.token.cancel();
                return;
            }
            let generation = self.generations.fetch_add(1, Ordering::SeqCst);
            let token = CancellationToken::new();
            *current = Some(ActivePlayback {
                generation,
                token: token.clone(),
            });
            (generation, token)
        };

        let voice = self.voice();
        let result = match self.gateway.synthesize_speech(text, &voice).await {
            Ok(Some(bytes)) => match decode_pcm16(&bytes) {
                Ok(samples) => {
                    self.player
                        .play_pcm(samples, config::TTS_SAMPLE_RATE, token.clone())
                        .await
                }
                Err(e) => {
                    tracing::warn!("Audio decode failed, using local speech: {}", e);
                    self.player.speak_text(text, token.clone()).await
                }
            },
            Ok(None) => self.player.speak_text(text, token.clone()).await,
            Err(e) => {
                tracing::warn!("Speech synthesis failed, using local speech: {}", e);
                self.player.speak_text(text, token.clone()).await
            }
        };

        if let Err(e) = result {
            tracing::error!("Speech playback failed: {}", e);
        }

        // Back to idle, unless a newer playback already owns the slot
        let mut current = self.current.lock().unwrap();
        if current.as_ref().is_some_and(|a| a.generation == generation) {
            *current = None;
        }
    }
}
