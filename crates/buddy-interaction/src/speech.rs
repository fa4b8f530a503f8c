//! Speech-synthesis collaborator boundary and ElevenLabs implementation.
//!
//! Synthesis is best-effort: the turn completes without audio on any
//! failure. Quota exhaustion is the one distinguished sub-case, because the
//! caller reacts to it (auto-play is disabled for the rest of the session).

use async_trait::async_trait;
use buddy_core::{AudioHandle, BuddyError, Result};
use reqwest::Client;
use serde::Serialize;

/// Audio container/bitrate requested from the speech service.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

const BASE_URL: &str = "https://api.elevenlabs.io";

/// Error-body substring the provider uses to report an exhausted quota.
const QUOTA_MARKER: &str = "quota_exceeded";

/// A backend that turns reply text into a playable audio handle.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioHandle>;
}

/// ElevenLabs text-to-speech client.
#[derive(Clone)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
    output_format: String,
}

impl ElevenLabsSynthesizer {
    /// Creates a new synthesizer with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    /// Overrides the endpoint base URL. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioHandle> {
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.base_url);

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&TextToSpeechRequest {
                text,
                voice_settings: VoiceSettings {},
                output_format: &self.output_format,
            })
            .send()
            .await
            .map_err(|err| BuddyError::speech(format!("Speech API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if body.contains(QUOTA_MARKER) {
                return Err(BuddyError::SpeechQuotaExhausted);
            }
            return Err(BuddyError::speech(format!(
                "Speech API returned HTTP {status}: {body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| BuddyError::speech(format!("Failed to read audio body: {err}")))?;

        Ok(AudioHandle::new(bytes.to_vec()))
    }
}

#[derive(Serialize)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
    output_format: &'a str,
}

#[derive(Serialize)]
struct VoiceSettings {}
