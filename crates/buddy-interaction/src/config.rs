//! Configuration file management.
//!
//! Supports reading API credentials from
//! `~/.config/study-buddy/secret.json`, with environment-variable
//! overrides (`GEMINI_API_KEY`, `ELEVENLABS_API_KEY`). A missing file is
//! not an error: the config loads empty, the absence is logged at startup,
//! and requests later fail through the normal generation-failure path.

use std::fs;
use std::path::PathBuf;

use buddy_core::{BuddyError, Result};
use serde::Deserialize;

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub elevenlabs: Option<ElevenLabsConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// ElevenLabs text-to-speech API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ElevenLabsConfig {
    pub api_key: String,
}

impl SecretConfig {
    /// Loads the configuration from the default location and applies
    /// environment-variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Ok(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    BuddyError::config(format!(
                        "Failed to read configuration file at {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    BuddyError::config(format!(
                        "Failed to parse configuration file at {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            _ => Self::default(),
        };

        config.apply_overrides(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("ELEVENLABS_API_KEY").ok(),
        );
        Ok(config)
    }

    /// Applies explicit credential overrides on top of the file contents.
    pub fn apply_overrides(&mut self, gemini_key: Option<String>, elevenlabs_key: Option<String>) {
        if let Some(key) = gemini_key.filter(|k| !k.is_empty()) {
            match &mut self.gemini {
                Some(gemini) => gemini.api_key = key,
                None => {
                    self.gemini = Some(GeminiConfig {
                        api_key: key,
                        model_name: None,
                    })
                }
            }
        }
        if let Some(key) = elevenlabs_key.filter(|k| !k.is_empty()) {
            self.elevenlabs = Some(ElevenLabsConfig { api_key: key });
        }
    }

    /// True when a generation credential is configured.
    pub fn has_generation_credential(&self) -> bool {
        self.gemini
            .as_ref()
            .map(|g| !g.api_key.is_empty())
            .unwrap_or(false)
    }
}

/// Returns the path to the configuration file:
/// `~/.config/study-buddy/secret.json`
fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| BuddyError::config("Could not determine user config directory"))?;
    Ok(config_dir.join("study-buddy").join("secret.json"))
}
