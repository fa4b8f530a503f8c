//! Error types for the Study Buddy application.

use thiserror::Error;

/// A shared error type for the entire Study Buddy application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone)]
pub enum BuddyError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text-generation API failure
    #[error("Generation error: {message}")]
    Generation {
        status_code: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// Speech-synthesis API failure (other than quota exhaustion)
    #[error("Speech synthesis error: {0}")]
    Speech(String),

    /// The speech provider reported that the account quota is used up
    #[error("Speech synthesis quota exhausted")]
    SpeechQuotaExhausted,

    /// A host capability the feature needs is not present
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BuddyError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Generation error without HTTP status information
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            status_code: None,
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a Speech error
    pub fn speech(message: impl Into<String>) -> Self {
        Self::Speech(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if the speech provider reported quota exhaustion.
    ///
    /// The quota sub-case is distinguished because it permanently disables
    /// audio for the rest of the session, unlike transient speech failures.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::SpeechQuotaExhausted)
    }

    /// Check if this is a capability-absence error
    pub fn is_capability_unavailable(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_))
    }

    /// Check if the failed request could be retried manually.
    ///
    /// The turn coordinator never retries automatically; this only informs
    /// what the UI tells the user.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation { retryable: true, .. })
    }
}

impl From<std::io::Error> for BuddyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BuddyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BuddyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for BuddyError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, BuddyError>`.
pub type Result<T> = std::result::Result<T, BuddyError>;
