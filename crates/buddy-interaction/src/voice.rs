//! Voice input bridge.
//!
//! Wraps an optional host speech-recognition facility behind the
//! [`SpeechRecognizer`] trait and enforces the single-session rule: the
//! bridge is either `Idle` or `Listening`, and a toggle while listening
//! cancels the open session instead of starting a second one.

use std::sync::Arc;

use async_trait::async_trait;
use buddy_core::{BuddyError, Result};
use tokio::sync::Mutex;

/// A single-shot speech-to-text backend.
///
/// `transcribe_once` runs one non-continuous recognition session and
/// resolves with the final transcript (no interim results).
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the host environment provides speech recognition at all.
    fn is_available(&self) -> bool;

    /// Runs one recognition session and returns the final transcript.
    async fn transcribe_once(&self) -> Result<String>;

    /// Asks an open session to end early. Default is a no-op.
    fn cancel(&self) {}
}

/// Placeholder backend for hosts without speech recognition.
pub struct NullRecognizer;

#[async_trait]
impl SpeechRecognizer for NullRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn transcribe_once(&self) -> Result<String> {
        Err(BuddyError::CapabilityUnavailable("speech recognition"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenState {
    Idle,
    Listening,
}

/// Result of a `toggle_listening` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// A session completed; the transcript replaces (not appends to) the
    /// current input buffer.
    Transcript(String),
    /// An open session was cancelled.
    Stopped,
}

/// Gates access to the recognizer so only one session is ever active.
pub struct VoiceInputBridge {
    recognizer: Arc<dyn SpeechRecognizer>,
    state: Mutex<ListenState>,
}

impl VoiceInputBridge {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            state: Mutex::new(ListenState::Idle),
        }
    }

    /// True while a recognition session is open.
    pub async fn is_listening(&self) -> bool {
        *self.state.lock().await == ListenState::Listening
    }

    /// Starts a session when idle, or cancels the open one.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` immediately when the host has no
    /// speech recognition; the recognizer's own errors pass through after
    /// the listening flag has been reset.
    pub async fn toggle_listening(&self) -> Result<ListenOutcome> {
        if !self.recognizer.is_available() {
            return Err(BuddyError::CapabilityUnavailable("speech recognition"));
        }

        {
            let mut state = self.state.lock().await;
            if *state == ListenState::Listening {
                self.recognizer.cancel();
                *state = ListenState::Idle;
                return Ok(ListenOutcome::Stopped);
            }
            *state = ListenState::Listening;
        }

        // The state lock is not held across the session, so a concurrent
        // toggle can cancel it.
        let result = self.recognizer.transcribe_once().await;
        *self.state.lock().await = ListenState::Idle;

        result.map(ListenOutcome::Transcript)
    }
}
