pub mod agent;
pub mod config;
pub mod gemini;
pub mod playback;
pub mod prompt;
pub mod sanitize;
pub mod speech;
pub mod turn;
pub mod voice;

pub use agent::{GenerationAgent, GenerationRequest, InlineAttachment};
pub use config::SecretConfig;
pub use gemini::GeminiAgent;
pub use playback::{AudioOutput, NullAudioOutput, PlaybackController, RodioOutput};
pub use prompt::{build_prompt, HISTORY_WINDOW};
pub use sanitize::{clean_for_speech, truncate_reply, OUTPUT_CHAR_LIMIT};
pub use speech::{ElevenLabsSynthesizer, SpeechSynthesizer};
pub use turn::{ChatSession, TurnOutcome};
pub use voice::{ListenOutcome, NullRecognizer, SpeechRecognizer, VoiceInputBridge};
