pub mod error;
pub mod message;
pub mod personality;
pub mod profile;

// Re-export common error type
pub use error::{BuddyError, Result};
pub use message::{AudioHandle, ChatMessage, MessageRole};
pub use personality::{Personality, PersonalityRegistry, DEFAULT_PERSONALITY_KEY};
pub use profile::{EducationLevel, LearnerProfile, ProfileStore};
