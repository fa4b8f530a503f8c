//! Learner profile domain model.
//!
//! The profile carries the learner context (topic, education level, grade)
//! that the prompt builder injects into every generation request. It is
//! created empty, updated by the setup flow, and persisted write-through by
//! a [`ProfileStore`] implementation.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Fixed enumeration of supported education levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EducationLevel {
    Elementary,
    MiddleSchool,
    HighSchool,
    Undergraduate,
    Graduate,
    Professional,
}

impl EducationLevel {
    /// Human-readable label for pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Elementary => "Elementary School",
            Self::MiddleSchool => "Middle School",
            Self::HighSchool => "High School",
            Self::Undergraduate => "Undergraduate",
            Self::Graduate => "Graduate",
            Self::Professional => "Professional",
        }
    }
}

/// The learner context injected into prompts.
///
/// An absent stored entry behaves as an empty field, so the default value
/// doubles as the "nothing saved yet" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Main topic the learner wants to study
    #[serde(default)]
    pub topic: String,
    /// Education level, one of the fixed enumeration, or unset
    #[serde(default)]
    pub education: Option<EducationLevel>,
    /// Optional free-text grade or academic year
    #[serde(default)]
    pub grade: String,
}

impl LearnerProfile {
    /// A profile is complete only when both topic and education level are
    /// set. Completeness gates progression from setup to chat.
    pub fn is_complete(&self) -> bool {
        !self.topic.trim().is_empty() && self.education.is_some()
    }

    /// True when every field is empty (nothing worth rendering).
    pub fn is_empty(&self) -> bool {
        self.topic.is_empty() && self.education.is_none() && self.grade.is_empty()
    }
}

/// Persistence boundary for the learner profile.
///
/// Implementations read the stored profile at chat start and write through
/// on every save. A missing store reads as the default (empty) profile.
pub trait ProfileStore: Send + Sync {
    /// Loads the stored profile, or the empty profile if none was saved.
    fn load(&self) -> crate::Result<LearnerProfile>;

    /// Persists the profile, overwriting any previous value.
    fn save(&self, profile: &LearnerProfile) -> crate::Result<()>;
}
