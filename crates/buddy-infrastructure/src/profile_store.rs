//! File-backed learner profile persistence.
//!
//! The profile lives in a single TOML file under the user config directory
//! (`~/.config/study-buddy/profile.toml`). Saves are atomic: the new content
//! is written to a temporary file, fsynced, and renamed over the old one.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

use buddy_core::{BuddyError, LearnerProfile, ProfileStore, Result};

const PROFILE_FILE: &str = "profile.toml";

/// TOML file implementation of [`ProfileStore`].
pub struct TomlProfileStore {
    path: PathBuf,
}

impl TomlProfileStore {
    /// Creates a store rooted at the default user config location.
    ///
    /// # Errors
    ///
    /// Returns an error if the user config directory cannot be determined.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BuddyError::config("Could not determine user config directory"))?;
        Ok(Self {
            path: config_dir.join("study-buddy").join(PROFILE_FILE),
        })
    }

    /// Creates a store backed by an explicit file path. Used by tests.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| BuddyError::io("Profile path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| BuddyError::io("Profile path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

impl ProfileStore for TomlProfileStore {
    fn load(&self) -> Result<LearnerProfile> {
        if !self.path.exists() {
            return Ok(LearnerProfile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(LearnerProfile::default());
        }

        let profile: LearnerProfile = toml::from_str(&content)?;
        Ok(profile)
    }

    fn save(&self, profile: &LearnerProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(profile)?;

        // Write to temporary file in the same directory, then rename
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }
}
