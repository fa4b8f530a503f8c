//! Uploaded file loading.
//!
//! A file attached to a chat turn is read fully into memory and shipped
//! inline with the generation request (base64 at the wire layer). MIME type
//! is guessed from the file extension; the generation API is the final
//! arbiter of what it accepts.

use std::fs;
use std::path::Path;

use buddy_core::{BuddyError, Result};

/// A file the learner attached to the next chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original filename, kept for display
    pub name: String,
    /// MIME type guessed from the extension
    pub mime_type: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Reads a file from disk and guesses its MIME type.
    ///
    /// # Errors
    ///
    /// Returns a NotFound error when the path does not exist, or an IO
    /// error when the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BuddyError::not_found(
                "file",
                path.display().to_string(),
            ));
        }

        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }
}
