//! Text-generation collaborator boundary.
//!
//! The turn coordinator talks to the generation backend only through the
//! [`GenerationAgent`] trait, so tests can substitute recording fakes and
//! the HTTP implementation stays swappable.

use async_trait::async_trait;
use buddy_core::Result;
use buddy_infrastructure::UploadedFile;

/// Binary content shipped inline with a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    /// MIME type of the content (e.g. "application/pdf")
    pub mime_type: String,
    /// Raw bytes; base64-encoded at the wire layer
    pub data: Vec<u8>,
}

impl From<UploadedFile> for InlineAttachment {
    fn from(file: UploadedFile) -> Self {
        Self {
            mime_type: file.mime_type,
            data: file.bytes,
        }
    }
}

/// One generation request: an opaque prompt plus at most one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub attachment: Option<InlineAttachment>,
}

impl GenerationRequest {
    /// Creates a text-only request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment: None,
        }
    }

    /// Attaches inline binary content to the request.
    pub fn with_attachment(mut self, attachment: InlineAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// A backend that turns a prompt (plus optional attachment) into reply text.
#[async_trait]
pub trait GenerationAgent: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}
