//! GeminiAgent - Direct REST implementation of the generation boundary.
//!
//! Calls the Gemini `generateContent` endpoint with the assembled prompt
//! and, when the learner attached a file, one inline-data part carrying the
//! base64-encoded bytes and MIME type.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use buddy_core::{BuddyError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::agent::{GenerationAgent, GenerationRequest};
use crate::config::SecretConfig;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Builds an agent from the loaded secret configuration.
    ///
    /// A missing credential yields an agent with an empty key: requests will
    /// fail through the normal generation-failure path, which is the
    /// documented behavior for absent configuration.
    pub fn from_config(config: &SecretConfig) -> Self {
        let (api_key, model) = match &config.gemini {
            Some(gemini) => (
                gemini.api_key.clone(),
                gemini
                    .model_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            ),
            None => (String::new(), DEFAULT_GEMINI_MODEL.to_string()),
        };
        Self::new(api_key, model)
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the endpoint base URL. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_parts(&self, request: &GenerationRequest) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        if !request.prompt.trim().is_empty() {
            parts.push(Part::Text {
                text: request.prompt.clone(),
            });
        }

        if let Some(attachment) = &request.attachment {
            parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: attachment.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&attachment.data),
                },
            });
        }

        if parts.is_empty() {
            return Err(BuddyError::generation(
                "Gemini request must include text or an attachment",
            ));
        }

        Ok(parts)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| BuddyError::Generation {
                status_code: None,
                message: format!("Gemini API request failed: {err}"),
                retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            BuddyError::generation(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl GenerationAgent for GeminiAgent {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: self.build_parts(&request)?,
            }],
        };
        self.send_request(&body).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            BuddyError::generation("Gemini API returned no text in the response candidates")
        })
}

fn map_http_error(status: StatusCode, body: String) -> BuddyError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    BuddyError::Generation {
        status_code: Some(status.as_u16()),
        message,
        retryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_extracts_message_from_json_body() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#
                .to_string(),
        );
        match err {
            BuddyError::Generation {
                status_code,
                message,
                retryable,
            } => {
                assert_eq!(status_code, Some(400));
                assert_eq!(message, "INVALID_ARGUMENT: API key not valid");
                assert!(!retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, "busy".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_request_is_rejected() {
        let agent = GeminiAgent::new("key", DEFAULT_GEMINI_MODEL);
        let result = agent.build_parts(&GenerationRequest::text("   "));
        assert!(result.is_err());
    }

    #[test]
    fn no_candidates_is_an_error() {
        let response = GenerateContentResponse { candidates: None };
        assert!(extract_text_response(response).is_err());
    }
}
