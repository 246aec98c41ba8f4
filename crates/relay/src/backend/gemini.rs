//! Gemini `generateContent` backend.

use super::{AttemptError, Backend};
use crate::{Credential, GenerationConfig, Prompt};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Recorded when an error response carries no message of its own.
const UNKNOWN_ERROR: &str = "Erro desconhecido";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a `generateContent` request.
///
/// Built once per orchestration and reused for every attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct ApiContent {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ApiPart {
    Text { text: String },
    InlineData { inline_data: ApiInlineData },
}

#[derive(Debug, Clone, Serialize)]
struct ApiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

impl GenerateRequest {
    pub fn new(prompt: &Prompt, generation: &GenerationConfig) -> Self {
        let mut parts = vec![ApiPart::Text {
            text: prompt.text.clone(),
        }];
        if let Some(image) = &prompt.image {
            parts.push(ApiPart::InlineData {
                inline_data: ApiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        Self {
            contents: vec![ApiContent { parts }],
            generation_config: ApiGenerationConfig {
                temperature: generation.temperature,
                max_output_tokens: generation.max_output_tokens,
            },
        }
    }

    /// The prompt text carried by this request.
    pub fn prompt_text(&self) -> &str {
        self.contents
            .iter()
            .flat_map(|c| &c.parts)
            .find_map(|part| match part {
                ApiPart::Text { text } => Some(text.as_str()),
                ApiPart::InlineData { .. } => None,
            })
            .unwrap_or_default()
    }
}

/// Classify a provider response.
///
/// The body must be JSON; anything else is a transport failure. Each field is
/// looked up on its own, so a field of an unexpected type only counts as
/// missing and never hides the others.
pub(crate) fn interpret(status: u16, body: &str) -> Result<String, AttemptError> {
    let response: Value = serde_json::from_str(body)
        .map_err(|e| AttemptError::Transport(format!("invalid response body: {e}")))?;

    if !(200..300).contains(&status) {
        let message = non_empty_str(&response, "/error/message")
            .unwrap_or(UNKNOWN_ERROR)
            .to_string();
        return Err(AttemptError::Api {
            status,
            message,
            code: response.pointer("/error/code").and_then(Value::as_i64),
        });
    }

    if let Some(reason) = non_empty_str(&response, "/promptFeedback/blockReason") {
        return Err(AttemptError::Blocked(reason.to_string()));
    }

    non_empty_str(&response, "/candidates/0/content/parts/0/text")
        .map(str::to_string)
        .ok_or(AttemptError::EmptyResponse)
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Render an error with its chain of causes, outermost first.
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    base_url: String,
}

impl Default for GeminiBackendBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiBackendBuilder {
    /// Point the backend at another host (a proxy or a local stub).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> GeminiBackend {
        GeminiBackend {
            client: reqwest::Client::new(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Gemini REST backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiBackend {
    pub fn builder() -> GeminiBackendBuilder {
        GeminiBackendBuilder::default()
    }

    // The key travels in the query string; never log the result.
    fn endpoint(&self, model: &str, credential: &Credential) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent?key={}",
            self.base_url,
            credential.expose()
        )
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.base_url)
    }
}

impl Backend for GeminiBackend {
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(self.endpoint(model, credential))
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(describe(&e.without_url())))?;

        let status = response.status().as_u16();
        debug!(model, status, "provider responded");

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transport(describe(&e.without_url())))?;

        interpret(status, &body)
    }
}
