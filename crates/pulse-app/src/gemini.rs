//! Gemini content provider.
//!
//! Calls the Gemini `generateContent` REST endpoint directly. Every failure
//! maps to a [`ContentError`]; the session turns those into fallback text, so
//! a missing key or a flaky network degrades to canned lines rather than
//! breaking a chat.

use async_trait::async_trait;
use pulse_core::{ContentError, ContentProvider, ContentRequest};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Content provider backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key stays out of logs
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Create a provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model in use.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ContentError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                ContentError::Unavailable(format!("gemini request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ContentError::Unavailable(format!("bad gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentError> {
        tracing::debug!(kind = ?request.kind, model = %self.model, "requesting generated text");
        let body = GenerateContentRequest::from_prompt(request.prompt());
        self.send_request(&body).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: String) -> Self {
        Self { contents: vec![Content { role: "user".to_string(), parts: vec![Part { text: prompt }] }] }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ContentError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or(ContentError::EmptyResponse)
}

fn map_http_error(status: StatusCode, body: &str) -> ContentError {
    let message = serde_json::from_str::<ErrorWrapper>(body).map_or_else(
        |_| body.to_string(),
        |wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() { msg } else { format!("{status_text}: {msg}") }
        },
    );

    ContentError::Http { status: status.as_u16(), message }
}
