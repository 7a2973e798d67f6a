use crate::error::BackendError;
use crate::services::backend::GenerationBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloud backend: Google's Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentReq<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartReq<'a>>,
}

#[derive(Serialize)]
struct PartReq<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResp>,
}

#[derive(Deserialize)]
struct PartResp {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    fn classify_transport(err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout("Gemini API request timed out".to_string())
        } else if err.is_connect() {
            BackendError::Unreachable(format!("Gemini API is unreachable: {}", err))
        } else {
            BackendError::Unknown(format!("Failed to generate MCQs from AI: {}", err))
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> BackendError {
        let lower = body.to_lowercase();
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || lower.contains("api key")
        {
            BackendError::InvalidCredentials(
                "Invalid or missing Gemini API key. Please check your .env file".to_string(),
            )
        } else if status == StatusCode::TOO_MANY_REQUESTS || lower.contains("quota") {
            BackendError::RateLimited("API quota exceeded. Please try again later".to_string())
        } else if lower.contains("blocked") {
            BackendError::ContentBlocked(
                "Content was blocked by safety filters. Try different content".to_string(),
            )
        } else if status == StatusCode::NOT_FOUND {
            BackendError::NotFound(format!("Gemini model not found: {}", body))
        } else {
            BackendError::Unknown(format!(
                "Failed to generate MCQs from AI: status {}: {}",
                status.as_u16(),
                body
            ))
        }
    }

    fn extract_text(resp: GenerateContentResp) -> Result<String, BackendError> {
        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(BackendError::ContentBlocked(format!(
                "Content was blocked by safety filters ({}). Try different content",
                reason
            )));
        }

        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Unknown("Gemini returned no candidates".to_string()))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(BackendError::ContentBlocked(
                "Content was blocked by safety filters. Try different content".to_string(),
            ));
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::Unknown(
                "Gemini returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    /// A non-empty key is all that is checked; validity shows up on first use.
    async fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        tracing::info!(model = %self.model, "Sending request to Gemini API");

        let body = GenerateContentReq {
            contents: vec![Content {
                role: "user",
                parts: vec![PartReq { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 8192,
            },
        };

        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = resp.status();
        let txt = resp.text().await.map_err(Self::classify_transport)?;
        if !status.is_success() {
            return Err(Self::classify_status(status, &txt));
        }

        let parsed: GenerateContentResp = serde_json::from_str(&txt).map_err(|e| {
            BackendError::Unknown(format!("Invalid Gemini response format: {}", e))
        })?;
        Self::extract_text(parsed)
    }
}
