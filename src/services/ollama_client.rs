use crate::error::BackendError;
use crate::services::backend::GenerationBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Local backend: an Ollama server reached over its HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    probe_timeout: Duration,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateReq<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        probe_timeout: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            probe_timeout,
            timeout,
        }
    }

    fn classify(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(
                "Ollama request timed out. The model might be too slow or not loaded".to_string(),
            )
        } else if err.is_connect() {
            BackendError::Unreachable(
                "Ollama service is not running. Please start Ollama: \"ollama serve\"".to_string(),
            )
        } else {
            BackendError::Unknown(format!("Failed to generate MCQs with Ollama: {}", err))
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn is_available(&self) -> bool {
        match self
            .client
            .get(&self.base_url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(url = %self.base_url, "Ollama service is available");
                true
            }
            Ok(resp) => {
                tracing::warn!(
                    url = %self.base_url,
                    status = resp.status().as_u16(),
                    "Ollama service answered with an error status"
                );
                false
            }
            Err(e) => {
                tracing::warn!(url = %self.base_url, error = %e, "Ollama service is not available");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        tracing::info!(model = %self.model, "Sending request to Ollama");

        let body = GenerateReq {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.9,
                num_predict: 4096,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(format!(
                "Model \"{}\" not found. Please run: ollama pull {}",
                self.model, self.model
            )));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Unknown(format!(
                "Failed to generate MCQs with Ollama: status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: GenerateResp = resp.json().await.map_err(|e| self.classify(e))?;
        if parsed.response.trim().is_empty() {
            return Err(BackendError::Unknown(
                "Ollama returned an empty response".to_string(),
            ));
        }
        Ok(parsed.response)
    }
}
