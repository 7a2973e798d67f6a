use crate::config::Config;
use crate::error::BackendError;
use crate::models::mcq::BackendIdentity;
use crate::services::gemini_client::GeminiClient;
use crate::services::ollama_client::OllamaClient;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// A generation backend: one prompt in, raw generated text out. Implementations
/// never retry; retry and fallback policy belong to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Cheap readiness check used by backend detection and the status query.
    async fn is_available(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// The configured backends, addressed by `BackendIdentity`.
#[derive(Clone, Default)]
pub struct Backends {
    local: Option<Arc<dyn GenerationBackend>>,
    cloud: Option<Arc<dyn GenerationBackend>>,
}

impl Backends {
    pub fn new(
        local: Option<Arc<dyn GenerationBackend>>,
        cloud: Option<Arc<dyn GenerationBackend>>,
    ) -> Self {
        Self { local, cloud }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let local = config.local_backend().map(|(base_url, model)| {
            Arc::new(OllamaClient::new(
                client.clone(),
                base_url,
                model,
                config.probe_timeout,
                config.local_timeout,
            )) as Arc<dyn GenerationBackend>
        });

        let cloud = config.gemini_api_key.as_ref().map(|api_key| {
            Arc::new(GeminiClient::new(
                client.clone(),
                &config.gemini_base_url,
                &config.gemini_model,
                api_key,
                config.cloud_timeout,
            )) as Arc<dyn GenerationBackend>
        });

        if local.is_none() && cloud.is_none() {
            tracing::warn!(
                "No AI backend configured. Set OLLAMA_BASE_URL and OLLAMA_MODEL, or GEMINI_API_KEY"
            );
        }

        Self { local, cloud }
    }

    pub fn get(&self, identity: BackendIdentity) -> Option<&Arc<dyn GenerationBackend>> {
        match identity {
            BackendIdentity::Local => self.local.as_ref(),
            BackendIdentity::Cloud => self.cloud.as_ref(),
        }
    }

    pub fn is_configured(&self, identity: BackendIdentity) -> bool {
        self.get(identity).is_some()
    }
}
