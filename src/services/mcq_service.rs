use crate::config::Config;
use crate::error::{BackendError, Error, Result};
use crate::models::mcq::{
    BackendIdentity, GenerationRequest, GenerationResult, ServiceStatus,
};
use crate::services::backend::Backends;
use crate::services::chunk_service::{chunk_text, combine_leading_chunks};
use crate::services::prompt_service::build_prompt;
use crate::services::response_validator;
use crate::services::selector_service::ServiceSelector;
use std::sync::Arc;

/// Entry point for MCQ generation: chunking, backend selection, the single
/// fallback hop and output validation.
#[derive(Clone)]
pub struct McqService {
    backends: Backends,
    selector: Arc<ServiceSelector>,
    max_chunk_size: usize,
    min_text_length: usize,
}

impl McqService {
    pub fn new(
        backends: Backends,
        selector: Arc<ServiceSelector>,
        max_chunk_size: usize,
        min_text_length: usize,
    ) -> Self {
        Self {
            backends,
            selector,
            max_chunk_size,
            min_text_length,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            Backends::from_config(config, client),
            Arc::new(ServiceSelector::new()),
            config.max_chunk_size,
            config.min_text_length,
        )
    }

    pub fn selector(&self) -> &ServiceSelector {
        &self.selector
    }

    pub async fn generate(
        &self,
        source_text: &str,
        requested_count: i64,
    ) -> Result<GenerationResult> {
        let request = GenerationRequest::new(source_text, requested_count);
        self.check_source_text(request.source_text())?;

        let chunks = chunk_text(request.source_text(), self.max_chunk_size);
        if chunks.is_empty() {
            return Err(Error::InvalidInput(
                "No text could be extracted from the document".to_string(),
            ));
        }
        tracing::info!(chunks = chunks.len(), "Text divided into chunk(s)");

        let prompt = build_prompt(&combine_leading_chunks(&chunks), request.question_count());
        let primary = self.selector.resolve(&self.backends).await?;
        tracing::info!(backend = %primary, count = request.question_count(), "Generating MCQs");

        let (raw_text, backend_used, is_fallback) = match self.attempt(primary, &prompt).await {
            Ok(text) => (text, primary, false),
            Err(err) => {
                let fallback = self.fallback_for(primary, &err).ok_or(err)?;
                tracing::warn!(from = %primary, to = %fallback, "Primary AI backend failed, attempting fallback");
                self.selector.fall_back_from(primary);
                let text = self.attempt(fallback, &prompt).await.map_err(|e| {
                    tracing::error!(backend = %fallback, error = %e, "Fallback AI backend also failed");
                    e
                })?;
                (text, fallback, true)
            }
        };

        let report = response_validator::validate(&raw_text, request.question_count());
        tracing::info!(
            requested = request.question_count(),
            actual = report.questions_found,
            backend = %backend_used,
            fallback = is_fallback,
            "MCQs generated"
        );
        if !report.complete {
            tracing::warn!(
                "AI generated fewer questions than requested ({}/{})",
                report.questions_found,
                request.question_count()
            );
        }

        Ok(GenerationResult {
            raw_text,
            questions_found: report.questions_found,
            requested_count: request.question_count(),
            complete: report.complete,
            backend_used,
            is_fallback,
        })
    }

    /// Live view of both backends plus the cached choice. Does not touch the
    /// cache.
    pub async fn status(&self) -> ServiceStatus {
        let local_available = match self.backends.get(BackendIdentity::Local) {
            Some(local) => local.is_available().await,
            None => false,
        };
        let cloud_available = match self.backends.get(BackendIdentity::Cloud) {
            Some(cloud) => cloud.is_available().await,
            None => false,
        };

        ServiceStatus {
            local_available,
            cloud_available,
            current_backend: self.selector.current().into(),
        }
    }

    fn check_source_text(&self, text: &str) -> Result<()> {
        let len = text.trim().chars().count();
        if len == 0 {
            return Err(Error::InvalidInput(
                "No text could be extracted from the document".to_string(),
            ));
        }
        if len < self.min_text_length {
            return Err(Error::InvalidInput(
                "Document content is too short. Please upload a document with more text."
                    .to_string(),
            ));
        }
        Ok(())
    }

    async fn attempt(
        &self,
        identity: BackendIdentity,
        prompt: &str,
    ) -> std::result::Result<String, BackendError> {
        let backend = self.backends.get(identity).ok_or_else(|| {
            BackendError::Unreachable(format!("The {} backend is not configured", identity))
        })?;
        backend.generate(prompt).await.map_err(|e| {
            tracing::error!(backend = %identity, error = %e, "AI backend call failed");
            e
        })
    }

    /// Only a transient local failure falls back, and only to a configured
    /// cloud backend.
    fn fallback_for(&self, failed: BackendIdentity, err: &BackendError) -> Option<BackendIdentity> {
        if failed != BackendIdentity::Local || !err.is_transient() {
            return None;
        }
        let candidate = failed.other();
        if self.backends.is_configured(candidate) {
            Some(candidate)
        } else {
            tracing::warn!("Gemini fallback not available (no API key)");
            None
        }
    }
}
