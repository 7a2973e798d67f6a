use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_QUESTION_COUNT: i64 = 10;
pub const MIN_QUESTION_COUNT: usize = 1;
pub const MAX_QUESTION_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendIdentity {
    Local,
    Cloud,
}

impl BackendIdentity {
    pub fn other(self) -> Self {
        match self {
            BackendIdentity::Local => BackendIdentity::Cloud,
            BackendIdentity::Cloud => BackendIdentity::Local,
        }
    }
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendIdentity::Local => write!(f, "local"),
            BackendIdentity::Cloud => write!(f, "cloud"),
        }
    }
}

/// Clamps any requested count into the supported range.
pub fn clamp_question_count(requested: i64) -> usize {
    requested.clamp(MIN_QUESTION_COUNT as i64, MAX_QUESTION_COUNT as i64) as usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    source_text: String,
    question_count: usize,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, requested_count: i64) -> Self {
        Self {
            source_text: source_text.into(),
            question_count: clamp_question_count(requested_count),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub raw_text: String,
    pub questions_found: usize,
    pub requested_count: usize,
    pub complete: bool,
    pub backend_used: BackendIdentity,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentBackend {
    Local,
    Cloud,
    Undetected,
}

impl From<Option<BackendIdentity>> for CurrentBackend {
    fn from(value: Option<BackendIdentity>) -> Self {
        match value {
            Some(BackendIdentity::Local) => CurrentBackend::Local,
            Some(BackendIdentity::Cloud) => CurrentBackend::Cloud,
            None => CurrentBackend::Undetected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub local_available: bool,
    pub cloud_available: bool,
    pub current_backend: CurrentBackend,
}
