use crate::models::mcq::{BackendIdentity, GenerationResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateFromTextPayload {
    #[validate(length(min = 1))]
    pub text: String,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMcqResponse {
    pub success: bool,
    pub mcqs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub count: usize,
    pub questions_found: usize,
    pub complete: bool,
    pub service: BackendIdentity,
    pub fallback: bool,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl GenerateMcqResponse {
    pub fn from_result(result: GenerationResult, filename: Option<String>) -> Self {
        Self {
            success: true,
            mcqs: result.raw_text,
            filename,
            count: result.requested_count,
            questions_found: result.questions_found,
            complete: result.complete,
            service: result.backend_used,
            fallback: result.is_fallback,
            generated_at: chrono::Utc::now(),
        }
    }
}
