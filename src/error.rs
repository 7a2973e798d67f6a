use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure of a single generation call against one backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Unreachable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ContentBlocked(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Unknown(String),
}

impl BackendError {
    /// Failures that say nothing about the request itself, only that the
    /// backend could not serve it right now.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unreachable(_) | BackendError::Timeout(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Unreachable(_) => "backend_unreachable",
            BackendError::Timeout(_) => "backend_timeout",
            BackendError::RateLimited(_) => "backend_rate_limited",
            BackendError::ContentBlocked(_) => "backend_content_blocked",
            BackendError::NotFound(_) => "backend_not_found",
            BackendError::InvalidCredentials(_) => "configuration",
            BackendError::Unknown(_) => "backend_unknown",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Extraction(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::InvalidInput(_) => "invalid_input",
            Error::ServiceUnavailable(_) => "service_unavailable",
            Error::Backend(err) => err.kind(),
            Error::Extraction(_) => "extraction",
            Error::BadRequest(_) | Error::Validation(_) | Error::Multipart(_) => "bad_request",
            Error::Internal(_) | Error::Io(_) => "internal",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let (status, error_message) = match &self {
            Error::InvalidInput(msg) | Error::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Extraction(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Error::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Error::Backend(err) => {
                let status = match err {
                    BackendError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    BackendError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                    BackendError::InvalidCredentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(kind, "{}", self);
        }

        let body = Json(json!({ "success": false, "error": error_message, "kind": kind }));
        (status, body).into_response()
    }
}
