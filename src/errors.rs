use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::services::reconciler::MalformedResponseError;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Model provider error: {0}")]
    Upstream(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::NotConfigured(_) => "NOT_CONFIGURED",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Maps a provider error message onto the error taxonomy. Quota and
    /// rate-limit failures are kept apart so the retry loop can back off.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("quota") || lowered.contains("rate limit") || lowered.contains("429")
        {
            AppError::RateLimited(message)
        } else {
            AppError::Upstream(message)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedResponse(_)
            | AppError::RateLimited(_)
            | AppError::Upstream(_)
            | AppError::ExternalService(_)
            | AppError::NotConfigured(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::ExternalService(format!("request timed out: {}", err))
        } else {
            AppError::ExternalService(err.to_string())
        }
    }
}
impl From<MalformedResponseError> for AppError {
    fn from(err: MalformedResponseError) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
