use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Raw model output kept on `MalformedOutput` is cut to this many characters.
pub const RAW_OUTPUT_PREVIEW_CHARS: usize = 2000;

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error (status {}): {body}", display_status(.status))]
    BackendError { status: Option<u16>, body: String },

    #[error("Malformed model output: {message}")]
    MalformedOutput { message: String, raw: String },

    #[error("Schema violation in item {item}: {detail}")]
    SchemaViolation { item: usize, detail: String },

    #[error("Every generated candidate duplicated existing questions")]
    ExhaustedCandidates,

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Builds a `MalformedOutput`, keeping only a prefix of the raw text.
    pub fn malformed(message: impl Into<String>, raw: &str, preview_chars: usize) -> Self {
        AppError::MalformedOutput {
            message: message.into(),
            raw: raw.chars().take(preview_chars).collect(),
        }
    }

    pub fn schema(item: usize, detail: impl Into<String>) -> Self {
        AppError::SchemaViolation {
            item,
            detail: detail.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BackendError { .. } => "BACKEND_ERROR",
            AppError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
            AppError::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            AppError::ExhaustedCandidates => "EXHAUSTED_CANDIDATES",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BackendError { .. } => StatusCode::BAD_GATEWAY,
            AppError::MalformedOutput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SchemaViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExhaustedCandidates => StatusCode::CONFLICT,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let raw = match self {
            AppError::MalformedOutput { raw, .. } => Some(raw.clone()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.status_code().as_u16(),
            kind: self.error_code(),
            raw,
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::BackendError {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
