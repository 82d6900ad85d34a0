use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::inference::InferenceError;
use crate::recipes::extract::{ExtractionError, ParseError, ValidationError};

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request-level failure. Only the `Display` text of each variant reaches the
/// client; the wrapped sources are for logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Auth(&'static str),

    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Failed to generate recipe. The service may be temporarily unavailable. Please try again.")]
    InferenceUnavailable(#[source] InferenceError),

    #[error("Failed to parse recipe from AI response. Please try again.")]
    Parse(#[source] ParseError),

    #[error("AI generated invalid recipe format. Please try again.")]
    Validation(#[source] ValidationError),

    #[error("{context}")]
    Persistence {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn persistence(context: &'static str, source: anyhow::Error) -> Self {
        Self::Persistence { context, source }
    }

    pub fn internal(context: &'static str, source: anyhow::Error) -> Self {
        Self::Internal { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InferenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Parse(_)
            | Self::Validation(_)
            | Self::Persistence { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InferenceError> for AppError {
    fn from(e: InferenceError) -> Self {
        Self::InferenceUnavailable(e)
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Parse(p) => Self::Parse(p),
            ExtractionError::Validation(v) => Self::Validation(v),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
