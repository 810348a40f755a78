//! Error types for DocChat
//!
//! Provides one error enum for the whole request path with:
//! - Distinct variants for each failure mode (load, template, persist, network, backend, decode)
//! - HTTP status code mapping
//! - A `{"error": "<message>"}` response body
//! - Error kinds for logging and metrics labels

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error kinds for machine-readable error identification.
///
/// Kinds never reach the wire; they label log lines and metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Startup
    LoadError,

    // Request preparation
    ValidationError,
    TemplateError,
    PersistError,

    // Generation backend
    NetworkError,
    BackendStatusError,
    DecodeError,

    // Internal
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Stable lowercase label for metrics
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorCode::LoadError => "load",
            ErrorCode::ValidationError => "validation",
            ErrorCode::TemplateError => "template",
            ErrorCode::PersistError => "persist",
            ErrorCode::NetworkError => "network",
            ErrorCode::BackendStatusError => "backend_status",
            ErrorCode::DecodeError => "decode",
            ErrorCode::InternalError => "internal",
            ErrorCode::ConfigurationError => "configuration",
            ErrorCode::SerializationError => "serialization",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Corpus build errors
    #[error("Failed to load document corpus at {path}: {message}")]
    Load { path: String, message: String },

    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // Prompt preparation errors
    #[error("Error reading prompt template: {message}")]
    Template { message: String },

    #[error("Error saving prompt: {message}")]
    Persist { message: String },

    // Generation backend errors
    #[error("Error making request: {message}")]
    Network { message: String },

    #[error("Unexpected status code: {status}")]
    BackendStatus { status: u16 },

    #[error("Error decoding response stream: {message}")]
    Decode { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error kind for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Load { .. } => ErrorCode::LoadError,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Template { .. } => ErrorCode::TemplateError,
            AppError::Persist { .. } => ErrorCode::PersistError,
            AppError::Network { .. } => ErrorCode::NetworkError,
            AppError::BackendStatus { .. } => ErrorCode::BackendStatusError,
            AppError::Decode { .. } => ErrorCode::DecodeError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            AppError::Load { .. } |
            AppError::Template { .. } |
            AppError::Persist { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Network { .. } |
            AppError::BackendStatus { .. } |
            AppError::Decode { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error body returned to API callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
