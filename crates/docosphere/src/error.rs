//! Error types for the document Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Docosphere operations
pub type Result<T> = std::result::Result<T, Error>;

/// How an upstream service call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Connection failure, timeout, rate limit or 5xx: worth retrying
    Unavailable,
    /// The service refused the request or answered with something unusable
    Rejected,
}

/// Docosphere errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No readable text in the uploaded documents
    #[error("No readable text found in the uploaded files")]
    ExtractionEmpty,

    /// The vector index has never been built
    #[error("Vector index not found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    /// Embedding or generation service failure
    #[error("{service} request failed: {message}")]
    Upstream {
        service: String,
        failure: UpstreamFailure,
        message: String,
    },

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Invalid request (empty question, no files)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Vector index error (corrupt artifact, dimension mismatch)
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an upstream error that is worth retrying
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            failure: UpstreamFailure::Unavailable,
            message: message.into(),
        }
    }

    /// Create an upstream error for a refused or unusable response
    pub fn rejected(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            failure: UpstreamFailure::Rejected,
            message: message.into(),
        }
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify a transport-level reqwest error
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::unavailable(service, err.to_string())
        } else {
            Self::rejected(service, err.to_string())
        }
    }

    /// Classify a non-success HTTP status from an upstream service
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("HTTP {} - {}", status, body);
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
        {
            Self::unavailable(service, message)
        } else {
            Self::rejected(service, message)
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Upstream {
                failure: UpstreamFailure::Unavailable,
                ..
            }
        )
    }

    /// Message safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("The assistant is not configured correctly: {}", msg),
            Self::ExtractionEmpty => "No readable text found in the uploaded files.".to_string(),
            Self::IndexNotFound { .. } => {
                "Please upload and process your documents first.".to_string()
            }
            Self::Upstream {
                failure: UpstreamFailure::Unavailable,
                service,
                ..
            } => format!(
                "The {} service is currently unavailable. Please try again shortly.",
                service
            ),
            Self::Upstream {
                failure: UpstreamFailure::Rejected,
                service,
                ..
            } => format!("The {} service rejected the request.", service),
            Self::FileParse { filename, .. } => format!("Could not read '{}'.", filename),
            Self::UnsupportedFileType(ext) => {
                format!("Unsupported file type: {}. Upload PDF or Word files.", ext)
            }
            Self::InvalidRequest(msg) => msg.clone(),
            Self::VectorDb(_) => {
                "The document index is unreadable. Please process your documents again."
                    .to_string()
            }
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                "An error occurred while processing your request.".to_string()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::ExtractionEmpty => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_empty"),
            Error::IndexNotFound { .. } => (StatusCode::CONFLICT, "index_not_found"),
            Error::Upstream {
                failure: UpstreamFailure::Unavailable,
                ..
            } => (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable"),
            Error::Upstream {
                failure: UpstreamFailure::Rejected,
                ..
            } => (StatusCode::BAD_GATEWAY, "upstream_rejected"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.user_message(),
            }
        }));

        (status, body).into_response()
    }
}
