//! Per-request translation failures.

use axum::http::{Method, StatusCode};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while translating one request.
///
/// None of these are retried; each surfaces to the request that caused it.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The declared character encoding is not supported.
    #[error("Unsupported character encoding: {0}")]
    Encoding(String),

    /// The upstream response violated an expected invariant.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The multipart body could not be decoded or spooled.
    #[error("Multipart upload error: {0}")]
    Upload(String),

    /// The upstream body was not valid gzip.
    #[error("Invalid gzip body: {0}")]
    Decode(#[source] std::io::Error),

    /// The upstream could not be reached or the exchange failed.
    #[error("Upstream request failed: {0}")]
    Transport(#[source] BoxError),

    /// The inbound method is not proxied.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// The inbound body exceeded the configured limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl TranslateError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        TranslateError::Transport(err.into())
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TranslateError::Encoding(_) => "encoding",
            TranslateError::Protocol(_) => "protocol",
            TranslateError::Upload(_) => "upload",
            TranslateError::Decode(_) => "decode",
            TranslateError::Transport(_) => "transport",
            TranslateError::MethodNotAllowed(_) => "method",
            TranslateError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }

    /// Status code reported to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslateError::Transport(_)
            | TranslateError::Protocol(_)
            | TranslateError::Decode(_) => StatusCode::BAD_GATEWAY,
            TranslateError::Encoding(_) | TranslateError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            TranslateError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            TranslateError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<multer::Error> for TranslateError {
    fn from(err: multer::Error) -> Self {
        TranslateError::Upload(err.to_string())
    }
}
