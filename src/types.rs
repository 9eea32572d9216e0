use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing_error::SpanTrace;

/// Token counters reported by the upstream model call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Text and usage returned by one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResult {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Config,
    Upstream,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::Config => "config",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Missing required field: 'prompt'")]
    MissingPrompt,

    #[error("'prompt' must be a string")]
    InvalidPrompt,

    #[error("'tags' must be a list of strings")]
    InvalidTags,

    #[error("'model' must be a string")]
    InvalidModel,

    #[error("Request body is not valid UTF-8")]
    BodyNotUtf8,

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Unreadable request body: {0}")]
    BodyUnreadable(String),

    #[error("Missing or invalid Authorization header")]
    AuthMissing,

    #[error("Malformed Authorization header: {0}")]
    AuthMalformed(String),

    #[error("Invalid credentials")]
    AuthInvalid,

    #[error("{0}")]
    Config(String),

    #[error("Claude API error: status {0}: {1}")]
    Upstream(StatusCode, String),

    #[error("Claude API error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid JSON format in response: {0}")]
    InvalidJson(String),

    #[error("Internal error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String, SpanTrace),
}

impl QuizError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizError::MissingPrompt
            | QuizError::InvalidPrompt
            | QuizError::InvalidTags
            | QuizError::InvalidModel
            | QuizError::BodyNotUtf8
            | QuizError::BodyTooLarge
            | QuizError::BodyUnreadable(_) => ErrorKind::Validation,
            QuizError::AuthMissing | QuizError::AuthMalformed(_) | QuizError::AuthInvalid => {
                ErrorKind::Auth
            }
            QuizError::Config(_) => ErrorKind::Config,
            QuizError::Upstream(_, _) | QuizError::Network(_) | QuizError::InvalidJson(_) => {
                ErrorKind::Upstream
            }
            QuizError::Serialization(_) | QuizError::Io(_) | QuizError::Internal(_, _) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status of the envelope this error becomes.
    pub fn status_code(&self) -> StatusCode {
        if let QuizError::BodyTooLarge = self {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Config | ErrorKind::Upstream | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        QuizError::Internal(message.into(), SpanTrace::capture())
    }
}

#[derive(Debug)]
pub struct ObservedError {
    pub inner: QuizError,
    pub span_trace: SpanTrace,
}

impl fmt::Display for ObservedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\nSpan Trace:\n{}", self.inner, self.span_trace)
    }
}

impl std::error::Error for ObservedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl<E> From<E> for ObservedError
where
    E: Into<QuizError>,
{
    fn from(error: E) -> Self {
        Self {
            inner: error.into(),
            span_trace: SpanTrace::capture(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObservedError>;
