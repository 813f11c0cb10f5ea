//! Error types for smoke-test steps

use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmokeError {
    /// Request could not be built
    #[error("{0}")]
    Api(#[from] OpenAIError),

    /// Non-2xx answer; `body` is kept verbatim since the proxy does not use
    /// the OpenAI error shape
    #[error("Error code: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Missing content: {0}")]
    MissingContent(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SmokeError>;
