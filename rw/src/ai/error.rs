//! AI service error types

use thiserror::Error;

/// Errors that can occur while talking to the generative AI service
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Rate limited (429): {message}")]
    RateLimited { message: String },

    #[error("Service unavailable (503): {message}")]
    Unavailable { message: String },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Failed to build request: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AiError {
    /// Classify a non-success HTTP status into an error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => AiError::RateLimited { message },
            503 => AiError::Unavailable { message },
            _ => AiError::Api { status, message },
        }
    }
}

/// Classifies an error as eligible for an automatic retry
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for AiError {
    /// Only rate limiting and temporary unavailability are retried
    fn is_transient(&self) -> bool {
        matches!(self, AiError::RateLimited { .. } | AiError::Unavailable { .. })
    }
}
