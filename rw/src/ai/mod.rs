//! AI service module for rewild
//!
//! Provides the generative AI client boundary and the retry policy every
//! call goes through.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
pub mod retry;
mod types;

pub use client::AiClient;
pub use error::{AiError, Transient};
pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, with_retry};
pub use types::{CallKind, GenerateRequest, GenerateResponse, GroundingSource, InlineData, OutputFormat, Part};

use crate::config::AiConfig;

/// Create an AI client based on the provider specified in config
///
/// Supports the "gemini" provider.
pub fn create_client(config: &AiConfig) -> Result<Arc<dyn AiClient>, AiError> {
    debug!(provider = %config.provider, "create_client: called");
    match config.provider.as_str() {
        "gemini" => {
            debug!("create_client: creating Gemini client");
            Ok(Arc::new(GeminiClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(AiError::Config(format!(
                "Unknown AI provider: '{}'. Supported: gemini",
                other
            )))
        }
    }
}
