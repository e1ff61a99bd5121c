//! Gemini `generateContent` client implementation
//!
//! Implements the AiClient trait against the Generative Language REST API:
//! multimodal input parts, schema-constrained JSON output, image output and
//! Google Search grounding.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AiClient, AiError, GenerateRequest, GenerateResponse, GroundingSource, InlineData, OutputFormat, Part};
use crate::config::AiConfig;

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        debug!(base_url = %config.base_url, "from_config: called");
        let api_key = config.get_api_key().map_err(|e| AiError::Config(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(AiError::Network)?;

        Ok(Self::new(api_key, config.base_url.clone(), http))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        debug!(kind = %request.kind, part_count = request.parts.len(), "build_request_body: called");
        let parts: Vec<serde_json::Value> = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => serde_json::json!({ "text": text }),
                Part::Inline(data) => serde_json::json!({
                    "inlineData": {
                        "mimeType": data.mime_type,
                        "data": data.data,
                    }
                }),
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
        });

        match &request.output {
            OutputFormat::Json { schema } => {
                debug!("build_request_body: structured JSON output");
                body["generationConfig"] = serde_json::json!({
                    "responseMimeType": "application/json",
                    "responseSchema": schema,
                });
            }
            OutputFormat::Image => {
                debug!("build_request_body: image output");
                body["generationConfig"] = serde_json::json!({
                    "responseModalities": ["TEXT", "IMAGE"],
                });
            }
            OutputFormat::Text => {
                debug!("build_request_body: text output");
            }
        }

        if request.web_search {
            debug!("build_request_body: enabling search grounding");
            body["tools"] = serde_json::json!([{ "googleSearch": {} }]);
        }

        body
    }

    /// Parse the Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> Result<GenerateResponse, AiError> {
        debug!(candidate_count = api_response.candidates.len(), "parse_response: called");
        if let Some(reason) = api_response.prompt_feedback.and_then(|f| f.block_reason) {
            debug!(%reason, "parse_response: prompt blocked");
            return Err(AiError::EmptyResponse(format!("prompt blocked: {}", reason)));
        }

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AiError::EmptyResponse("no candidates returned".to_string()))?;

        let mut text = String::new();
        let mut images = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if part.thought {
                continue;
            }
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(data) = part.inline_data {
                images.push(InlineData {
                    mime_type: data.mime_type,
                    data: data.data,
                });
            }
        }

        let mut sources: Vec<GroundingSource> = Vec::new();
        if let Some(metadata) = candidate.grounding_metadata {
            for web in metadata.grounding_chunks.into_iter().filter_map(|c| c.web) {
                if let Some(uri) = web.uri
                    && !sources.iter().any(|s| s.uri == uri)
                {
                    sources.push(GroundingSource {
                        title: web.title.unwrap_or_else(|| uri.clone()),
                        uri,
                    });
                }
            }
        }

        if text.is_empty() && images.is_empty() {
            debug!(finish_reason = ?candidate.finish_reason, "parse_response: empty candidate");
            return Err(AiError::EmptyResponse(format!(
                "candidate had no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(GenerateResponse {
            text: if text.is_empty() { None } else { Some(text) },
            images,
            sources,
        })
    }
}

/// Pull the human-readable message out of a Gemini error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<GeminiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
        debug!(kind = %request.kind, model = %request.model, "generate: called");
        let url = self.endpoint(&request.model);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.clone())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            warn!(kind = %request.kind, status, %message, "generate: API error");
            return Err(AiError::from_status(status, message));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("undecodable response body: {}", e)))?;
        debug!(kind = %request.kind, "generate: success");
        self.parse_response(api_response)
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}
