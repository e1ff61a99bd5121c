//! AI request/response types
//!
//! Provider-agnostic shapes for a single multimodal generation call. The
//! client implementation translates these into the vendor wire format.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The four logical call kinds issued against the AI service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Structured assessment of the uploaded site photo
    SiteAnalysis,
    /// Generated "after" image of the restored site
    Vision,
    /// Structured multi-phase execution plan
    Plan,
    /// Web-search augmented lookup of local service providers
    ServiceLookup,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SiteAnalysis => "site-analysis",
            Self::Vision => "vision",
            Self::Plan => "plan",
            Self::ServiceLookup => "service-lookup",
        };
        write!(f, "{}", name)
    }
}

/// What the service is asked to produce
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    /// Free text
    Text,
    /// JSON constrained by the given schema
    Json { schema: serde_json::Value },
    /// An image (text parts may accompany it)
    Image,
}

/// Inline binary payload, base64-encoded for the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
}

/// One input part of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Inline(InlineData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::Inline(InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }
}

/// A generation request - everything needed for one AI call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Which logical call this is (for logging)
    pub kind: CallKind,

    /// Model identifier
    pub model: String,

    /// Input parts, in order (image first, then instructions)
    pub parts: Vec<Part>,

    /// Requested output shape
    pub output: OutputFormat,

    /// Ask the service to ground the answer with web search
    pub web_search: bool,
}

impl GenerateRequest {
    pub fn new(kind: CallKind, model: impl Into<String>) -> Self {
        let model = model.into();
        debug!(%kind, %model, "GenerateRequest::new: called");
        Self {
            kind,
            model,
            parts: Vec::new(),
            output: OutputFormat::Text,
            web_search: false,
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    /// The JSON schema, if this is a structured call
    pub fn schema(&self) -> Option<&serde_json::Value> {
        match &self.output {
            OutputFormat::Json { schema } => Some(schema),
            _ => None,
        }
    }
}

/// A web source the service cited when grounding its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Response from a generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Concatenated text parts (if any)
    pub text: Option<String>,

    /// Inline images returned by the model
    pub images: Vec<InlineData>,

    /// Sources used for web-search grounding
    pub sources: Vec<GroundingSource>,
}

impl GenerateResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_image(image: InlineData) -> Self {
        Self {
            images: vec![image],
            ..Default::default()
        }
    }

    /// Text content, if present and not blank
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = GenerateRequest::new(CallKind::Plan, "model-x")
            .with_part(Part::text("hello"))
            .with_output(OutputFormat::Json {
                schema: serde_json::json!({"type": "OBJECT"}),
            });

        assert_eq!(req.kind, CallKind::Plan);
        assert_eq!(req.model, "model-x");
        assert_eq!(req.parts, vec![Part::Text("hello".to_string())]);
        assert!(req.schema().is_some());
        assert!(!req.web_search);
    }

    #[test]
    fn test_schema_absent_for_image_output() {
        let req = GenerateRequest::new(CallKind::Vision, "m").with_output(OutputFormat::Image);
        assert!(req.schema().is_none());
    }

    #[test]
    fn test_non_empty_text() {
        assert_eq!(GenerateResponse::from_text("  {}  ").non_empty_text(), Some("{}"));
        assert_eq!(GenerateResponse::from_text("   ").non_empty_text(), None);
        assert_eq!(GenerateResponse::default().non_empty_text(), None);
    }

    #[test]
    fn test_call_kind_display() {
        assert_eq!(CallKind::SiteAnalysis.to_string(), "site-analysis");
        assert_eq!(CallKind::ServiceLookup.to_string(), "service-lookup");
    }
}
