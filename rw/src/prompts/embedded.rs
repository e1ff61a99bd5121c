//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Site analysis prompt
pub const ANALYSIS: &str = include_str!("../../prompts/analysis.pmt");

/// Restored-site image prompt
pub const VISION: &str = include_str!("../../prompts/vision.pmt");

/// Execution plan prompt
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Local service provider lookup prompt
pub const SERVICES: &str = include_str!("../../prompts/services.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "analysis" => Some(ANALYSIS),
        "vision" => Some(VISION),
        "plan" => Some(PLAN),
        "services" => Some(SERVICES),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_all() {
        for name in ["analysis", "vision", "plan", "services"] {
            assert!(get_embedded(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_embedded_content() {
        assert!(ANALYSIS.contains("soilSealingPercent"));
        assert!(PLAN.contains("serviceCategory"));
        assert!(SERVICES.contains("\"providers\""));
        assert!(VISION.contains("{{restoration_label}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
