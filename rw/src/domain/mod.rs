//! Domain types for rewild
//!
//! Strongly typed shapes of everything the AI service returns, plus the
//! session record that holds them. AI payloads are deserialized into these
//! types and then validated; nothing from the wire is trusted unchecked.

use thiserror::Error;

mod analysis;
mod image;
mod location;
mod plan;
mod project;
mod restoration;
mod services;

pub use analysis::{SiteAnalysis, SunlightLevel, Suitability};
pub use image::{ImageError, SiteImage, guess_mime};
pub use location::GeoLocation;
pub use plan::{PlanPhase, RestorationPlan, format_amount};
pub use project::ProjectState;
pub use restoration::{BudgetTier, RestorationType};
pub use services::{LocalSearchResult, ServiceDirectory, ServiceProvider};

#[cfg(test)]
pub(crate) mod fixtures {
    pub use super::analysis::fixtures::analysis;
    pub use super::plan::fixtures::plan;
}

/// A payload that deserialized but violates a domain constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("duplicate entry for {0}")]
    Duplicate(String),
}
