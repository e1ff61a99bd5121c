//! ProjectState - the single mutable session record

use super::{BudgetTier, GeoLocation, RestorationPlan, RestorationType, SiteAnalysis, SiteImage};

/// Everything the wizard has gathered so far
///
/// Owned by exactly one session. Replaced wholesale on reset and filled in
/// field by field as each step completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectState {
    /// The uploaded site photo
    pub original_image: Option<SiteImage>,

    /// The generated "after" vision
    pub restored_image: Option<SiteImage>,

    pub analysis: Option<SiteAnalysis>,

    /// Fixed once generation begins
    pub restoration_type: Option<RestorationType>,

    /// Fixed once generation begins
    pub budget: Option<BudgetTier>,

    /// Only ever set after `analysis`
    pub plan: Option<RestorationPlan>,

    pub location: Option<GeoLocation>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once both generated artifacts are present
    pub fn is_complete(&self) -> bool {
        self.plan.is_some() && self.restored_image.is_some()
    }
}
