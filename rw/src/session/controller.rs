//! Controller - drives a session step by step
//!
//! Awaits each operation in place. The TUI splits the same begin/complete
//! pairs across spawned tasks instead; the CLI and the tests use this.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{BudgetTier, LocalSearchResult, RestorationType, SiteImage};
use crate::geo::Geolocator;

use super::flow::{FlowError, FlowState, Session};
use super::studio::Studio;

pub struct Controller {
    session: Session,
    studio: Arc<Studio>,
    locator: Box<dyn Geolocator>,
}

impl Controller {
    pub fn new(studio: Arc<Studio>, locator: Box<dyn Geolocator>) -> Self {
        debug!("Controller::new: called");
        Self {
            session: Session::new(),
            studio,
            locator,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> FlowState {
        self.session.state()
    }

    /// Upload a photo and analyse it
    ///
    /// Returns the state the flow settled in: ReviewAnalysis, or Idle if
    /// the analysis failed (the notice says why).
    pub async fn upload(&mut self, image: SiteImage) -> Result<FlowState, FlowError> {
        debug!(?image, "Controller::upload: called");
        let job = self.session.begin_analysis(image)?;
        let result = self.studio.run_analysis(&job).await;
        self.session.complete_analysis(job.ticket, result);
        Ok(self.session.state())
    }

    /// Pick the restoration type and budget and generate vision and plan
    ///
    /// Returns Complete, or ReviewAnalysis if generation failed.
    pub async fn choose(
        &mut self,
        restoration_type: RestorationType,
        budget: BudgetTier,
    ) -> Result<FlowState, FlowError> {
        debug!(%restoration_type, %budget, "Controller::choose: called");
        let job = self.session.begin_generation(restoration_type, budget)?;
        let result = self.studio.generate_vision_and_plan(&job).await;
        self.session.complete_generation(job.ticket, result);
        Ok(self.session.state())
    }

    /// Ask the locator for the current position
    pub async fn request_location(&mut self) {
        debug!("Controller::request_location: called");
        let result = self.locator.locate().await;
        self.session.apply_location(result);
    }

    /// Find local businesses for one plan phase
    pub async fn local_services(&mut self, phase_index: usize) -> Result<LocalSearchResult, FlowError> {
        debug!(%phase_index, "Controller::local_services: called");
        let job = self.session.begin_lookup(phase_index)?;
        let result = self.studio.run_lookup(&job).await;
        // The session cannot change between begin and complete here
        Ok(self
            .session
            .complete_lookup(job.ticket, phase_index, result)
            .unwrap_or_else(|| LocalSearchResult::empty(phase_index, job.phase.service_category.clone())))
    }

    pub fn reset(&mut self) {
        debug!("Controller::reset: called");
        self.session.reset();
    }
}
