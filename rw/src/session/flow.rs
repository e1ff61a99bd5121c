//! Application flow state machine
//!
//! `Idle -> Analyzing -> ReviewAnalysis -> GeneratingVision -> Complete`
//!
//! Every asynchronous step is split into a `begin_*` call, which checks the
//! current state and hands back a job carrying clones of its inputs, and a
//! `complete_*` call that commits the result. Jobs are stamped with the
//! session epoch; `reset` bumps the epoch so results of work started before
//! the reset are dropped on arrival.

use std::fmt::Display;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    BudgetTier, GeoLocation, LocalSearchResult, PlanPhase, ProjectState, RestorationPlan, RestorationType,
    SiteAnalysis, SiteImage,
};
use crate::geo::GeoError;

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowState {
    /// Waiting for a site photo
    #[default]
    Idle,
    /// Site analysis in flight
    Analyzing,
    /// Analysis shown, waiting for a restoration type and budget
    ReviewAnalysis,
    /// Vision and plan generation in flight
    GeneratingVision,
    /// Vision and plan available
    Complete,
}

impl FlowState {
    pub const ALL: [FlowState; 5] = [
        Self::Idle,
        Self::Analyzing,
        Self::ReviewAnalysis,
        Self::GeneratingVision,
        Self::Complete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Upload",
            Self::Analyzing => "Analyzing",
            Self::ReviewAnalysis => "Review",
            Self::GeneratingVision => "Generating",
            Self::Complete => "Plan",
        }
    }

    /// True while an AI call is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Analyzing | Self::GeneratingVision)
    }
}

impl Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Requests the current state does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("cannot {action} while {state}")]
    NotPermitted { action: &'static str, state: FlowState },

    #[error("no site analysis available")]
    NoAnalysis,

    #[error("no plan available")]
    NoPlan,

    #[error("phase {index} out of range (plan has {count} phases)")]
    PhaseOutOfRange { index: usize, count: usize },

    #[error("a location is required to find local services")]
    LocationRequired,
}

/// Which operation a ticket was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analysis,
    Generation,
    Lookup,
}

/// Proof that an operation was begun in a given epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: u64,
    pub operation: Operation,
}

/// Whether a completion was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Dropped: issued before a reset, or the flow has moved on
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A one-line message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Inputs for a site analysis
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub ticket: Ticket,
    pub image: SiteImage,
    pub location: Option<GeoLocation>,
}

/// Inputs for the joined vision and plan generation
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub ticket: Ticket,
    pub image: SiteImage,
    pub analysis: SiteAnalysis,
    pub restoration_type: RestorationType,
    pub budget: BudgetTier,
    pub location: Option<GeoLocation>,
}

/// Inputs for one local service lookup
#[derive(Debug, Clone)]
pub struct LookupJob {
    pub ticket: Ticket,
    pub phase_index: usize,
    pub phase: PlanPhase,
    pub location: GeoLocation,
}

/// The session: flow state plus the project record it guards
#[derive(Debug, Default)]
pub struct Session {
    state: FlowState,
    project: ProjectState,
    epoch: u64,
    notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        debug!("Session::new: called");
        Self::default()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn location(&self) -> Option<GeoLocation> {
        self.project.location
    }

    fn ticket(&self, operation: Operation) -> Ticket {
        Ticket {
            epoch: self.epoch,
            operation,
        }
    }

    /// Ticket is from this epoch, for `operation`, and the flow is still in `expected`
    fn is_current(&self, ticket: Ticket, operation: Operation, expected: FlowState) -> bool {
        if ticket.epoch != self.epoch {
            info!(ticket_epoch = ticket.epoch, epoch = self.epoch, ?operation, "Session: discarding result from before reset");
            return false;
        }
        if ticket.operation != operation || self.state != expected {
            warn!(?ticket, ?operation, state = %self.state, "Session: discarding result for wrong state");
            return false;
        }
        true
    }

    /// Accept a site photo and start analysing it (Idle only)
    pub fn begin_analysis(&mut self, image: SiteImage) -> Result<AnalysisJob, FlowError> {
        debug!(?image, state = %self.state, "Session::begin_analysis: called");
        if self.state != FlowState::Idle {
            return Err(FlowError::NotPermitted {
                action: "upload an image",
                state: self.state,
            });
        }

        self.project.original_image = Some(image.clone());
        self.project.analysis = None;
        self.notice = None;
        self.state = FlowState::Analyzing;
        info!("Session: analyzing site");

        Ok(AnalysisJob {
            ticket: self.ticket(Operation::Analysis),
            image,
            location: self.project.location,
        })
    }

    /// Commit the analysis result
    ///
    /// On failure the photo is dropped along with any analysis and the flow
    /// returns to Idle.
    pub fn complete_analysis<E: Display>(&mut self, ticket: Ticket, result: Result<SiteAnalysis, E>) -> Outcome {
        debug!(?ticket, ok = result.is_ok(), "Session::complete_analysis: called");
        if !self.is_current(ticket, Operation::Analysis, FlowState::Analyzing) {
            return Outcome::Stale;
        }

        match result {
            Ok(analysis) => {
                info!(best_fit = ?analysis.best_fit(), "Session: analysis complete");
                self.project.analysis = Some(analysis);
                self.state = FlowState::ReviewAnalysis;
            }
            Err(e) => {
                warn!(error = %e, "Session: analysis failed");
                self.project.analysis = None;
                self.project.original_image = None;
                self.state = FlowState::Idle;
                self.notice = Some(Notice::error(format!("Site analysis failed: {}", e)));
            }
        }
        Outcome::Applied
    }

    /// Fix the restoration type and budget and start generating (ReviewAnalysis only)
    pub fn begin_generation(
        &mut self,
        restoration_type: RestorationType,
        budget: BudgetTier,
    ) -> Result<GenerationJob, FlowError> {
        debug!(%restoration_type, %budget, state = %self.state, "Session::begin_generation: called");
        if self.state != FlowState::ReviewAnalysis {
            return Err(FlowError::NotPermitted {
                action: "generate a plan",
                state: self.state,
            });
        }
        let (Some(analysis), Some(image)) = (&self.project.analysis, &self.project.original_image) else {
            return Err(FlowError::NoAnalysis);
        };
        let job = GenerationJob {
            ticket: self.ticket(Operation::Generation),
            image: image.clone(),
            analysis: analysis.clone(),
            restoration_type,
            budget,
            location: self.project.location,
        };

        self.project.restoration_type = Some(restoration_type);
        self.project.budget = Some(budget);
        self.notice = None;
        self.state = FlowState::GeneratingVision;
        info!(%restoration_type, %budget, "Session: generating vision and plan");
        Ok(job)
    }

    /// Commit the joined vision and plan
    ///
    /// Both artifacts are stored together or not at all; on failure the
    /// flow returns to ReviewAnalysis.
    pub fn complete_generation<E: Display>(
        &mut self,
        ticket: Ticket,
        result: Result<(SiteImage, RestorationPlan), E>,
    ) -> Outcome {
        debug!(?ticket, ok = result.is_ok(), "Session::complete_generation: called");
        if !self.is_current(ticket, Operation::Generation, FlowState::GeneratingVision) {
            return Outcome::Stale;
        }

        match result {
            Ok((image, plan)) => {
                info!(title = %plan.title, phases = plan.phases.len(), "Session: plan complete");
                self.project.restored_image = Some(image);
                self.project.plan = Some(plan);
                self.state = FlowState::Complete;
            }
            Err(e) => {
                warn!(error = %e, "Session: generation failed");
                self.state = FlowState::ReviewAnalysis;
                self.notice = Some(Notice::error(format!("Generating the plan failed: {}", e)));
            }
        }
        Outcome::Applied
    }

    /// Start a local service lookup for one plan phase (Complete only)
    ///
    /// Without a known location the request is refused and a notice asks
    /// for one; nothing is sent.
    pub fn begin_lookup(&mut self, phase_index: usize) -> Result<LookupJob, FlowError> {
        debug!(%phase_index, state = %self.state, "Session::begin_lookup: called");
        if self.state != FlowState::Complete {
            return Err(FlowError::NotPermitted {
                action: "find local services",
                state: self.state,
            });
        }
        let plan = self.project.plan.as_ref().ok_or(FlowError::NoPlan)?;
        let phase = plan.phase(phase_index).ok_or(FlowError::PhaseOutOfRange {
            index: phase_index,
            count: plan.phases.len(),
        })?;
        let Some(location) = self.project.location else {
            debug!("Session::begin_lookup: no location");
            self.notice = Some(Notice::warning(
                "Local services need your location. Press g to share it.",
            ));
            return Err(FlowError::LocationRequired);
        };

        Ok(LookupJob {
            ticket: self.ticket(Operation::Lookup),
            phase_index,
            phase: phase.clone(),
            location,
        })
    }

    /// Resolve a lookup into the result to show
    ///
    /// A failed lookup becomes an empty result. Returns `None` when the
    /// lookup is stale.
    pub fn complete_lookup<E: Display>(
        &mut self,
        ticket: Ticket,
        phase_index: usize,
        result: Result<LocalSearchResult, E>,
    ) -> Option<LocalSearchResult> {
        debug!(?ticket, %phase_index, ok = result.is_ok(), "Session::complete_lookup: called");
        if !self.is_current(ticket, Operation::Lookup, FlowState::Complete) {
            return None;
        }

        match result {
            Ok(found) => {
                if found.is_empty() {
                    self.notice = Some(Notice::info(format!("No local providers found for {}", found.category)));
                }
                Some(found)
            }
            Err(e) => {
                warn!(error = %e, %phase_index, "Session: local service lookup failed");
                let category = self
                    .project
                    .plan
                    .as_ref()
                    .and_then(|p| p.phase(phase_index))
                    .map(|p| p.service_category.clone())
                    .unwrap_or_default();
                self.notice = Some(Notice::warning("Local service search failed; no providers to show."));
                Some(LocalSearchResult::empty(phase_index, category))
            }
        }
    }

    /// Record the outcome of a location request
    ///
    /// Never changes the flow state.
    pub fn apply_location(&mut self, result: Result<GeoLocation, GeoError>) {
        debug!(?result, state = %self.state, "Session::apply_location: called");
        match result {
            Ok(location) => {
                info!(%location, "Session: location set");
                self.project.location = Some(location);
                self.notice = Some(Notice::info(format!("Location set to {}", location)));
            }
            Err(e) => {
                warn!(error = %e, "Session: location unavailable");
                self.notice = Some(Notice::warning(e.user_message()));
            }
        }
    }

    /// Start over: fresh project, Idle, new epoch
    pub fn reset(&mut self) {
        debug!(epoch = self.epoch, state = %self.state, "Session::reset: called");
        self.project = ProjectState::new();
        self.state = FlowState::Idle;
        self.epoch += 1;
        self.notice = None;
        info!(epoch = self.epoch, "Session: reset");
    }
}
