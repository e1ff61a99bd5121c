//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here. Only
//! ephemeral view state lives here; the project itself belongs to the
//! session.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::debug;

use crate::domain::{BudgetTier, LocalSearchResult, RestorationType, SiteAnalysis, Suitability};

/// Spinner frames for in-flight AI calls
pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Interaction mode (modal)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing an image path (o key)
    PathInput(String),
    /// Confirmation dialog
    Confirm(ConfirmDialog),
    /// Help overlay
    Help,
}

impl InteractionMode {
    /// Get the input buffer if in an input mode
    pub fn input_buffer(&self) -> Option<&str> {
        match self {
            Self::PathInput(s) => Some(s),
            _ => None,
        }
    }

    /// Get mutable input buffer
    pub fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::PathInput(s) => Some(s),
            _ => None,
        }
    }
}

/// Confirmation dialog for destructive actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub message: String,
    pub action: ConfirmAction,
    pub selected_button: bool, // false = No, true = Yes
}

impl ConfirmDialog {
    pub fn new(action: ConfirmAction, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action,
            selected_button: false,
        }
    }

    pub fn quit() -> Self {
        Self::new(
            ConfirmAction::Quit,
            "The AI service is still working. Quit anyway?",
        )
    }

    pub fn reset() -> Self {
        Self::new(ConfirmAction::Reset, "Discard this project and start over?")
    }
}

/// Action to perform on confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Quit,
    Reset,
}

/// Action pending execution by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Load a local image and analyse it
    OpenImage(PathBuf),
    /// Fetch the demo image and analyse it
    DemoImage,
    /// Ask the locator for a position
    RequestLocation,
    /// Generate vision and plan
    Generate {
        restoration_type: RestorationType,
        budget: BudgetTier,
    },
    /// Find local services for a plan phase
    FindServices(usize),
    /// Export the finished project
    Save,
}

/// Selection state for list views
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_index: usize,
}

impl SelectionState {
    pub fn select_next(&mut self, max_items: usize) {
        if max_items > 0 && self.selected_index < max_items - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Ensure selection is within bounds
    pub fn clamp(&mut self, max_items: usize) {
        if max_items == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= max_items {
            self.selected_index = max_items - 1;
        }
    }
}

/// One row of the restoration type picker
#[derive(Debug, Clone, PartialEq)]
pub struct TypeChoice<'a> {
    pub restoration_type: RestorationType,
    pub suitability: Option<&'a Suitability>,
}

/// All restoration types, scored ones best first, unscored ones after
pub fn type_choices(analysis: &SiteAnalysis) -> Vec<TypeChoice<'_>> {
    let mut choices: Vec<TypeChoice<'_>> = analysis
        .ranked()
        .into_iter()
        .map(|s| TypeChoice {
            restoration_type: s.restoration_type,
            suitability: Some(s),
        })
        .collect();
    for t in RestorationType::ALL {
        if analysis.suitability_for(t).is_none() {
            choices.push(TypeChoice {
                restoration_type: t,
                suitability: None,
            });
        }
    }
    choices
}

/// Main TUI application state
#[derive(Debug)]
pub struct AppState {
    /// Current interaction mode
    pub interaction_mode: InteractionMode,

    /// Cursor in the restoration type picker
    pub type_selection: SelectionState,

    /// Budget tier picked on the review screen
    pub budget: BudgetTier,

    /// Cursor in the plan phase list
    pub phase_selection: SelectionState,

    /// Phases showing tasks, materials and providers
    pub expanded_phases: HashSet<usize>,

    /// Phases with a provider search in flight
    pub loading_phases: HashSet<usize>,

    /// Provider search results per phase
    pub search_results: HashMap<usize, LocalSearchResult>,

    /// A location request is in flight
    pub locating: bool,

    /// The demo image is being downloaded
    pub fetching_demo: bool,

    /// Last export directory
    pub saved_to: Option<PathBuf>,

    /// Local error (bad path, failed save); shown above session notices
    pub error_message: Option<String>,

    /// Action for the runner to execute
    pub pending_action: Option<PendingAction>,

    /// Spinner frame
    pub tick: usize,

    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        debug!("AppState::new: called");
        Self {
            interaction_mode: InteractionMode::Normal,
            type_selection: SelectionState::default(),
            budget: BudgetTier::Medium,
            phase_selection: SelectionState::default(),
            expanded_phases: HashSet::new(),
            loading_phases: HashSet::new(),
            search_results: HashMap::new(),
            locating: false,
            fetching_demo: false,
            saved_to: None,
            error_message: None,
            pending_action: None,
            tick: 0,
            should_quit: false,
        }
    }

    /// Forget everything tied to the previous project
    pub fn clear_project_view(&mut self) {
        debug!("AppState::clear_project_view: called");
        self.type_selection = SelectionState::default();
        self.budget = BudgetTier::Medium;
        self.phase_selection = SelectionState::default();
        self.expanded_phases.clear();
        self.loading_phases.clear();
        self.search_results.clear();
        self.fetching_demo = false;
        self.locating = false;
        self.saved_to = None;
        self.error_message = None;
        self.pending_action = None;
    }

    pub fn toggle_phase(&mut self, index: usize) {
        debug!(%index, "AppState::toggle_phase: called");
        if !self.expanded_phases.remove(&index) {
            self.expanded_phases.insert(index);
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(%msg, "AppState::set_error: called");
        self.error_message = Some(msg);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }

    /// Advance animations
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;

    #[test]
    fn test_selection_bounds() {
        let mut sel = SelectionState::default();
        sel.select_prev();
        assert_eq!(sel.selected_index, 0);
        sel.select_next(2);
        sel.select_next(2);
        assert_eq!(sel.selected_index, 1);
        sel.clamp(1);
        assert_eq!(sel.selected_index, 0);
    }

    #[test]
    fn test_type_choices_lists_every_type_once() {
        let analysis = fixtures::analysis();
        let choices = type_choices(&analysis);

        assert_eq!(choices.len(), RestorationType::ALL.len());
        assert_eq!(choices[0].restoration_type, RestorationType::PollinatorHaven);
        assert_eq!(choices[2].restoration_type, RestorationType::WildlifePond);
        assert!(choices[3..].iter().all(|c| c.suitability.is_none()));
    }

    #[test]
    fn test_toggle_phase() {
        let mut state = AppState::new();
        state.toggle_phase(1);
        assert!(state.expanded_phases.contains(&1));
        state.toggle_phase(1);
        assert!(state.expanded_phases.is_empty());
    }

    #[test]
    fn test_clear_project_view() {
        let mut state = AppState::new();
        state.budget = BudgetTier::High;
        state.loading_phases.insert(0);
        state.search_results.insert(0, LocalSearchResult::empty(0, "x"));
        state.pending_action = Some(PendingAction::Save);
        state.locating = true;

        state.clear_project_view();
        assert_eq!(state.budget, BudgetTier::Medium);
        assert!(!state.locating);
        assert!(state.loading_phases.is_empty());
        assert!(state.search_results.is_empty());
        assert!(state.pending_action.is_none());
    }
}
