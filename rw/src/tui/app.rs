//! TUI application - event handling and state management
//!
//! The App owns the session and the AppState and turns key presses into
//! state changes or pending actions. It does not render and never awaits;
//! the runner executes pending actions.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, trace};

use super::state::{AppState, ConfirmAction, ConfirmDialog, InteractionMode, PendingAction, type_choices};
use crate::domain::{BudgetTier, GeoLocation};
use crate::geo::GeoError;
use crate::session::{FlowState, Outcome, Session};

/// TUI application
#[derive(Debug, Default)]
pub struct App {
    state: AppState,
    session: Session,
}

impl App {
    pub fn new() -> Self {
        debug!("App::new: called");
        Self {
            state: AppState::new(),
            session: Session::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Split borrow for the runner: view state and session together
    pub fn parts_mut(&mut self) -> (&mut AppState, &mut Session) {
        (&mut self.state, &mut self.session)
    }

    /// Start over with a fresh project
    pub fn reset(&mut self) {
        debug!("App::reset: called");
        self.session.reset();
        self.state.clear_project_view();
    }

    /// Commit a location request issued at `epoch`
    ///
    /// A fix that arrives after a reset belongs to the old project and is dropped.
    pub fn apply_location(&mut self, epoch: u64, result: Result<GeoLocation, GeoError>) -> Outcome {
        debug!(epoch, current = self.session.epoch(), "App::apply_location: called");
        if epoch != self.session.epoch() {
            debug!("App::apply_location: location arrived after reset, dropped");
            return Outcome::Stale;
        }
        self.state.locating = false;
        self.session.apply_location(result);
        Outcome::Applied
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        self.state.clear_error();

        match &self.state.interaction_mode {
            InteractionMode::Normal => self.handle_normal_key(key),
            InteractionMode::PathInput(_) => self.handle_path_input_key(key),
            InteractionMode::Confirm(_) => self.handle_confirm_key(key),
            InteractionMode::Help => self.handle_help_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, state = %self.session.state(), "App::handle_normal_key: called");
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                debug!("App::handle_normal_key: Ctrl+C force quit");
                return true;
            }
            (KeyCode::Char('q'), _) => {
                if self.session.state().is_busy() {
                    self.state.interaction_mode = InteractionMode::Confirm(ConfirmDialog::quit());
                } else {
                    self.state.should_quit = true;
                }
            }
            (KeyCode::Char('?'), _) | (KeyCode::F(1), _) => {
                self.state.interaction_mode = InteractionMode::Help;
            }
            (KeyCode::Char('r'), _) => {
                if self.session.state() == FlowState::Idle && self.session.project().original_image.is_none() {
                    self.reset();
                } else {
                    self.state.interaction_mode = InteractionMode::Confirm(ConfirmDialog::reset());
                }
            }
            (KeyCode::Char('g'), _) => {
                if !self.state.locating {
                    self.state.pending_action = Some(PendingAction::RequestLocation);
                }
            }
            _ => match self.session.state() {
                FlowState::Idle => self.handle_idle_key(key),
                FlowState::ReviewAnalysis => self.handle_review_key(key),
                FlowState::Complete => self.handle_complete_key(key),
                FlowState::Analyzing | FlowState::GeneratingVision => {
                    debug!("App::handle_normal_key: busy, key ignored");
                }
            },
        }
        false
    }

    fn handle_idle_key(&mut self, key: KeyEvent) {
        debug!(?key, "App::handle_idle_key: called");
        match key.code {
            KeyCode::Char('o') => {
                self.state.interaction_mode = InteractionMode::PathInput(String::new());
            }
            KeyCode::Char('d') if !self.state.fetching_demo => {
                self.state.pending_action = Some(PendingAction::DemoImage);
            }
            _ => {}
        }
    }

    fn handle_review_key(&mut self, key: KeyEvent) {
        debug!(?key, "App::handle_review_key: called");
        let choices = self
            .session
            .project()
            .analysis
            .as_ref()
            .map(type_choices)
            .unwrap_or_default();
        let count = choices.len();

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.type_selection.select_next(count),
            KeyCode::Char('k') | KeyCode::Up => self.state.type_selection.select_prev(),
            KeyCode::Char('1') => self.state.budget = BudgetTier::Low,
            KeyCode::Char('2') => self.state.budget = BudgetTier::Medium,
            KeyCode::Char('3') => self.state.budget = BudgetTier::High,
            KeyCode::Tab => self.state.budget = self.state.budget.next(),
            KeyCode::Enter => {
                self.state.type_selection.clamp(count);
                if let Some(choice) = choices.get(self.state.type_selection.selected_index) {
                    self.state.pending_action = Some(PendingAction::Generate {
                        restoration_type: choice.restoration_type,
                        budget: self.state.budget,
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_complete_key(&mut self, key: KeyEvent) {
        debug!(?key, "App::handle_complete_key: called");
        let count = self.session.project().plan.as_ref().map_or(0, |p| p.phases.len());
        let selected = self.state.phase_selection.selected_index;

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.phase_selection.select_next(count),
            KeyCode::Char('k') | KeyCode::Up => self.state.phase_selection.select_prev(),
            KeyCode::Enter if selected < count => self.state.toggle_phase(selected),
            KeyCode::Char('f') if selected < count => {
                if self.state.loading_phases.contains(&selected) {
                    debug!(%selected, "App::handle_complete_key: lookup already running");
                } else {
                    self.state.pending_action = Some(PendingAction::FindServices(selected));
                }
            }
            KeyCode::Char('s') => self.state.pending_action = Some(PendingAction::Save),
            _ => {}
        }
    }

    fn handle_path_input_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_path_input_key: called");
        match key.code {
            KeyCode::Esc => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Enter => {
                let input = self.state.interaction_mode.input_buffer().unwrap_or_default().trim().to_string();
                self.state.interaction_mode = InteractionMode::Normal;
                if !input.is_empty() {
                    self.state.pending_action = Some(PendingAction::OpenImage(expand_home(&input)));
                }
            }
            KeyCode::Backspace => {
                if let Some(buf) = self.state.interaction_mode.input_buffer_mut() {
                    buf.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buf) = self.state.interaction_mode.input_buffer_mut() {
                    buf.push(c);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_confirm_key: called");
        let InteractionMode::Confirm(dialog) = &mut self.state.interaction_mode else {
            return false;
        };

        match key.code {
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                dialog.selected_button = !dialog.selected_button;
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let action = dialog.action;
                self.state.interaction_mode = InteractionMode::Normal;
                return self.confirm(action);
            }
            KeyCode::Enter => {
                let (action, yes) = (dialog.action, dialog.selected_button);
                self.state.interaction_mode = InteractionMode::Normal;
                if yes {
                    return self.confirm(action);
                }
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
            _ => {}
        }
        false
    }

    fn confirm(&mut self, action: ConfirmAction) -> bool {
        debug!(?action, "App::confirm: called");
        match action {
            ConfirmAction::Quit => {
                self.state.should_quit = true;
                true
            }
            ConfirmAction::Reset => {
                self.reset();
                false
            }
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_help_key: called");
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            self.state.interaction_mode = InteractionMode::Normal;
        }
        false
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/").zip(dirs::home_dir()) {
        Some((rest, home)) => home.join(rest),
        None => PathBuf::from(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RestorationType, SiteImage, fixtures};

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::from(code))
    }

    fn image() -> SiteImage {
        SiteImage::from_bytes("image/png", vec![1]).unwrap()
    }

    fn app_in_review() -> App {
        let mut app = App::new();
        let job = app.session_mut().begin_analysis(image()).unwrap();
        app.session_mut()
            .complete_analysis::<String>(job.ticket, Ok(fixtures::analysis()));
        app
    }

    fn app_complete() -> App {
        let mut app = app_in_review();
        let job = app
            .session_mut()
            .begin_generation(RestorationType::PollinatorHaven, BudgetTier::Medium)
            .unwrap();
        app.session_mut()
            .complete_generation::<String>(job.ticket, Ok((image(), fixtures::plan())));
        app
    }

    #[test]
    fn test_quit_and_help() {
        let mut app = App::new();
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));

        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state().interaction_mode, InteractionMode::Help);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.state().should_quit);
    }

    #[test]
    fn test_quit_while_busy_asks_first() {
        let mut app = App::new();
        app.session_mut().begin_analysis(image()).unwrap();

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.state().should_quit);
        assert!(matches!(app.state().interaction_mode, InteractionMode::Confirm(_)));

        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn test_open_image_path() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('o'));
        for c in "/tmp/lot.jpgx".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.state().pending_action,
            Some(PendingAction::OpenImage(PathBuf::from("/tmp/lot.jpg")))
        );
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);
    }

    #[test]
    fn test_demo_and_location_keys() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state().pending_action, Some(PendingAction::DemoImage));

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.state().pending_action, Some(PendingAction::RequestLocation));
    }

    #[test]
    fn test_review_pick_type_and_budget() {
        let mut app = app_in_review();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.state().pending_action,
            Some(PendingAction::Generate {
                restoration_type: RestorationType::RainGarden,
                budget: BudgetTier::Medium,
            })
        );
    }

    #[test]
    fn test_upload_keys_ignored_outside_idle() {
        let mut app = app_in_review();
        press(&mut app, KeyCode::Char('d'));
        assert!(app.state().pending_action.is_none());
    }

    #[test]
    fn test_complete_phase_keys() {
        let mut app = app_complete();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(app.state().expanded_phases.contains(&1));

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.state().pending_action, Some(PendingAction::FindServices(1)));

        app.state_mut().pending_action = None;
        app.state_mut().loading_phases.insert(1);
        press(&mut app, KeyCode::Char('f'));
        assert!(app.state().pending_action.is_none());

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.state().pending_action, Some(PendingAction::Save));
    }

    #[test]
    fn test_reset_confirms_then_clears() {
        let mut app = app_complete();
        app.state_mut().expanded_phases.insert(0);

        press(&mut app, KeyCode::Char('r'));
        assert!(matches!(app.state().interaction_mode, InteractionMode::Confirm(_)));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.session().state(), FlowState::Complete);

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.session().state(), FlowState::Idle);
        assert_eq!(app.session().epoch(), 1);
        assert!(app.state().expanded_phases.is_empty());
    }

    #[test]
    fn test_location_after_reset_is_dropped() {
        let mut app = App::new();
        app.state_mut().locating = true;
        let epoch = app.session().epoch();

        app.reset();
        assert!(!app.state().locating);

        let fix = GeoLocation::new(52.5, 13.4).unwrap();
        assert_eq!(app.apply_location(epoch, Ok(fix)), Outcome::Stale);
        assert!(app.session().location().is_none());
        assert!(app.session().notice().is_none());
    }

    #[test]
    fn test_location_in_current_epoch_is_applied() {
        let mut app = App::new();
        app.state_mut().locating = true;
        let epoch = app.session().epoch();

        let fix = GeoLocation::new(52.5, 13.4).unwrap();
        assert_eq!(app.apply_location(epoch, Ok(fix)), Outcome::Applied);
        assert!(!app.state().locating);
        assert_eq!(app.session().location(), Some(fix));

        app.state_mut().locating = true;
        assert_eq!(app.apply_location(epoch, Err(GeoError::Timeout)), Outcome::Applied);
        assert!(!app.state().locating);
        assert_eq!(app.session().location(), Some(fix));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/p.png"), PathBuf::from("/abs/p.png"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/p.png"), home.join("p.png"));
        }
    }
}
