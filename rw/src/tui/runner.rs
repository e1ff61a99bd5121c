//! TUI Runner - owns the terminal and runs the event loop
//!
//! The TuiRunner is responsible for:
//! - Dispatching terminal events to the App
//! - Executing the App's pending actions
//! - Running AI calls on spawned tasks and feeding their outcomes back
//! - Rendering after every event

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::state::PendingAction;
use super::views;
use crate::ai::AiError;
use crate::domain::{GeoLocation, LocalSearchResult, RestorationPlan, SiteAnalysis, SiteImage};
use crate::export::export_project;
use crate::geo::{GeoError, Geolocator};
use crate::session::{FlowState, Outcome, Studio, Ticket};

/// Spinner refresh rate
const TICK_RATE: Duration = Duration::from_millis(120);

/// Result of a background task
#[derive(Debug)]
pub enum TaskOutcome {
    /// Demo image download finished
    DemoFetched {
        epoch: u64,
        result: Result<SiteImage, String>,
    },
    Analysis {
        ticket: Ticket,
        result: Result<SiteAnalysis, AiError>,
    },
    Generation {
        ticket: Ticket,
        result: Result<(SiteImage, RestorationPlan), AiError>,
    },
    Lookup {
        ticket: Ticket,
        phase_index: usize,
        result: Result<LocalSearchResult, AiError>,
    },
    Location {
        epoch: u64,
        result: Result<GeoLocation, GeoError>,
    },
}

/// Where things come from and go to
#[derive(Debug, Clone)]
pub struct RunnerPaths {
    /// Directory for saved projects
    pub output_dir: PathBuf,
    /// Demo site photo
    pub demo_image_url: String,
}

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    studio: Arc<Studio>,
    locator: Arc<dyn Geolocator>,
    http: reqwest::Client,
    paths: RunnerPaths,
    queued: Vec<PendingAction>,
    outcome_tx: mpsc::UnboundedSender<TaskOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<TaskOutcome>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, studio: Arc<Studio>, locator: Arc<dyn Geolocator>, paths: RunnerPaths) -> Self {
        debug!(?paths, "TuiRunner::new: called");
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            app: App::new(),
            terminal,
            event_handler: EventHandler::new(TICK_RATE),
            studio,
            locator,
            http: reqwest::Client::new(),
            paths,
            queued: Vec::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Queue an action to run before the first key press (e.g. `--image`)
    pub fn with_initial_action(mut self, action: PendingAction) -> Self {
        self.queued.push(action);
        self
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: called");
        for action in std::mem::take(&mut self.queued) {
            self.execute_action(action);
        }

        loop {
            self.terminal
                .draw(|frame| views::render(self.app.state(), self.app.session(), frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    match event? {
                        Event::Tick => self.app.state_mut().on_tick(),
                        Event::Key(key) => {
                            if self.app.handle_key(key) {
                                break;
                            }
                            self.take_pending_action();
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                    }
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }
            }

            if self.app.state().should_quit {
                debug!("TuiRunner::run: should_quit is true, breaking");
                break;
            }
        }

        debug!("TuiRunner::run: exiting");
        Ok(())
    }

    fn take_pending_action(&mut self) {
        if let Some(action) = self.app.state_mut().pending_action.take() {
            self.execute_action(action);
        }
    }

    /// Execute a pending action
    fn execute_action(&mut self, action: PendingAction) {
        debug!(?action, "TuiRunner::execute_action: called");
        match action {
            PendingAction::OpenImage(path) => match SiteImage::from_path(&path) {
                Ok(image) => self.start_analysis(image),
                Err(e) => {
                    warn!(error = %e, "TuiRunner: could not open image");
                    self.app.state_mut().set_error(e.to_string());
                }
            },
            PendingAction::DemoImage => {
                self.app.state_mut().fetching_demo = true;
                let epoch = self.app.session().epoch();
                let http = self.http.clone();
                let url = self.paths.demo_image_url.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = SiteImage::fetch(&http, &url).await.map_err(|e| e.to_string());
                    let _ = tx.send(TaskOutcome::DemoFetched { epoch, result });
                });
            }
            PendingAction::RequestLocation => {
                self.app.state_mut().locating = true;
                let epoch = self.app.session().epoch();
                let locator = self.locator.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = locator.locate().await;
                    let _ = tx.send(TaskOutcome::Location { epoch, result });
                });
            }
            PendingAction::Generate {
                restoration_type,
                budget,
            } => match self.app.session_mut().begin_generation(restoration_type, budget) {
                Ok(job) => {
                    let studio = self.studio.clone();
                    let tx = self.outcome_tx.clone();
                    tokio::spawn(async move {
                        let result = studio.generate_vision_and_plan(&job).await;
                        let _ = tx.send(TaskOutcome::Generation {
                            ticket: job.ticket,
                            result,
                        });
                    });
                }
                Err(e) => self.app.state_mut().set_error(e.to_string()),
            },
            PendingAction::FindServices(phase_index) => {
                let (state, session) = self.app.parts_mut();
                match session.begin_lookup(phase_index) {
                    Ok(job) => {
                        state.loading_phases.insert(phase_index);
                        state.expanded_phases.insert(phase_index);
                        let studio = self.studio.clone();
                        let tx = self.outcome_tx.clone();
                        tokio::spawn(async move {
                            let result = studio.run_lookup(&job).await;
                            let _ = tx.send(TaskOutcome::Lookup {
                                ticket: job.ticket,
                                phase_index,
                                result,
                            });
                        });
                    }
                    // The session has already posted a notice
                    Err(e) => debug!(error = %e, "TuiRunner: lookup refused"),
                }
            }
            PendingAction::Save => match export_project(self.app.session().project(), &self.paths.output_dir) {
                Ok(dir) => {
                    info!(dir = %dir.display(), "TuiRunner: project saved");
                    self.app.state_mut().saved_to = Some(dir);
                }
                Err(e) => self.app.state_mut().set_error(format!("Save failed: {:#}", e)),
            },
        }
    }

    fn start_analysis(&mut self, image: SiteImage) {
        debug!(?image, "TuiRunner::start_analysis: called");
        match self.app.session_mut().begin_analysis(image) {
            Ok(job) => {
                let studio = self.studio.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = studio.run_analysis(&job).await;
                    let _ = tx.send(TaskOutcome::Analysis {
                        ticket: job.ticket,
                        result,
                    });
                });
            }
            Err(e) => self.app.state_mut().set_error(e.to_string()),
        }
    }

    /// Commit a background task's result
    fn handle_outcome(&mut self, outcome: TaskOutcome) {
        debug!(?outcome, "TuiRunner::handle_outcome: called");
        match outcome {
            TaskOutcome::DemoFetched { epoch, result } => {
                self.app.state_mut().fetching_demo = false;
                if epoch != self.app.session().epoch() {
                    debug!("TuiRunner: demo image arrived after reset, dropped");
                    return;
                }
                match result {
                    Ok(image) => self.start_analysis(image),
                    Err(e) => self.app.state_mut().set_error(format!("Demo image unavailable: {}", e)),
                }
            }
            TaskOutcome::Analysis { ticket, result } => {
                if self.app.session_mut().complete_analysis(ticket, result) == Outcome::Applied
                    && self.app.session().state() == FlowState::ReviewAnalysis
                {
                    self.app.state_mut().type_selection.select_first();
                }
            }
            TaskOutcome::Generation { ticket, result } => {
                self.app.session_mut().complete_generation(ticket, result);
                if self.app.session().state() == FlowState::Complete {
                    self.app.state_mut().phase_selection.select_first();
                }
            }
            TaskOutcome::Lookup {
                ticket,
                phase_index,
                result,
            } => {
                let (state, session) = self.app.parts_mut();
                if let Some(found) = session.complete_lookup(ticket, phase_index, result) {
                    state.loading_phases.remove(&phase_index);
                    state.search_results.insert(phase_index, found);
                }
            }
            TaskOutcome::Location { epoch, result } => {
                self.app.apply_location(epoch, result);
            }
        }
    }
}
