//! Terminal User Interface for rewild
//!
//! A step-by-step wizard:
//! - Upload a site photo (file path or demo image)
//! - Review the AI site analysis and pick a restoration type and budget
//! - Browse the generated plan and find local services per phase

mod app;
mod events;
mod runner;
pub mod state;
mod views;

pub use app::App;
pub use events::{Event, EventHandler};
pub use runner::{RunnerPaths, TaskOutcome, TuiRunner};
pub use state::{AppState, InteractionMode, PendingAction};

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::geo::Geolocator;
use crate::session::Studio;

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the wizard until the user quits
///
/// `initial` actions run in order before the first key press (e.g. a
/// location and an image given on the command line).
pub async fn run(
    studio: Arc<Studio>,
    locator: Arc<dyn Geolocator>,
    paths: RunnerPaths,
    initial: Vec<PendingAction>,
) -> Result<()> {
    let terminal = init()?;

    // Restore the terminal even on early return or error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = initial
        .into_iter()
        .fold(TuiRunner::new(terminal, studio, locator, paths), TuiRunner::with_initial_action);
    runner.run().await
}
