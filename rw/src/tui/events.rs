//! TUI event handling
//!
//! Terminal input is polled on a dedicated thread and forwarded over a
//! tokio channel so the runner can `select!` on it.

use std::time::Duration;

use crossterm::event::{self, KeyEvent, KeyEventKind};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Tick (spinner animation)
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        debug!(?tick_rate, "EventHandler::new: called");
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            debug!("EventHandler: polling thread started");
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        // Windows reports both press and release
                        Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Ok(event::Event::Resize(w, h)) => Event::Resize(w, h),
                        _ => continue,
                    }
                } else {
                    Event::Tick
                };

                if tx.send(event).is_err() {
                    debug!("EventHandler: channel closed, exiting loop");
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Result<Event> {
        let event = self.rx.recv().await.ok_or_else(|| eyre::eyre!("Event channel closed"));
        trace!(?event, "EventHandler::next: received");
        event
    }
}
