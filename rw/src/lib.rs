//! rewild - AI-assisted depaving and ecological site restoration
//!
//! A photo of paved or degraded ground goes in; a site assessment, an
//! imagined "after" picture, a phased restoration plan and local service
//! providers come out.
//!
//! # Core Concepts
//!
//! - **One session, one state machine**: Idle, Analyzing, ReviewAnalysis,
//!   GeneratingVision, Complete. Every operation is gated on the state.
//! - **Epoch-gated completions**: results that arrive after a reset are
//!   discarded instead of overwriting the new session.
//! - **Validated AI output**: structured replies are checked against the
//!   domain types before they reach the session.
//! - **Bounded retries**: rate limiting and overload are retried with
//!   exponential backoff; everything else fails fast.
//!
//! # Modules
//!
//! - [`ai`] - AI client trait, Gemini implementation and retry policy
//! - [`prompts`] - Prompt templates, response schemas and request building
//! - [`session`] - Flow state machine, the studio that runs AI calls, and a controller
//! - [`geo`] - Geolocation providers
//! - [`tui`] - The interactive wizard
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod ai;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod geo;
pub mod prompts;
pub mod session;
pub mod tui;

// Re-export commonly used types
pub use ai::{AiClient, AiError, GeminiClient, RetryPolicy, create_client, with_retry};
pub use config::Config;
pub use domain::{
    BudgetTier, GeoLocation, LocalSearchResult, ProjectState, RestorationPlan, RestorationType, SiteAnalysis,
    SiteImage,
};
pub use geo::{GeoError, Geolocator, create_locator};
pub use prompts::{PromptLoader, RequestBuilder};
pub use session::{Controller, FlowError, FlowState, Session, Studio};
