//! Prompt and schema construction
//!
//! Handlebars prompt templates (embedded, overridable from disk), the
//! structured-output schemas, and the builder that combines them into AI
//! requests.

mod builder;
pub mod embedded;
mod loader;
pub mod schema;

pub use builder::{DEFAULT_MAX_PROVIDERS, RequestBuilder};
pub use loader::PromptLoader;
