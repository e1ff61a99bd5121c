//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults, and renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (`<dir>/<name>.pmt`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates from `override_dir`
    ///
    /// A missing directory is ignored and the embedded prompts are used.
    pub fn new(override_dir: Option<&Path>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = override_dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        if override_dir.is_none() {
            debug!("PromptLoader::new: no override directory, embedded prompts only");
        }

        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);

        Self { hbs, override_dir }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self::new(None)
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `<override_dir>/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
