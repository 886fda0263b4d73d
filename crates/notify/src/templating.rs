//! Minijinja template rendering for the alert email.
//!
//! Subject and body templates come from configuration as plain strings,
//! so a fresh [`minijinja::Environment`] is created per render call.

use crate::traits::NotifyError;

/// Values available to the subject and body templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertTemplateContext {
    /// Custody threshold in days.
    pub threshold: u32,
    /// Run date as `YYYY-MM-DD`.
    pub date: String,
    pub alert_count: usize,
    pub sheet_count: usize,
    /// Attachment filename.
    pub attachment: String,
}

/// Renders notification templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Only the alert context is visible to templates; no globals are registered.
    fn build_env() -> minijinja::Environment<'static> {
        minijinja::Environment::new()
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &AlertTemplateContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check template syntax without evaluating it.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}
