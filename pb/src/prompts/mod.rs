//! Prompt templates for the LLM-backed task generator
//!
//! Templates are embedded in the binary and rendered with Handlebars.
//! HTML escaping is disabled; prompts are plain text.

pub mod embedded;

use chrono::{Days, NaiveDate};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::dates::iso;
use crate::domain::{Milestone, Paper};

/// Errors from template lookup and rendering
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template not found: {0}")]
    NotFound(String),

    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: handlebars::RenderError,
    },
}

/// Values substituted into the decomposition template
#[derive(Debug, Clone, Serialize)]
pub struct DecomposeContext {
    pub paper_name: String,
    pub deadline: String,
    pub conference: Option<String>,
    pub paper_description: Option<String>,
    pub milestone: String,
    pub due_date: String,
    pub priority: u8,
    pub earliest: String,
    /// Spelled-out days, capped at the configured maximum
    pub days: Vec<String>,
    pub more_days: bool,
    pub total_days: u64,
}

impl DecomposeContext {
    /// Build the context for a milestone scheduled in `[earliest, milestone.due_date]`
    pub fn new(paper: &Paper, milestone: &Milestone, earliest: NaiveDate, max_days: usize) -> Self {
        let total_days = (milestone.due_date - earliest).num_days().max(-1) + 1;
        let total_days = total_days as u64;

        let days: Vec<String> = (0..total_days.min(max_days as u64))
            .filter_map(|offset| earliest.checked_add_days(Days::new(offset)))
            .map(|day| day.format("%Y-%m-%d (%a)").to_string())
            .collect();

        Self {
            paper_name: paper.name.clone(),
            deadline: iso(paper.deadline),
            conference: paper.conference.clone(),
            paper_description: paper.description.clone(),
            milestone: milestone.description.clone(),
            due_date: iso(milestone.due_date),
            priority: milestone.priority.value(),
            earliest: iso(earliest),
            more_days: total_days > days.len() as u64,
            days,
            total_days,
        }
    }
}

/// Renders embedded templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptLoader {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String, PromptError> {
        let template =
            embedded::get_embedded(template_name).ok_or_else(|| PromptError::NotFound(template_name.to_string()))?;
        debug!(template = %template_name, "render: called");
        self.hbs
            .render_template(template, context)
            .map_err(|source| PromptError::Render {
                name: template_name.to_string(),
                source,
            })
    }

    /// System prompt for decomposition (no substitutions)
    pub fn decompose_system(&self) -> &'static str {
        embedded::DECOMPOSE_SYSTEM
    }

    /// Render the decomposition user prompt
    pub fn decompose_prompt(&self, context: &DecomposeContext) -> Result<String, PromptError> {
        self.render("decompose", context)
    }
}
