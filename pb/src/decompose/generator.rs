//! The task-generation collaborator boundary
//!
//! A generator takes a milestone and a date window and proposes daily tasks.
//! The orchestrator owns validation; generators may return anything.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Milestone, Paper};
use crate::llm::LlmError;
use crate::prompts::PromptError;

/// A proposed task as returned by a generator, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCandidate {
    pub description: String,
    /// ISO date or any expression the date parser accepts
    pub due_date: String,
    pub estimated_hours: Option<f32>,
}

impl TaskCandidate {
    pub fn new(description: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            due_date: due_date.into(),
            estimated_hours: None,
        }
    }

    pub fn with_hours(mut self, hours: f32) -> Self {
        self.estimated_hours = Some(hours);
        self
    }
}

/// What a generator is asked to schedule
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub paper: &'a Paper,
    pub milestone: &'a Milestone,
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

/// Failure of a single generator call
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("LLM response was cut off at {max_tokens} tokens; raise llm.max-tokens")]
    Truncated { max_tokens: u32 },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("could not parse task list from LLM response: {reason}")]
    Unparseable { reason: String },
}

/// Produces candidate daily tasks for a milestone
#[async_trait]
pub trait TaskGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<TaskCandidate>, CollaboratorError>;
}
