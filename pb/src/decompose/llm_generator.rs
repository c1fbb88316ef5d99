//! LlmTaskGenerator - asks an LLM for a JSON task list

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{CollaboratorError, GenerationRequest, TaskCandidate, TaskGenerator};
use crate::config::DecompositionConfig;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{DecomposeContext, PromptLoader};

/// LLM output schema for one task
#[derive(Debug, Deserialize)]
struct TaskOutput {
    #[serde(alias = "due_date", alias = "date")]
    scheduled_date: String,
    description: String,
    #[serde(default)]
    estimated_hours: Option<f32>,
}

/// Generator backed by an `LlmClient`
pub struct LlmTaskGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    config: DecompositionConfig,
    max_tokens: u32,
}

impl LlmTaskGenerator {
    /// `max_tokens` is the configured `llm.max-tokens` response budget
    pub fn new(llm: Arc<dyn LlmClient>, config: DecompositionConfig, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts: PromptLoader::new(),
            config,
            max_tokens,
        }
    }
}

#[async_trait]
impl TaskGenerator for LlmTaskGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<TaskCandidate>, CollaboratorError> {
        let context = DecomposeContext::new(
            request.paper,
            request.milestone,
            request.earliest,
            self.config.max_prompt_days,
        );
        let prompt = self.prompts.decompose_prompt(&context)?;
        debug!(milestone_id = %request.milestone.id, prompt_len = prompt.len(), "generate: prompt rendered");

        let response = self
            .llm
            .complete(CompletionRequest {
                system_prompt: self.prompts.decompose_system().to_string(),
                prompt,
                max_tokens: self.max_tokens,
            })
            .await?;

        // A cut-off reply is at best a partial task list
        if response.is_truncated() {
            return Err(CollaboratorError::Truncated {
                max_tokens: self.max_tokens,
            });
        }

        let content = response.content.ok_or(CollaboratorError::EmptyResponse)?;
        let candidates = parse_task_list(&content)?
            .into_iter()
            .map(|t| TaskCandidate {
                description: t.description,
                due_date: t.scheduled_date,
                estimated_hours: t.estimated_hours.or(Some(self.config.default_task_hours)),
            })
            .collect::<Vec<_>>();

        info!(
            milestone_id = %request.milestone.id,
            candidates = candidates.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "generate: LLM proposed tasks"
        );
        Ok(candidates)
    }
}

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_task_list(content: &str) -> Result<Vec<TaskOutput>, CollaboratorError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(CollaboratorError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| CollaboratorError::Unparseable { reason: e.to_string() })
}
