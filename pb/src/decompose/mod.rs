//! Milestone decomposition
//!
//! - `generator`: the collaborator boundary (`TaskGenerator`) and its errors
//! - `llm_generator`: a generator backed by an LLM provider
//! - `orchestrator`: eligibility, validation, de-duplication and commit

mod generator;
mod llm_generator;
mod orchestrator;

pub use generator::{CollaboratorError, GenerationRequest, TaskCandidate, TaskGenerator};
pub use llm_generator::LlmTaskGenerator;
pub use orchestrator::{
    DecomposeError, DecomposeOptions, Decomposer, DecompositionReport, MilestoneOutcome, MilestoneStatus,
};
