//! Paper Bartender - paper deadline tracking and task decomposition
//!
//! Papers own milestones; milestones are decomposed, with help from an LLM,
//! into day-sized tasks. The library holds the model, its JSON store, the
//! date expression parser, the decomposition orchestrator and the
//! today/overdue query. The `pb` binary wires them to a CLI.

pub mod cli;
pub mod config;
pub mod dates;
pub mod decompose;
pub mod display;
pub mod domain;
pub mod llm;
pub mod prompts;
pub mod query;
pub mod store;

pub use config::Config;
pub use dates::DateError;
pub use decompose::{DecomposeError, DecomposeOptions, Decomposer, DecompositionReport, TaskGenerator};
pub use domain::{DomainError, Milestone, Model, Paper, Priority, Task};
pub use query::{PaperGroup, QueryMode, TaskEntry, query};
pub use store::{Store, StoreError};
