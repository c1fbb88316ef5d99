//! Paper, Milestone and Task records
//!
//! Ownership is a strict tree: a Paper owns its Milestones, a Milestone owns
//! its Tasks. Children hold their parent's id; nothing points downward, so the
//! whole tree serializes as three flat arenas.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DomainId, Priority};

/// A tracked research submission with a deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: DomainId,
    pub name: String,
    pub deadline: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_on: NaiveDate,
}

/// A work item under a Paper with its own due date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: DomainId,
    pub paper_id: DomainId,
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub decomposed: bool,
    pub created_on: NaiveDate,
}

impl Milestone {
    /// Eligible for decomposition under the given force setting
    pub fn is_decomposable(&self, force: bool) -> bool {
        !self.completed && (force || !self.decomposed)
    }
}

/// Where a Task came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    #[default]
    Llm,
    Manual,
}

impl std::fmt::Display for TaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A single day-granularity actionable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: DomainId,
    pub milestone_id: DomainId,
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub source: TaskSource,
    pub created_on: NaiveDate,
    /// Insertion sequence, the final ordering tie-break
    #[serde(default)]
    pub seq: u64,
}

impl Task {
    /// Identity used for de-duplication within a Milestone
    pub fn dedup_key(&self) -> (&str, NaiveDate) {
        (self.description.as_str(), self.due_date)
    }
}
