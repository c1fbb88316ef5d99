//! The in-memory model: three id-keyed arenas plus a schema marker

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DomainError, DomainId, IdResolver, Milestone, Paper, Priority, Task, TaskSource};

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Input for a new Paper
#[derive(Debug, Clone)]
pub struct NewPaper {
    pub name: String,
    pub deadline: NaiveDate,
    pub conference: Option<String>,
    pub description: Option<String>,
}

/// Input for a new Milestone
#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
}

/// Input for a new Task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub due_date: NaiveDate,
    pub estimated_hours: Option<f32>,
    pub source: TaskSource,
}

/// The full Paper/Milestone/Task tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub version: u32,
    #[serde(default)]
    pub papers: BTreeMap<DomainId, Paper>,
    #[serde(default)]
    pub milestones: BTreeMap<DomainId, Milestone>,
    #[serde(default)]
    pub tasks: BTreeMap<DomainId, Task>,
    #[serde(default)]
    next_seq: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            papers: BTreeMap::new(),
            milestones: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id<T>(arena: &BTreeMap<DomainId, T>, domain_type: &str) -> DomainId {
        loop {
            let id = DomainId::new(domain_type);
            if !arena.contains_key(&id) {
                return id;
            }
            debug!(%id, "fresh_id: collision, regenerating");
        }
    }

    // ---------------------------------------------------------------------
    // Papers
    // ---------------------------------------------------------------------

    /// Look up a Paper by exact, case-sensitive name
    pub fn paper_by_name(&self, name: &str) -> Result<&Paper, DomainError> {
        self.papers
            .values()
            .find(|p| p.name == name)
            .ok_or_else(|| DomainError::PaperNotFound { name: name.to_string() })
    }

    fn paper_by_name_mut(&mut self, name: &str) -> Result<&mut Paper, DomainError> {
        self.papers
            .values_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| DomainError::PaperNotFound { name: name.to_string() })
    }

    pub fn add_paper(&mut self, new: NewPaper, today: NaiveDate) -> Result<&Paper, DomainError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        if self.papers.values().any(|p| p.name == name) {
            return Err(DomainError::DuplicatePaper { name });
        }

        let id = Self::fresh_id(&self.papers, "paper");
        info!(%id, paper = %name, deadline = %new.deadline, "add_paper");
        let paper = Paper {
            id: id.clone(),
            name,
            deadline: new.deadline,
            conference: new.conference.filter(|c| !c.trim().is_empty()),
            description: new.description.filter(|d| !d.trim().is_empty()),
            archived: false,
            created_on: today,
        };
        Ok(self.papers.entry(id).or_insert(paper))
    }

    pub fn archive_paper(&mut self, name: &str) -> Result<&Paper, DomainError> {
        let paper = self.paper_by_name_mut(name)?;
        paper.archived = true;
        info!(paper = %paper.name, "archive_paper");
        Ok(paper)
    }

    /// Papers ordered by deadline, then name
    pub fn papers_by_deadline(&self, include_archived: bool) -> Vec<&Paper> {
        let mut papers: Vec<&Paper> = self
            .papers
            .values()
            .filter(|p| include_archived || !p.archived)
            .collect();
        papers.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.name.cmp(&b.name)));
        papers
    }

    // ---------------------------------------------------------------------
    // Milestones
    // ---------------------------------------------------------------------

    pub fn add_milestone(
        &mut self,
        paper_name: &str,
        new: NewMilestone,
        today: NaiveDate,
    ) -> Result<&Milestone, DomainError> {
        let description = new.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        let paper = self.paper_by_name(paper_name)?;
        if new.due_date > paper.deadline {
            warn!(
                paper = %paper.name,
                due = %new.due_date,
                deadline = %paper.deadline,
                "add_milestone: milestone is due after the paper deadline"
            );
        }
        let paper_id = paper.id.clone();

        let id = Self::fresh_id(&self.milestones, "milestone");
        info!(%id, %paper_id, due = %new.due_date, "add_milestone");
        let milestone = Milestone {
            id: id.clone(),
            paper_id,
            description,
            due_date: new.due_date,
            priority: new.priority,
            completed: false,
            decomposed: false,
            created_on: today,
        };
        Ok(self.milestones.entry(id).or_insert(milestone))
    }

    pub fn milestone(&self, id: &DomainId) -> Result<&Milestone, DomainError> {
        self.milestones
            .get(id)
            .ok_or_else(|| DomainError::MilestoneNotFound { reference: id.to_string() })
    }

    /// Resolve a full id or unique id prefix to a Milestone id
    pub fn resolve_milestone(&self, reference: &str) -> Result<DomainId, DomainError> {
        match IdResolver::new(&self.milestones).resolve(reference) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(DomainError::MilestoneNotFound {
                reference: reference.to_string(),
            }),
            Err(candidates) => Err(DomainError::AmbiguousId {
                reference: reference.to_string(),
                candidates,
            }),
        }
    }

    pub fn complete_milestone(&mut self, reference: &str) -> Result<&Milestone, DomainError> {
        let id = self.resolve_milestone(reference)?;
        let milestone = self
            .milestones
            .get_mut(&id)
            .ok_or_else(|| DomainError::MilestoneNotFound { reference: id.to_string() })?;
        milestone.completed = true;
        info!(%id, "complete_milestone");
        Ok(milestone)
    }

    pub fn mark_decomposed(&mut self, id: &DomainId) -> Result<(), DomainError> {
        let milestone = self
            .milestones
            .get_mut(id)
            .ok_or_else(|| DomainError::MilestoneNotFound { reference: id.to_string() })?;
        milestone.decomposed = true;
        Ok(())
    }

    /// Milestones of a paper, by due date then descending priority
    pub fn milestones_for(&self, paper_id: &DomainId, include_completed: bool) -> Vec<&Milestone> {
        let mut milestones: Vec<&Milestone> = self
            .milestones
            .values()
            .filter(|m| &m.paper_id == paper_id && (include_completed || !m.completed))
            .collect();
        milestones.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.id.cmp(&b.id))
        });
        milestones
    }

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    /// Tasks of a milestone in insertion order
    pub fn tasks_for(&self, milestone_id: &DomainId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| &t.milestone_id == milestone_id)
            .collect();
        tasks.sort_by_key(|t| t.seq);
        tasks
    }

    /// Insert a task under a milestone
    ///
    /// Returns `Ok(None)` when an identical (description, due date) task
    /// already exists under the same milestone.
    pub fn add_task(
        &mut self,
        milestone_id: &DomainId,
        new: NewTask,
        today: NaiveDate,
    ) -> Result<Option<&Task>, DomainError> {
        let description = new.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        self.milestone(milestone_id)?;

        let duplicate = self
            .tasks
            .values()
            .any(|t| &t.milestone_id == milestone_id && t.dedup_key() == (description.as_str(), new.due_date));
        if duplicate {
            debug!(%milestone_id, %description, due = %new.due_date, "add_task: duplicate skipped");
            return Ok(None);
        }

        let id = Self::fresh_id(&self.tasks, "task");
        let seq = self.next_seq;
        self.next_seq += 1;
        let task = Task {
            id: id.clone(),
            milestone_id: milestone_id.clone(),
            description,
            due_date: new.due_date,
            estimated_hours: new.estimated_hours,
            completed: false,
            source: new.source,
            created_on: today,
            seq,
        };
        Ok(Some(self.tasks.entry(id).or_insert(task)))
    }

    /// Remove incomplete LLM-generated tasks of a milestone, returning how many
    pub fn discard_pending_generated(&mut self, milestone_id: &DomainId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, t| {
            !(&t.milestone_id == milestone_id && !t.completed && t.source == TaskSource::Llm)
        });
        let removed = before - self.tasks.len();
        debug!(%milestone_id, removed, "discard_pending_generated");
        removed
    }

    /// Resolve a full id or unique id prefix to a Task id
    pub fn resolve_task(&self, reference: &str) -> Result<DomainId, DomainError> {
        match IdResolver::new(&self.tasks).resolve(reference) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(DomainError::TaskNotFound {
                reference: reference.to_string(),
            }),
            Err(candidates) => Err(DomainError::AmbiguousId {
                reference: reference.to_string(),
                candidates,
            }),
        }
    }

    pub fn complete_task(&mut self, reference: &str) -> Result<&Task, DomainError> {
        let id = self.resolve_task(reference)?;
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| DomainError::TaskNotFound { reference: id.to_string() })?;
        task.completed = true;
        info!(%id, "complete_task");
        Ok(task)
    }

    /// Walk a task up to its milestone and paper
    pub fn lineage(&self, task: &Task) -> Option<(&Milestone, &Paper)> {
        let milestone = self.milestones.get(&task.milestone_id)?;
        let paper = self.papers.get(&milestone.paper_id)?;
        Some((milestone, paper))
    }
}
