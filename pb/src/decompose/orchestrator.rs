//! Decomposer - turns a paper's milestones into daily tasks
//!
//! Runs in two phases. The planning phase calls the generator once per
//! eligible milestone and validates what comes back without touching the
//! model. The commit phase (skipped on dry runs) applies every planned batch,
//! flips `decomposed` and saves once.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{GenerationRequest, TaskCandidate, TaskGenerator};
use crate::dates;
use crate::domain::{DomainError, DomainId, Milestone, Model, NewTask, Paper, TaskSource};
use crate::store::{Store, StoreError};

/// Errors that abort a whole decomposition run
///
/// Per-milestone generator failures are not errors here; they are recorded
/// in the report.
#[derive(Debug, Error)]
pub enum DecomposeError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Flags for a decomposition run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecomposeOptions {
    /// Regenerate milestones that were already decomposed
    pub force: bool,
    /// Compute and report, but never mutate or save
    pub dry_run: bool,
}

/// What happened to one eligible milestone
#[derive(Debug, Clone, PartialEq)]
pub enum MilestoneStatus {
    /// The generator answered; `tasks` holds the surviving candidates
    Planned,
    /// The generator failed; the milestone is left as it was
    Failed { reason: String },
    /// Due before today, so there is no window to schedule into
    PastDue,
}

/// Per-milestone result of a run
#[derive(Debug, Clone)]
pub struct MilestoneOutcome {
    pub milestone_id: DomainId,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    /// Validated, de-duplicated tasks (inserted unless dry run)
    pub tasks: Vec<NewTask>,
    /// Ids of inserted tasks, empty on dry runs
    pub task_ids: Vec<DomainId>,
    /// Candidates rejected for a bad date, an out-of-window date or an empty description
    pub dropped: usize,
    /// Candidates matching an existing task or an earlier candidate
    pub duplicates: usize,
    /// Pending generated tasks discarded by a forced regeneration
    pub replaced: usize,
    /// Pending generated tasks left in place because a forced regeneration produced nothing usable
    pub kept_previous: usize,
}

impl MilestoneOutcome {
    fn new(milestone: &Milestone, status: MilestoneStatus) -> Self {
        Self {
            milestone_id: milestone.id.clone(),
            description: milestone.description.clone(),
            due_date: milestone.due_date,
            status,
            tasks: Vec::new(),
            task_ids: Vec::new(),
            dropped: 0,
            duplicates: 0,
            replaced: 0,
            kept_previous: 0,
        }
    }

    pub fn is_planned(&self) -> bool {
        self.status == MilestoneStatus::Planned
    }
}

/// Result of a decomposition run
#[derive(Debug, Clone)]
pub struct DecompositionReport {
    pub paper: String,
    pub dry_run: bool,
    pub outcomes: Vec<MilestoneOutcome>,
    /// Whether the store was written
    pub saved: bool,
}

impl DecompositionReport {
    /// True when no milestone was eligible
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Every planned task with the milestone it belongs to
    pub fn tasks(&self) -> impl Iterator<Item = (&MilestoneOutcome, &NewTask)> {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.tasks.iter().map(move |task| (outcome, task)))
    }

    pub fn task_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.tasks.len()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MilestoneOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, MilestoneStatus::Failed { .. }))
    }
}

/// Drives a `TaskGenerator` over a paper's eligible milestones
pub struct Decomposer {
    generator: Arc<dyn TaskGenerator>,
}

impl Decomposer {
    pub fn new(generator: Arc<dyn TaskGenerator>) -> Self {
        Self { generator }
    }

    /// Decompose the named paper's milestones into tasks
    ///
    /// `today` is the earliest schedulable day and the reference for parsing
    /// candidate dates.
    pub async fn decompose(
        &self,
        model: &mut Model,
        store: &Store,
        paper_name: &str,
        options: DecomposeOptions,
        today: NaiveDate,
    ) -> Result<DecompositionReport, DecomposeError> {
        let paper = model.paper_by_name(paper_name)?.clone();
        let eligible: Vec<Milestone> = model
            .milestones_for(&paper.id, false)
            .into_iter()
            .filter(|m| m.is_decomposable(options.force))
            .cloned()
            .collect();

        info!(
            paper = %paper.name,
            eligible = eligible.len(),
            force = options.force,
            dry_run = options.dry_run,
            "decompose: called"
        );

        let mut report = DecompositionReport {
            paper: paper.name.clone(),
            dry_run: options.dry_run,
            outcomes: Vec::with_capacity(eligible.len()),
            saved: false,
        };
        if eligible.is_empty() {
            info!(paper = %paper.name, "decompose: nothing to decompose");
            return Ok(report);
        }

        for milestone in &eligible {
            let outcome = self.plan_milestone(model, &paper, milestone, options, today).await;
            report.outcomes.push(outcome);
        }

        if options.dry_run {
            debug!(tasks = report.task_count(), "decompose: dry run, model untouched");
            return Ok(report);
        }

        let mut committed = false;
        for outcome in report.outcomes.iter_mut().filter(|o| o.is_planned()) {
            commit_outcome(model, outcome, today)?;
            committed = true;
        }

        if committed {
            store.save(model)?;
            report.saved = true;
        }
        info!(paper = %paper.name, tasks = report.task_count(), saved = report.saved, "decompose: done");
        Ok(report)
    }

    /// Ask the generator for one milestone and validate the answer
    async fn plan_milestone(
        &self,
        model: &Model,
        paper: &Paper,
        milestone: &Milestone,
        options: DecomposeOptions,
        today: NaiveDate,
    ) -> MilestoneOutcome {
        if milestone.due_date < today {
            warn!(milestone_id = %milestone.id, due = %milestone.due_date, "plan_milestone: due date has passed, skipping");
            return MilestoneOutcome::new(milestone, MilestoneStatus::PastDue);
        }

        let request = GenerationRequest {
            paper,
            milestone,
            earliest: today,
            latest: milestone.due_date,
        };
        let candidates = match self.generator.generate(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(milestone_id = %milestone.id, error = %e, "plan_milestone: generator failed, skipping");
                return MilestoneOutcome::new(milestone, MilestoneStatus::Failed { reason: e.to_string() });
            }
        };

        let mut outcome = MilestoneOutcome::new(milestone, MilestoneStatus::Planned);
        let replacing = options.force && milestone.decomposed;

        // Existing tasks that survive the run and therefore block duplicates
        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
        for task in model.tasks_for(&milestone.id) {
            if replacing && is_replaceable(task.completed, task.source) {
                outcome.replaced += 1;
            } else {
                seen.insert((task.description.clone(), task.due_date));
            }
        }

        for candidate in candidates {
            let Some(task) = validate_candidate(&candidate, milestone.due_date, today) else {
                debug!(milestone_id = %milestone.id, ?candidate, "plan_milestone: dropped candidate");
                outcome.dropped += 1;
                continue;
            };
            if !seen.insert((task.description.clone(), task.due_date)) {
                outcome.duplicates += 1;
                continue;
            }
            outcome.tasks.push(task);
        }

        // Never trade a working schedule for an empty one
        if outcome.tasks.is_empty() && outcome.replaced > 0 {
            warn!(
                milestone_id = %milestone.id,
                kept = outcome.replaced,
                "plan_milestone: no usable candidates, keeping previous tasks"
            );
            outcome.kept_previous = std::mem::take(&mut outcome.replaced);
        }

        info!(
            milestone_id = %milestone.id,
            planned = outcome.tasks.len(),
            dropped = outcome.dropped,
            duplicates = outcome.duplicates,
            replaced = outcome.replaced,
            kept_previous = outcome.kept_previous,
            "plan_milestone: validated candidates"
        );
        outcome
    }
}

fn is_replaceable(completed: bool, source: TaskSource) -> bool {
    !completed && source == TaskSource::Llm
}

/// Normalize a candidate, or `None` if it cannot be scheduled in `[today, due]`
fn validate_candidate(candidate: &TaskCandidate, due: NaiveDate, today: NaiveDate) -> Option<NewTask> {
    let description = candidate.description.trim();
    if description.is_empty() {
        return None;
    }
    let due_date = dates::parse(&candidate.due_date, today).ok()?;
    if due_date < today || due_date > due {
        return None;
    }
    let estimated_hours = candidate.estimated_hours.filter(|h| h.is_finite() && *h > 0.0);
    Some(NewTask {
        description: description.to_string(),
        due_date,
        estimated_hours,
        source: TaskSource::Llm,
    })
}

fn commit_outcome(model: &mut Model, outcome: &mut MilestoneOutcome, today: NaiveDate) -> Result<(), DomainError> {
    if outcome.replaced > 0 {
        model.discard_pending_generated(&outcome.milestone_id);
    }
    for task in &outcome.tasks {
        if let Some(inserted) = model.add_task(&outcome.milestone_id, task.clone(), today)? {
            outcome.task_ids.push(inserted.id.clone());
        }
    }
    model.mark_decomposed(&outcome.milestone_id)
}
