//! Today/overdue query engine
//!
//! Selects tasks relative to a caller-supplied reference date and groups them
//! by paper for display.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{DomainError, DomainId, Milestone, Model, Paper, Task};

/// Which tasks to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Due on the reference date, plus incomplete tasks due earlier
    #[default]
    Today,
    /// Every incomplete task regardless of date
    All,
}

/// One selected task with its milestone
#[derive(Debug, Clone)]
pub struct TaskEntry<'a> {
    pub task: &'a Task,
    pub milestone: &'a Milestone,
    /// Incomplete and due before the reference date
    pub overdue: bool,
}

/// Selected tasks of one paper, in display order
#[derive(Debug, Clone)]
pub struct PaperGroup<'a> {
    pub paper: &'a Paper,
    pub entries: Vec<TaskEntry<'a>>,
}

impl PaperGroup<'_> {
    pub fn overdue_count(&self) -> usize {
        self.entries.iter().filter(|e| e.overdue).count()
    }
}

/// Run a query over the model
///
/// Groups are ordered by paper deadline; entries by due date, then
/// descending milestone priority, then insertion order. Archived papers are
/// skipped unless `paper_filter` names one explicitly.
pub fn query<'a>(
    model: &'a Model,
    today: NaiveDate,
    mode: QueryMode,
    paper_filter: Option<&str>,
) -> Result<Vec<PaperGroup<'a>>, DomainError> {
    let filter_id = match paper_filter {
        Some(name) => Some(model.paper_by_name(name)?.id.clone()),
        None => None,
    };

    let mut grouped: BTreeMap<&DomainId, Vec<TaskEntry<'a>>> = BTreeMap::new();
    for task in model.tasks.values() {
        if !selected(task, today, mode) {
            continue;
        }
        let Some((milestone, paper)) = model.lineage(task) else {
            debug!(task_id = %task.id, "query: orphaned task skipped");
            continue;
        };
        let wanted = match &filter_id {
            Some(id) => &paper.id == id,
            None => !paper.archived,
        };
        if !wanted {
            continue;
        }
        grouped.entry(&paper.id).or_default().push(TaskEntry {
            task,
            milestone,
            overdue: is_overdue(task, today),
        });
    }

    let mut groups: Vec<PaperGroup<'a>> = grouped
        .into_iter()
        .filter_map(|(paper_id, mut entries)| {
            let paper = model.papers.get(paper_id)?;
            entries.sort_by(compare_entries);
            Some(PaperGroup { paper, entries })
        })
        .collect();
    groups.sort_by(|a, b| {
        a.paper
            .deadline
            .cmp(&b.paper.deadline)
            .then_with(|| a.paper.name.cmp(&b.paper.name))
    });

    debug!(
        ?mode,
        %today,
        groups = groups.len(),
        tasks = groups.iter().map(|g| g.entries.len()).sum::<usize>(),
        "query: done"
    );
    Ok(groups)
}

fn selected(task: &Task, today: NaiveDate, mode: QueryMode) -> bool {
    match mode {
        QueryMode::Today => task.due_date == today || is_overdue(task, today),
        QueryMode::All => !task.completed,
    }
}

fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date < today
}

fn compare_entries(a: &TaskEntry<'_>, b: &TaskEntry<'_>) -> Ordering {
    a.task
        .due_date
        .cmp(&b.task.due_date)
        .then_with(|| b.milestone.priority.cmp(&a.milestone.priority))
        .then_with(|| a.task.seq.cmp(&b.task.seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewMilestone, NewPaper, NewTask, Priority, TaskSource};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn paper(model: &mut Model, name: &str, deadline: NaiveDate) {
        model
            .add_paper(
                NewPaper {
                    name: name.to_string(),
                    deadline,
                    conference: None,
                    description: None,
                },
                d(2025, 5, 1),
            )
            .unwrap();
    }

    fn milestone(model: &mut Model, paper: &str, description: &str, priority: u8) -> DomainId {
        model
            .add_milestone(
                paper,
                NewMilestone {
                    description: description.to_string(),
                    due_date: d(2025, 5, 30),
                    priority: Priority::new(priority).unwrap(),
                },
                d(2025, 5, 1),
            )
            .unwrap()
            .id
            .clone()
    }

    fn task(model: &mut Model, milestone: &DomainId, description: &str, due: NaiveDate) -> DomainId {
        model
            .add_task(
                milestone,
                NewTask {
                    description: description.to_string(),
                    due_date: due,
                    estimated_hours: None,
                    source: TaskSource::Llm,
                },
                d(2025, 5, 1),
            )
            .unwrap()
            .unwrap()
            .id
            .clone()
    }

    fn descriptions(groups: &[PaperGroup<'_>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.entries.iter().map(|e| e.task.description.clone()).collect())
            .collect()
    }

    #[test]
    fn test_today_includes_overdue_flagged() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        let m = milestone(&mut model, "X", "draft", 3);
        task(&mut model, &m, "late", d(2025, 5, 10));
        task(&mut model, &m, "now", d(2025, 5, 12));
        task(&mut model, &m, "later", d(2025, 5, 13));

        let groups = query(&model, d(2025, 5, 12), QueryMode::Today, None).unwrap();

        assert_eq!(groups.len(), 1);
        let entries = &groups[0].entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task.description, "late");
        assert!(entries[0].overdue);
        assert_eq!(entries[1].task.description, "now");
        assert!(!entries[1].overdue);
        assert_eq!(groups[0].overdue_count(), 1);
    }

    #[test]
    fn test_today_hides_completed_past_tasks() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        let m = milestone(&mut model, "X", "draft", 3);
        let old = task(&mut model, &m, "old", d(2025, 5, 10));
        let now = task(&mut model, &m, "now", d(2025, 5, 12));
        model.complete_task(old.as_str()).unwrap();
        model.complete_task(now.as_str()).unwrap();

        let groups = query(&model, d(2025, 5, 12), QueryMode::Today, None).unwrap();
        assert_eq!(descriptions(&groups), vec![vec!["now".to_string()]]);
        assert!(!groups[0].entries[0].overdue);
    }

    #[test]
    fn test_all_mode_returns_every_incomplete_task() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        let m = milestone(&mut model, "X", "draft", 3);
        task(&mut model, &m, "late", d(2025, 5, 10));
        task(&mut model, &m, "future", d(2025, 5, 20));
        let done = task(&mut model, &m, "done", d(2025, 5, 12));
        model.complete_task(done.as_str()).unwrap();

        let groups = query(&model, d(2025, 5, 12), QueryMode::All, None).unwrap();
        assert_eq!(descriptions(&groups), vec![vec!["late".to_string(), "future".to_string()]]);
        assert!(groups[0].entries[0].overdue);
        assert!(!groups[0].entries[1].overdue);
    }

    #[test]
    fn test_ordering_across_papers_and_priorities() {
        let mut model = Model::new();
        paper(&mut model, "Later", d(2025, 7, 1));
        paper(&mut model, "Sooner", d(2025, 6, 1));
        let later = milestone(&mut model, "Later", "m", 3);
        let low = milestone(&mut model, "Sooner", "low", 1);
        let high = milestone(&mut model, "Sooner", "high", 5);

        let today = d(2025, 5, 12);
        task(&mut model, &later, "later paper", today);
        task(&mut model, &low, "low first inserted", today);
        task(&mut model, &high, "high", today);
        task(&mut model, &low, "low second inserted", today);
        task(&mut model, &low, "overdue low", d(2025, 5, 11));

        let groups = query(&model, today, QueryMode::Today, None).unwrap();
        assert_eq!(
            descriptions(&groups),
            vec![
                vec![
                    "overdue low".to_string(),
                    "high".to_string(),
                    "low first inserted".to_string(),
                    "low second inserted".to_string(),
                ],
                vec!["later paper".to_string()],
            ]
        );
    }

    #[test]
    fn test_paper_filter() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        paper(&mut model, "Y", d(2025, 6, 2));
        let mx = milestone(&mut model, "X", "a", 3);
        let my = milestone(&mut model, "Y", "b", 3);
        task(&mut model, &mx, "x task", d(2025, 5, 12));
        task(&mut model, &my, "y task", d(2025, 5, 12));

        let groups = query(&model, d(2025, 5, 12), QueryMode::Today, Some("Y")).unwrap();
        assert_eq!(descriptions(&groups), vec![vec!["y task".to_string()]]);

        let err = query(&model, d(2025, 5, 12), QueryMode::Today, Some("y")).unwrap_err();
        assert_eq!(err, DomainError::PaperNotFound { name: "y".to_string() });
    }

    #[test]
    fn test_all_mode_with_paper_filter() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        paper(&mut model, "Y", d(2025, 6, 2));
        let mx = milestone(&mut model, "X", "a", 3);
        let my = milestone(&mut model, "Y", "b", 3);
        task(&mut model, &mx, "x late", d(2025, 5, 10));
        task(&mut model, &mx, "x future", d(2025, 5, 20));
        let done = task(&mut model, &mx, "x done", d(2025, 5, 11));
        model.complete_task(done.as_str()).unwrap();
        task(&mut model, &my, "y task", d(2025, 5, 12));

        let groups = query(&model, d(2025, 5, 12), QueryMode::All, Some("X")).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paper.name, "X");
        let entries: Vec<(&str, bool)> = groups[0]
            .entries
            .iter()
            .map(|e| (e.task.description.as_str(), e.overdue))
            .collect();
        assert_eq!(entries, vec![("x late", true), ("x future", false)]);
        assert_eq!(groups[0].overdue_count(), 1);
    }

    #[test]
    fn test_archived_papers_hidden_unless_named() {
        let mut model = Model::new();
        paper(&mut model, "X", d(2025, 6, 1));
        let m = milestone(&mut model, "X", "a", 3);
        task(&mut model, &m, "x task", d(2025, 5, 12));
        model.archive_paper("X").unwrap();

        assert!(query(&model, d(2025, 5, 12), QueryMode::Today, None).unwrap().is_empty());
        let named = query(&model, d(2025, 5, 12), QueryMode::Today, Some("X")).unwrap();
        assert_eq!(descriptions(&named), vec![vec!["x task".to_string()]]);
    }

    #[test]
    fn test_empty_model() {
        let model = Model::new();
        assert!(query(&model, d(2025, 5, 12), QueryMode::All, None).unwrap().is_empty());
    }
}
