//! Console rendering
//!
//! Renderers build strings so they can be tested; the binary prints them.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use colored::*;

use crate::dates::{days_until, format_date, iso};
use crate::decompose::{DecompositionReport, MilestoneStatus};
use crate::domain::{Milestone, Model, NewTask, Paper, Task};
use crate::query::{PaperGroup, QueryMode};

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn info(message: &str) {
    println!("{}", message.dimmed());
}

fn hours(estimate: Option<f32>) -> String {
    estimate.map_or_else(|| "-".to_string(), |h| format!("{h:.1}h"))
}

fn days_left(deadline: NaiveDate, today: NaiveDate) -> ColoredString {
    match days_until(deadline, today) {
        n if n < 0 => format!("{:<16}", format!("{} days overdue", -n)).red(),
        0 => format!("{:<16}", "due today").red().bold(),
        n if n <= 7 => format!("{:<16}", format!("{n} days left")).yellow(),
        n => format!("{:<16}", format!("{n} days left")).normal(),
    }
}

/// `list papers` output
pub fn papers(model: &Model, papers: &[&Paper], today: NaiveDate) -> String {
    let mut out = String::new();
    let width = papers.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    for paper in papers {
        let milestones = model.milestones_for(&paper.id, true);
        let done = milestones.iter().filter(|m| m.completed).count();
        let _ = write!(
            out,
            "{}  {}  {}  {}",
            format!("{:<width$}", paper.name).bold(),
            iso(paper.deadline),
            days_left(paper.deadline, today),
            format!("{done}/{} milestones", milestones.len()).dimmed(),
        );
        if let Some(conference) = &paper.conference {
            let _ = write!(out, "  {}", conference.cyan());
        }
        if paper.archived {
            let _ = write!(out, "  {}", "[archived]".dimmed());
        }
        out.push('\n');
        if let Some(description) = &paper.description {
            let _ = writeln!(out, "{:<width$}  {}", "", description.dimmed());
        }
    }
    out
}

/// `list milestones` output
pub fn milestones(paper: &Paper, milestones: &[&Milestone], model: &Model, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (deadline {}, {})",
        paper.name.bold(),
        iso(paper.deadline),
        format_date(paper.deadline, today)
    );
    for milestone in milestones {
        let tasks = model.tasks_for(&milestone.id);
        let done = tasks.iter().filter(|t| t.completed).count();
        let status = if milestone.completed {
            "done".green()
        } else if milestone.decomposed {
            format!("{done}/{} tasks", tasks.len()).cyan()
        } else {
            "not decomposed".dimmed()
        };
        let _ = writeln!(
            out,
            "  {}  P{}  {}  {:<14}  {}  [{}]",
            milestone.id.as_str().yellow(),
            milestone.priority,
            iso(milestone.due_date),
            format_date(milestone.due_date, today),
            milestone.description,
            status,
        );
    }
    out
}

fn task_line(task: &Task, milestone: &Milestone, overdue: bool, today: NaiveDate) -> String {
    let check = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let description = if overdue {
        task.description.red()
    } else if task.completed {
        task.description.dimmed()
    } else {
        task.description.normal()
    };
    let when = if overdue {
        format!("overdue, {}", format_date(task.due_date, today)).red()
    } else {
        format_date(task.due_date, today).normal()
    };
    format!(
        "  {} {}  {}  {}  {}  {}",
        check,
        description,
        hours(task.estimated_hours).dimmed(),
        when,
        milestone.description.dimmed(),
        task.id.as_str().yellow(),
    )
}

/// `today` output
pub fn task_groups(groups: &[PaperGroup<'_>], mode: QueryMode, today: NaiveDate) -> String {
    let mut out = String::new();
    let title = match mode {
        QueryMode::Today => format!("Today's tasks ({})", today.format("%a, %b %d")),
        QueryMode::All => "All pending tasks".to_string(),
    };
    let _ = writeln!(out, "{}", title.bold());
    for group in groups {
        let _ = writeln!(
            out,
            "\n{} {}",
            group.paper.name.bold(),
            format!("(deadline {}, {})", iso(group.paper.deadline), format_date(group.paper.deadline, today)).dimmed()
        );
        for entry in &group.entries {
            let _ = writeln!(out, "{}", task_line(entry.task, entry.milestone, entry.overdue, today));
        }
    }
    out
}

/// `decompose` output, tasks grouped by day
pub fn decomposition(report: &DecompositionReport, today: NaiveDate) -> String {
    let mut out = String::new();
    if report.dry_run {
        let _ = writeln!(out, "{}", "Dry run: nothing will be saved".yellow().bold());
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<(&str, &NewTask)>> = BTreeMap::new();
    for (outcome, task) in report.tasks() {
        by_date
            .entry(task.due_date)
            .or_default()
            .push((outcome.description.as_str(), task));
    }
    for (date, tasks) in &by_date {
        let _ = writeln!(out, "\n{} {}", iso(*date).bold(), format!("({})", format_date(*date, today)).dimmed());
        for (milestone, task) in tasks {
            let _ = writeln!(
                out,
                "  - {}  {}  {}",
                task.description,
                hours(task.estimated_hours).dimmed(),
                milestone.dimmed()
            );
        }
    }

    for outcome in &report.outcomes {
        match &outcome.status {
            MilestoneStatus::Failed { reason } => {
                let _ = writeln!(out, "{} {}: {}", "✗".red(), outcome.description, reason);
            }
            MilestoneStatus::PastDue => {
                let _ = writeln!(
                    out,
                    "{} {}: due {} has passed, skipped",
                    "!".yellow(),
                    outcome.description,
                    iso(outcome.due_date)
                );
            }
            MilestoneStatus::Planned => {
                let mut notes = Vec::new();
                if outcome.replaced > 0 {
                    notes.push(format!("{} replaced", outcome.replaced));
                }
                if outcome.duplicates > 0 {
                    notes.push(format!("{} duplicate", outcome.duplicates));
                }
                if outcome.dropped > 0 {
                    notes.push(format!("{} invalid dropped", outcome.dropped));
                }
                if outcome.kept_previous > 0 {
                    let _ = writeln!(
                        out,
                        "{} {}: no valid tasks returned, kept {} previous task(s)",
                        "!".yellow(),
                        outcome.description,
                        outcome.kept_previous
                    );
                }
                if !notes.is_empty() {
                    let _ = writeln!(out, "{}", format!("{}: {}", outcome.description, notes.join(", ")).dimmed());
                }
            }
        }
    }

    let count = report.task_count();
    let summary = if report.dry_run {
        format!("Would create {count} task(s) for {}", report.paper)
    } else {
        format!("Created {count} task(s) for {}", report.paper)
    };
    let _ = writeln!(out, "\n{summary}");
    out
}
