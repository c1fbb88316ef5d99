//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Priority;

/// Paper Bartender - break paper deadlines into daily tasks
#[derive(Parser, Debug)]
#[command(
    name = "pb",
    about = "Track paper deadlines and break milestones into daily tasks",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/paper-bartender/logs/paper-bartender.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `today`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show tasks due today and overdue tasks
    Today {
        /// Show every pending task instead
        #[arg(short, long)]
        all: bool,

        /// Only show tasks for this paper
        #[arg(short, long)]
        paper: Option<String>,
    },

    /// Add a paper or milestone
    Add {
        #[command(subcommand)]
        what: AddCommand,
    },

    /// List papers or milestones
    List {
        #[command(subcommand)]
        what: ListCommand,
    },

    /// Break a paper's milestones into daily tasks with the LLM
    Decompose {
        /// Paper name
        paper: String,

        /// Regenerate milestones that were already decomposed
        #[arg(short, long)]
        force: bool,

        /// Show what would be created without saving
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Mark a task as done
    Done {
        /// Task id or unique id prefix
        task: String,
    },

    /// Mark a milestone as completed
    Complete {
        /// Milestone id or unique id prefix
        milestone: String,
    },

    /// Archive a paper
    Archive {
        /// Paper name
        paper: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddCommand {
    /// Add a paper with a submission deadline
    Paper {
        /// Paper name (must be unique)
        name: String,

        /// Deadline: YYYY-MM-DD, M/D, today, tomorrow, "in N days", "in N weeks"
        #[arg(short, long)]
        deadline: String,

        /// Target conference or venue
        #[arg(short, long)]
        conference: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },

    /// Add a milestone to a paper
    Milestone {
        /// Paper name
        paper: String,

        /// What the milestone is
        description: String,

        /// Due date (same formats as --deadline)
        #[arg(short, long)]
        due: String,

        /// Priority from 1 (low) to 5 (high)
        #[arg(short, long, default_value_t = Priority::default())]
        priority: Priority,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List papers by deadline
    Papers {
        /// Include archived papers
        #[arg(short, long)]
        archived: bool,
    },

    /// List a paper's milestones
    Milestones {
        /// Paper name
        paper: String,

        /// Include completed milestones
        #[arg(long)]
        completed: bool,
    },
}
