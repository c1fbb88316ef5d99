use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use paperbartender::cli::{AddCommand, Cli, Command, ListCommand};
use paperbartender::dates::{self, format_date, iso};
use paperbartender::decompose::{DecomposeOptions, Decomposer, LlmTaskGenerator};
use paperbartender::domain::{NewMilestone, NewPaper, Priority};
use paperbartender::{Config, QueryMode, Store, display, llm, query};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paper-bartender")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Log to a file, never stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("paper-bartender.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        display::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store = Store::new(config.state_file());

    // One reference date for the whole invocation
    let today = Local::now().date_naive();
    info!(state_file = %store.path().display(), %today, "pb starting");

    let command = cli.command.unwrap_or(Command::Today { all: false, paper: None });
    match command {
        Command::Today { all, paper } => cmd_today(&store, today, all, paper.as_deref()),
        Command::Add { what } => match what {
            AddCommand::Paper {
                name,
                deadline,
                conference,
                description,
            } => cmd_add_paper(&store, today, name, &deadline, conference, description),
            AddCommand::Milestone {
                paper,
                description,
                due,
                priority,
            } => cmd_add_milestone(&store, today, &paper, description, &due, priority),
        },
        Command::List { what } => match what {
            ListCommand::Papers { archived } => cmd_list_papers(&store, today, archived),
            ListCommand::Milestones { paper, completed } => cmd_list_milestones(&store, today, &paper, completed),
        },
        Command::Decompose { paper, force, dry_run } => {
            cmd_decompose(&config, &store, today, &paper, DecomposeOptions { force, dry_run }).await
        }
        Command::Done { task } => cmd_done(&store, &task),
        Command::Complete { milestone } => cmd_complete(&store, &milestone),
        Command::Archive { paper } => cmd_archive(&store, &paper),
    }
}

fn cmd_today(store: &Store, today: NaiveDate, all: bool, paper: Option<&str>) -> Result<()> {
    let model = store.load()?;
    let mode = if all { QueryMode::All } else { QueryMode::Today };
    let groups = query(&model, today, mode, paper)?;

    let overdue: usize = groups.iter().map(|g| g.overdue_count()).sum();
    if overdue > 0 {
        display::warning(&format!("You have {overdue} overdue task(s)!"));
    }
    if groups.is_empty() {
        match mode {
            QueryMode::All => display::info("No pending tasks. Great job!"),
            QueryMode::Today => {
                display::info("No tasks scheduled for today. Use 'pb today --all' to see all pending tasks.")
            }
        }
        return Ok(());
    }
    print!("{}", display::task_groups(&groups, mode, today));
    Ok(())
}

fn cmd_add_paper(
    store: &Store,
    today: NaiveDate,
    name: String,
    deadline: &str,
    conference: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let deadline = dates::parse(deadline, today)?;
    let mut model = store.load()?;
    let paper = model.add_paper(
        NewPaper {
            name,
            deadline,
            conference,
            description,
        },
        today,
    )?;
    let message = format!(
        "Added paper \"{}\" (deadline {}, {})",
        paper.name,
        iso(paper.deadline),
        format_date(paper.deadline, today)
    );
    store.save(&model)?;
    display::success(&message);
    if deadline < today {
        display::warning("The deadline is already in the past");
    }
    Ok(())
}

fn cmd_add_milestone(
    store: &Store,
    today: NaiveDate,
    paper: &str,
    description: String,
    due: &str,
    priority: Priority,
) -> Result<()> {
    let due_date = dates::parse(due, today)?;
    let mut model = store.load()?;
    let deadline = model.paper_by_name(paper)?.deadline;
    let milestone = model.add_milestone(
        paper,
        NewMilestone {
            description,
            due_date,
            priority,
        },
        today,
    )?;
    let message = format!(
        "Added milestone {} \"{}\" (due {}, priority {})",
        milestone.id,
        milestone.description,
        iso(milestone.due_date),
        milestone.priority
    );
    store.save(&model)?;
    display::success(&message);
    if due_date > deadline {
        display::warning(&format!("Milestone is due after the paper deadline ({})", iso(deadline)));
    }
    Ok(())
}

fn cmd_list_papers(store: &Store, today: NaiveDate, archived: bool) -> Result<()> {
    let model = store.load()?;
    let papers = model.papers_by_deadline(archived);
    if papers.is_empty() {
        display::info("No papers yet. Add one with 'pb add paper NAME --deadline DATE'.");
        return Ok(());
    }
    print!("{}", display::papers(&model, &papers, today));
    Ok(())
}

fn cmd_list_milestones(store: &Store, today: NaiveDate, paper: &str, completed: bool) -> Result<()> {
    let model = store.load()?;
    let paper = model.paper_by_name(paper)?;
    let milestones = model.milestones_for(&paper.id, completed);
    if milestones.is_empty() {
        display::info(&format!(
            "No milestones for \"{}\". Add one with 'pb add milestone \"{}\" DESCRIPTION --due DATE'.",
            paper.name, paper.name
        ));
        return Ok(());
    }
    print!("{}", display::milestones(paper, &milestones, &model, today));
    Ok(())
}

async fn cmd_decompose(
    config: &Config,
    store: &Store,
    today: NaiveDate,
    paper: &str,
    options: DecomposeOptions,
) -> Result<()> {
    let mut model = store.load()?;
    model.paper_by_name(paper)?;
    config.validate_llm()?;

    let client = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let generator = LlmTaskGenerator::new(client, config.decomposition.clone(), config.llm.max_tokens);
    let decomposer = Decomposer::new(std::sync::Arc::new(generator));

    let report = decomposer.decompose(&mut model, store, paper, options, today).await?;
    if report.is_noop() {
        display::info(&format!(
            "Nothing to decompose for \"{paper}\". Use --force to regenerate decomposed milestones."
        ));
        return Ok(());
    }

    print!("{}", display::decomposition(&report, today));
    let failures = report.failures().count();
    if failures > 0 {
        display::warning(&format!("{failures} milestone(s) failed and were left undecomposed"));
    }
    if report.saved {
        display::success(&format!("Saved to {}", store.path().display()));
    }
    Ok(())
}

fn cmd_done(store: &Store, reference: &str) -> Result<()> {
    let mut model = store.load()?;
    let description = model.complete_task(reference)?.description.clone();
    store.save(&model)?;
    display::success(&format!("Completed task: {description}"));
    Ok(())
}

fn cmd_complete(store: &Store, reference: &str) -> Result<()> {
    let mut model = store.load()?;
    let description = model.complete_milestone(reference)?.description.clone();
    store.save(&model)?;
    display::success(&format!("Completed milestone: {description}"));
    Ok(())
}

fn cmd_archive(store: &Store, paper: &str) -> Result<()> {
    let mut model = store.load()?;
    let name = model.archive_paper(paper)?.name.clone();
    store.save(&model)?;
    display::success(&format!("Archived paper \"{name}\""));
    Ok(())
}
