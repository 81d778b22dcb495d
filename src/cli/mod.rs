pub mod chart;
pub mod goals;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::{
        connection::{open_store, StoreConfig},
        entry_store::EntryStore,
    },
    tracking::{
        entities::{GoalId, Hours},
        errors::LifecycleError,
        lifecycle::GoalService,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

use chart::{process_chart_command, ChartCommand};
use goals::{
    process_add_command, process_delete_command, process_list_command, process_log_command,
    process_show_command, LogCommand,
};

#[derive(Parser, Debug)]
#[command(name = "Goaltrack", version, long_about = None)]
#[command(about = "Track time spent on your goals", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Create a new goal")]
    Add {
        title: String,
        #[arg(
            short,
            long,
            help = "Target time in hours, e.g. \"10\" or \"2.5h\"",
            allow_negative_numbers = true
        )]
        target: Hours,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    #[command(about = "Show progress of every goal")]
    List {},
    #[command(about = "Show a goal with its logged time, newest first")]
    Show {
        #[arg(help = "Goal id or a unique prefix of it")]
        goal: String,
    },
    #[command(about = "Log time spent on a goal")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Delete a goal together with all of its logged time")]
    Delete {
        #[arg(help = "Goal id or a unique prefix of it")]
        goal: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
    #[command(about = "Print hours per day, overall or for a single goal")]
    Chart {
        #[command(flatten)]
        command: ChartCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let store = open_store(&StoreConfig::new(dir.join("store")), &DefaultClock).await?;
    let service = GoalService::new(store, Box::new(DefaultClock));

    let result = match args.commands {
        Commands::Add {
            title,
            target,
            description,
        } => process_add_command(&service, &title, &description, *target).await,
        Commands::List {} => process_list_command(&service).await,
        Commands::Show { goal } => process_show_command(&service, &goal).await,
        Commands::Log { command } => process_log_command(&service, command).await,
        Commands::Delete { goal, yes } => process_delete_command(&service, &goal, yes).await,
        Commands::Chart { command } => process_chart_command(&service, command).await,
    };

    service.into_store().close();
    result
}

/// Rejected input becomes a clap error so it's printed like any other bad argument.
pub(crate) fn user_error(error: LifecycleError) -> anyhow::Error {
    match error {
        LifecycleError::Validation(e) => invalid_value(e),
        LifecycleError::Store(e) => e,
    }
}

pub(crate) fn invalid_value(message: impl Display) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}

/// Finds a goal by its full id or by a prefix shared with no other goal. Anything else is passed
/// through as is and rejected later as an unknown goal.
pub(crate) async fn resolve_goal_id<S: EntryStore>(
    service: &GoalService<S>,
    value: &str,
) -> Result<GoalId> {
    let goals = service.goals().await.map_err(user_error)?;
    if let Some(goal) = goals.iter().find(|v| v.id.as_str() == value) {
        return Ok(goal.id.clone());
    }
    let mut matching = goals.iter().filter(|v| v.id.as_str().starts_with(value));
    match (matching.next(), matching.next()) {
        (Some(goal), None) if !value.is_empty() => Ok(goal.id.clone()),
        (Some(_), Some(_)) => Err(invalid_value(format!(
            "Goal id prefix \"{value}\" matches more than one goal"
        ))),
        _ => Ok(value.into()),
    }
}
