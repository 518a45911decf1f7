use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flowly_core::{DailyPlanner, Plan, PlanRequest};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod plan_store;
mod render;
mod state;
mod task_source;

use crate::plan_store::FilePlanStore;
use crate::task_source::ExportTaskSource;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FLOWLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "flowly", version = VERSION, about = "Daily plan scheduler")]
struct Cli {
    /// User to plan for (default: [user] id from config.toml)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate or inspect today's plan
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Manage ~/.flowly/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PlanCommand {
    /// Recompute today's plan from the task export and store it
    Generate(GenerateArgs),

    /// Print today's stored plan without recomputing
    Show {
        /// IANA timezone used to decide what "today" is
        #[arg(long)]
        timezone: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a starter config.toml (no-op if one exists)
    Init,
    /// Print the effective config file
    Show,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Task export to read (JSON or CSV; default: [tasks] path)
    #[arg(long)]
    tasks: Option<PathBuf>,

    #[arg(long)]
    timezone: Option<String>,

    #[arg(long)]
    workday_hours: Option<i64>,

    /// Short break length in minutes
    #[arg(long)]
    short_break: Option<i64>,

    /// Long break length in minutes
    #[arg(long)]
    long_break: Option<i64>,

    /// Workday start, local "HH:MM"
    #[arg(long)]
    day_start: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

impl GenerateArgs {
    fn request(&self) -> PlanRequest {
        PlanRequest {
            timezone: self.timezone.clone(),
            workday_hours: self.workday_hours,
            long_break_minutes: self.long_break,
            short_break_minutes: self.short_break,
            day_start: self.day_start.clone(),
            ..PlanRequest::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { command } => match command {
            PlanCommand::Generate(args) => generate(cli.user, &args)?,
            PlanCommand::Show { timezone, json } => show(cli.user, timezone, json)?,
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let p = config::config_path()?;
                let cfg = config::load_config_from(&p)?;
                println!("# {}", p.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn generate(user: Option<String>, args: &GenerateArgs) -> Result<()> {
    let cfg = config::load_config()?;
    let user = user.unwrap_or(cfg.user.id);
    let request = args.request();

    // Validate before touching the task export.
    let effective = request.clone().or(&cfg.planner).resolve()?;

    let tasks_path = args.tasks.clone().or(cfg.tasks.path);
    debug!(user = %user, tasks = ?tasks_path, "generating plan");

    let planner = DailyPlanner::new(
        ExportTaskSource::new(tasks_path, effective.timezone),
        FilePlanStore::new(state::plans_dir()?),
    )
    .with_defaults(cfg.planner);

    let plan = planner.generate_plan(&user, &request)?;
    print_plan(&plan, args.json)
}

fn show(user: Option<String>, timezone: Option<String>, json: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let user = user.unwrap_or(cfg.user.id);

    let planner = DailyPlanner::new(
        ExportTaskSource::new(None, flowly_core::PlanConfig::default().timezone),
        FilePlanStore::new(state::plans_dir()?),
    )
    .with_defaults(cfg.planner);

    match planner.current_plan(&user, timezone.as_deref()) {
        Ok(plan) => print_plan(&plan, json),
        Err(e) if e.is_not_found() => {
            println!("No plan for today yet. Run: flowly plan generate");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_plan(plan: &Plan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan).context("serialize plan")?);
    } else {
        print!("{}", render::render_plan(plan));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_map_onto_request() {
        let cli = Cli::try_parse_from([
            "flowly", "--user", "alice", "plan", "generate", "--timezone", "Asia/Tokyo",
            "--workday-hours", "6", "--short-break", "10", "--day-start", "08:30",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("alice"));
        let Command::Plan { command: PlanCommand::Generate(args) } = cli.command else {
            panic!("expected plan generate");
        };
        let req = args.request();
        assert_eq!(req.timezone.as_deref(), Some("Asia/Tokyo"));
        assert_eq!(req.workday_hours, Some(6));
        assert_eq!(req.short_break_minutes, Some(10));
        assert_eq!(req.long_break_minutes, None);
        assert_eq!(req.day_start.as_deref(), Some("08:30"));
    }
}
