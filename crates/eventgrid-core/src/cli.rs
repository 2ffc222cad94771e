use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::Weekday;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::dates;
use crate::density::DensityPolicyKind;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "eventgrid",
    version,
    about = "Month grids and event-density shading for event calendars",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file to use instead of $EVENTGRID_CONFIG or the platform default
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the six-week grid for a month
    Month(MonthArgs),
    /// Classify raw per-day event counts into density tiers
    Classify(ClassifyArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct MonthArgs {
    /// Focus date: today, YYYY-MM, YYYY-MM-DD, or +Nm/-Nm/+Ny/-Ny from today
    #[arg(short, long, default_value = "today", allow_hyphen_values = true)]
    pub date: String,

    /// JSON file with an array of events
    #[arg(short, long)]
    pub events: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub policy: Option<DensityPolicyKind>,

    /// First column of the grid: sunday or monday
    #[arg(long, value_parser = parse_week_start_arg)]
    pub week_start: Option<Weekday>,

    /// Print the grid and tiers as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long, value_enum)]
    pub policy: Option<DensityPolicyKind>,

    /// Event counts, one per cell
    #[arg(required = true)]
    pub counts: Vec<usize>,
}

fn parse_week_start_arg(raw: &str) -> Result<Weekday, String> {
    dates::parse_week_start(raw).map_err(|e| e.to_string())
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = match (quiet, verbose) {
        (q, _) if q >= 2 => "error",
        (1, _) => "warn",
        (_, v) if v >= 3 => "trace",
        (_, 2) => "debug",
        (_, 1) => "info",
        _ => "warn",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
