//! Month-view calendar grids and event-density classification.
//!
//! [`grid::build_grid`] lays a focus month out as six full weeks and
//! [`density::classify`] shades its cells; [`view::MonthView`] does both
//! at once. The rest of the crate is the `eventgrid` command line around
//! them.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod density;
pub mod error;
pub mod event;
pub mod focus;
pub mod grid;
pub mod render;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use density::{
  DensityMap,
  DensityPolicy,
  DensityTier,
  FixedThresholds,
  RelativeScale,
  classify,
  classify_counts
};
pub use error::{
  CalendarError,
  CalendarResult
};
pub use event::{
  Event,
  EventTime,
  EventsByDay
};
pub use focus::{
  FocusDate,
  YearBounds
};
pub use grid::{
  CalendarCell,
  CalendarGrid,
  build_grid,
  build_sunday_grid
};
pub use view::MonthView;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting eventgrid"
  );

  let cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  let settings =
    cfg.settings().with_context(|| {
      match &cfg.loaded_from {
        | Some(path) => {
          format!(
            "invalid configuration in {}",
            path.display()
          )
        }
        | None => {
          "invalid configuration"
            .to_string()
        }
      }
    })?;
  debug!(?settings, "resolved settings");

  let renderer =
    render::Renderer::for_stdout(
      settings.color
    );

  commands::dispatch(
    &cfg,
    &settings,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
