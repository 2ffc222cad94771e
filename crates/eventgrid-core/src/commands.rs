use std::io::{
  self,
  Write
};

use anyhow::Context;
use tracing::{
  debug,
  info
};

use crate::cli::{
  ClassifyArgs,
  Command,
  MonthArgs
};
use crate::config::{
  CalendarSettings,
  Config
};
use crate::density::classify_counts;
use crate::event::{
  EventsByDay,
  load_events
};
use crate::focus::{
  FocusDate,
  parse_focus_expr
};
use crate::render::Renderer;
use crate::view::MonthView;

#[tracing::instrument(skip_all)]
pub fn dispatch(
  config: &Config,
  settings: &CalendarSettings,
  renderer: &Renderer,
  command: Command
) -> anyhow::Result<()> {
  let mut out = io::stdout().lock();
  match command {
    | Command::Month(args) => {
      cmd_month(
        &mut out, settings, renderer, args
      )
    }
    | Command::Classify(args) => {
      cmd_classify(
        &mut out, settings, renderer, args
      )
    }
    | Command::Config => {
      info!("command config");
      renderer.write_settings(
        &mut out, config, settings
      )
    }
  }
}

#[tracing::instrument(skip(
  out, settings, renderer
))]
pub fn cmd_month<W: Write>(
  out: &mut W,
  settings: &CalendarSettings,
  renderer: &Renderer,
  args: MonthArgs
) -> anyhow::Result<()> {
  info!("command month");

  let mut settings = settings.clone();
  if let Some(kind) = args.policy {
    settings =
      settings.with_policy_kind(kind);
  }
  if let Some(week_start) =
    args.week_start
  {
    settings =
      settings.with_week_start(week_start);
  }

  let today =
    FocusDate::today(&settings.timezone);
  let focus = parse_focus_expr(
    &args.date,
    today,
    settings.bounds
  )
  .with_context(|| {
    format!(
      "invalid --date '{}'",
      args.date
    )
  })?;

  let events = match &args.events {
    | Some(path) => load_events(path)?,
    | None => Vec::new()
  };
  let by_day = EventsByDay::for_month(
    &events,
    focus.year(),
    focus.month0(),
    &settings.timezone
  );
  debug!(
    events = events.len(),
    in_month = by_day.total(),
    "events ready for month view"
  );

  let view = MonthView::build(
    focus,
    &by_day,
    settings.week_start,
    &settings.policy
  )
  .context(
    "failed to build month view"
  )?;

  if args.json {
    renderer.write_month_json(out, &view)
  } else {
    renderer.write_month(out, &view)
  }
}

#[tracing::instrument(skip(
  out, settings, renderer
))]
pub fn cmd_classify<W: Write>(
  out: &mut W,
  settings: &CalendarSettings,
  renderer: &Renderer,
  args: ClassifyArgs
) -> anyhow::Result<()> {
  info!("command classify");

  let settings = match args.policy {
    | Some(kind) => {
      settings
        .clone()
        .with_policy_kind(kind)
    }
    | None => settings.clone()
  };
  let tiers = classify_counts(
    &args.counts,
    &settings.policy
  );
  renderer.write_tiers(
    out,
    &tiers,
    &settings.policy
  )
}
