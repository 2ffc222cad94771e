//! Events as the calendar core sees them, and the per-day lookup the grid
//! builder reads from.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info
};

/// Start or end of an event: an all-day date or an instant.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
#[serde(untagged)]
pub enum EventTime {
  Date(NaiveDate),
  DateTime(DateTime<Utc>)
}

impl EventTime {
  /// Calendar date the event falls on in `timezone`.
  pub fn local_date(
    &self,
    timezone: &Tz
  ) -> NaiveDate {
    match self {
      | Self::Date(date) => *date,
      | Self::DateTime(dt) => {
        dt.with_timezone(timezone)
          .date_naive()
      }
    }
  }

  /// All-day entries sort ahead of timed entries on the same day.
  /// Timed entries order by instant, so a repeated local hour at a DST
  /// fall-back still sorts in start order.
  fn sort_key(
    &self,
    timezone: &Tz
  ) -> (NaiveDate, Option<DateTime<Utc>>) {
    match self {
      | Self::Date(date) => (*date, None),
      | Self::DateTime(dt) => {
        (
          dt.with_timezone(timezone)
            .date_naive(),
          Some(*dt)
        )
      }
    }
  }
}

/// An event owned by the data layer. The calendar core only reads `start`.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Event {
  pub id:    String,
  pub title: String,
  pub start: EventTime,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub end:   Option<EventTime>
}

/// Reads a JSON array of events.
#[tracing::instrument]
pub fn load_events(
  path: &Path
) -> anyhow::Result<Vec<Event>> {
  let text = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
  let events: Vec<Event> =
    serde_json::from_str(&text)
      .with_context(|| {
        format!(
          "failed to parse events from \
           {}",
          path.display()
        )
      })?;
  info!(count = events.len(), "loaded events");
  Ok(events)
}

/// Events of one focus month keyed by one-based day of month.
#[derive(
  Debug, Clone, Default, PartialEq,
)]
pub struct EventsByDay {
  days: BTreeMap<u32, Vec<Event>>
}

impl EventsByDay {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_map(
    days: BTreeMap<u32, Vec<Event>>
  ) -> Self {
    Self { days }
  }

  /// Groups the events that start in `year`/`month0` by local start day.
  /// Events starting in any other month are left out. Within a day the
  /// events are ordered by start, keeping input order for ties.
  #[tracing::instrument(skip(
    events, timezone
  ))]
  pub fn for_month(
    events: &[Event],
    year: i32,
    month0: u32,
    timezone: &Tz
  ) -> Self {
    let mut in_month: Vec<&Event> =
      events
        .iter()
        .filter(|event| {
          let date = event
            .start
            .local_date(timezone);
          date.year() == year
            && date.month0() == month0
        })
        .collect();
    in_month.sort_by_key(|event| {
      event.start.sort_key(timezone)
    });

    let mut by_day = Self::new();
    for event in in_month {
      let day = event
        .start
        .local_date(timezone)
        .day();
      by_day.insert(day, event.clone());
    }

    debug!(
      total = events.len(),
      kept = by_day.total(),
      days = by_day.days.len(),
      "grouped events by day"
    );
    by_day
  }

  pub fn insert(
    &mut self,
    day: u32,
    event: Event
  ) {
    self
      .days
      .entry(day)
      .or_default()
      .push(event);
  }

  /// Events starting on `day`; empty when there are none.
  pub fn get(
    &self,
    day: u32
  ) -> &[Event] {
    self
      .days
      .get(&day)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn days(
    &self
  ) -> impl Iterator<Item = u32> + '_ {
    self.days.keys().copied()
  }

  pub fn total(&self) -> usize {
    self.days.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.total() == 0
  }
}
