//! Six-week month grid construction.

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::Serialize;
use tracing::{
  debug,
  trace
};

use crate::dates;
use crate::error::CalendarResult;
use crate::event::{
  Event,
  EventsByDay
};
use crate::focus::{
  FocusDate,
  YearBounds
};

pub const GRID_COLUMNS: usize = 7;
pub const GRID_ROWS: usize = 6;
pub const GRID_CELLS: usize =
  GRID_ROWS * GRID_COLUMNS;

/// One position of the month grid.
#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
pub struct CalendarCell<'a> {
  pub date: NaiveDate,
  pub belongs_to_focus_month: bool,
  pub is_focused: bool,
  pub events: Vec<&'a Event>
}

impl CalendarCell<'_> {
  pub fn event_count(&self) -> usize {
    self.events.len()
  }

  /// Focus date produced by clicking this cell.
  pub fn select(
    &self,
    bounds: YearBounds
  ) -> CalendarResult<FocusDate> {
    FocusDate::select(self.date, bounds)
  }
}

/// Exactly [`GRID_CELLS`] cells in row-major order. Cell `i` sits at row
/// `i / 7`, column `i % 7`; column 0 is the grid's week start.
#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
pub struct CalendarGrid<'a> {
  week_start: Weekday,
  cells:      Vec<CalendarCell<'a>>
}

impl<'a> CalendarGrid<'a> {
  pub fn week_start(&self) -> Weekday {
    self.week_start
  }

  pub fn cells(
    &self
  ) -> &[CalendarCell<'a>] {
    &self.cells
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn cell(
    &self,
    row: usize,
    column: usize
  ) -> Option<&CalendarCell<'a>> {
    if row >= GRID_ROWS
      || column >= GRID_COLUMNS
    {
      return None;
    }
    self
      .cells
      .get(row * GRID_COLUMNS + column)
  }

  /// The six weeks of the grid, seven cells each.
  pub fn rows(
    &self
  ) -> impl Iterator<Item = &[CalendarCell<'a>]>
  {
    self.cells.chunks(GRID_COLUMNS)
  }

  pub fn counts(&self) -> Vec<usize> {
    self
      .cells
      .iter()
      .map(CalendarCell::event_count)
      .collect()
  }

  pub fn first_date(&self) -> NaiveDate {
    self.cells[0].date
  }

  pub fn last_date(&self) -> NaiveDate {
    self.cells[GRID_CELLS - 1].date
  }

  pub fn index_of(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    let offset = (date
      - self.first_date())
    .num_days();
    usize::try_from(offset)
      .ok()
      .filter(|idx| *idx < GRID_CELLS)
  }

  pub fn focused_index(
    &self
  ) -> Option<usize> {
    self
      .cells
      .iter()
      .position(|cell| cell.is_focused)
  }
}

/// Builds the 42-cell grid for the month of `focus`.
///
/// Only cells of the focus month carry events; leading and trailing cells
/// from the neighbouring months are always empty. Keys of `events_by_day`
/// that name no day of the focus month are ignored.
#[tracing::instrument(skip(
  events_by_day
))]
pub fn build_grid<'a>(
  focus: &FocusDate,
  events_by_day: &'a EventsByDay,
  week_start: Weekday
) -> CalendarResult<CalendarGrid<'a>> {
  let first = focus.first_of_month()?;
  let month_len = focus.days_in_month()?;
  let leading =
    dates::leading_days(first, week_start);
  let grid_start =
    dates::add_days(first, -leading)?;

  for day in events_by_day.days() {
    if day == 0 || day > month_len {
      debug!(
        day,
        month_len,
        "ignoring events keyed outside \
         the focus month"
      );
    }
  }

  let mut cells =
    Vec::with_capacity(GRID_CELLS);
  for offset in 0..GRID_CELLS as i64 {
    let date = dates::add_days(
      grid_start, offset
    )?;
    let in_month = date.year()
      == focus.year()
      && date.month0() == focus.month0();
    let events = if in_month {
      events_by_day
        .get(date.day())
        .iter()
        .collect()
    } else {
      Vec::new()
    };

    cells.push(CalendarCell {
      date,
      belongs_to_focus_month: in_month,
      is_focused: in_month
        && date.day() == focus.day(),
      events
    });
  }

  trace!(
    start = %grid_start,
    leading,
    "built calendar grid"
  );
  Ok(CalendarGrid { week_start, cells })
}

/// [`build_grid`] with Sunday in column 0.
pub fn build_sunday_grid<'a>(
  focus: &FocusDate,
  events_by_day: &'a EventsByDay
) -> CalendarResult<CalendarGrid<'a>> {
  build_grid(
    focus,
    events_by_day,
    Weekday::Sun
  )
}
