//! A month grid and its density map, built together.

use chrono::Weekday;

use crate::dates;
use crate::density::{
  DensityMap,
  DensityPolicy,
  DensityTier,
  classify
};
use crate::error::CalendarResult;
use crate::event::EventsByDay;
use crate::focus::FocusDate;
use crate::grid::{
  CalendarCell,
  CalendarGrid,
  build_grid
};

#[derive(Debug, Clone, PartialEq)]
pub struct MonthView<'a> {
  focus:   FocusDate,
  grid:    CalendarGrid<'a>,
  density: DensityMap
}

impl<'a> MonthView<'a> {
  /// Rebuilds both halves from scratch; a view is never patched.
  pub fn build(
    focus: FocusDate,
    events_by_day: &'a EventsByDay,
    week_start: Weekday,
    policy: &DensityPolicy
  ) -> CalendarResult<Self> {
    let grid = build_grid(
      &focus,
      events_by_day,
      week_start
    )?;
    let density =
      classify(&grid, policy);
    Ok(Self {
      focus,
      grid,
      density
    })
  }

  pub fn focus(&self) -> FocusDate {
    self.focus
  }

  pub fn grid(
    &self
  ) -> &CalendarGrid<'a> {
    &self.grid
  }

  pub fn density(&self) -> &DensityMap {
    &self.density
  }

  /// e.g. "February 2024".
  pub fn title(&self) -> String {
    self
      .focus
      .to_date()
      .format("%B %Y")
      .to_string()
  }

  pub fn weekday_labels(
    &self
  ) -> [&'static str; 7] {
    dates::weekday_labels(
      self.grid.week_start()
    )
  }

  pub fn total_events(&self) -> usize {
    self
      .grid
      .cells()
      .iter()
      .map(CalendarCell::event_count)
      .sum()
  }

  /// Cell with the most events; the earliest wins ties. `None` when the
  /// month has no events.
  pub fn busiest_day(
    &self
  ) -> Option<&CalendarCell<'a>> {
    self
      .grid
      .cells()
      .iter()
      .filter(|cell| {
        cell.event_count() > 0
      })
      .fold(None, |best, cell| {
        match best {
          | Some(current)
            if current.event_count()
              >= cell.event_count() =>
          {
            Some(current)
          }
          | _ => Some(cell)
        }
      })
  }

  /// Cells paired with their tiers, in grid order.
  pub fn shaded_cells(
    &self
  ) -> impl Iterator<Item = (&CalendarCell<'a>, DensityTier)>
  {
    self.grid.cells().iter().zip(
      self.density.tiers().iter().copied()
    )
  }
}
