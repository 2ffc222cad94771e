//! Contract violations raised by the calendar core.

use thiserror::Error;

/// Errors raised when a caller hands the calendar core input outside its
/// contract. None of these are clamped away silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
  #[error(
    "month {0} is out of range; \
     expected 0..=11"
  )]
  MonthOutOfRange(u32),

  #[error(
    "day {day} is out of range for \
     {year}-{month:02}; expected \
     1..={max}"
  )]
  DayOutOfRange {
    day:   u32,
    month: u32,
    year:  i32,
    max:   u32
  },

  #[error(
    "year {year} is outside the \
     allowed range [{min}, {max})"
  )]
  YearOutOfRange {
    year: i32,
    min:  i32,
    max:  i32
  },

  #[error(
    "invalid year bounds: min {min} \
     must be below max {max}"
  )]
  InvalidYearBounds { min: i32, max: i32 },

  #[error(
    "invalid density thresholds: \
     need 1 <= low_max ({low_max}) < \
     mid_max ({mid_max})"
  )]
  InvalidThresholds {
    low_max: usize,
    mid_max: usize
  },

  #[error(
    "invalid relative density step \
     {0}; expected 0 < step <= 1/3"
  )]
  InvalidScale(f64),

  #[error(
    "invalid week start '{0}'; \
     expected sunday or monday"
  )]
  InvalidWeekStart(String),

  #[error(
    "date arithmetic left the \
     supported calendar range"
  )]
  DateOutOfRange,

  #[error(
    "invalid date expression '{0}'; \
     expected today, YYYY-MM, \
     YYYY-MM-DD, +Nm, -Nm, +Ny or -Ny"
  )]
  InvalidDateExpr(String)
}

/// Result alias for calendar core operations.
pub type CalendarResult<T> =
  Result<T, CalendarError>;
