//! Month and week arithmetic on top of chrono.
//!
//! Months here are one-based (`1..=12`) like chrono's `NaiveDate::month`.
//! The zero-based view callers see lives in [`crate::focus::FocusDate`].

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

use crate::error::{
  CalendarError,
  CalendarResult
};

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> CalendarResult<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .ok_or(CalendarError::DateOutOfRange)
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> CalendarResult<NaiveDate> {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  first_day_of_month(
    next_year, next_month
  )?
  .pred_opt()
  .ok_or(CalendarError::DateOutOfRange)
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> CalendarResult<u32> {
  Ok(
    last_day_of_month(year, month)?
      .day()
  )
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> CalendarResult<NaiveDate> {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .ok_or(CalendarError::DateOutOfRange)
}

/// Number of days between the most recent `week_start` on or before `day`
/// and `day` itself. Always in `0..7`.
pub fn leading_days(
  day: NaiveDate,
  week_start: Weekday
) -> i64 {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  (7 + day_idx - start_idx) % 7
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> CalendarResult<NaiveDate> {
  add_days(
    day,
    -leading_days(day, week_start)
  )
}

/// Accepts `sunday`/`sun` and `monday`/`mon`, case-insensitively.
pub fn parse_week_start(
  raw: &str
) -> CalendarResult<Weekday> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "sunday" | "sun" => {
      Ok(Weekday::Sun)
    }
    | "monday" | "mon" => {
      Ok(Weekday::Mon)
    }
    | _ => {
      Err(
        CalendarError::InvalidWeekStart(
          raw.to_string()
        )
      )
    }
  }
}

/// Short weekday names in column order for a grid starting on `week_start`.
pub fn weekday_labels(
  week_start: Weekday
) -> [&'static str; 7] {
  let mut labels = [""; 7];
  let mut day = week_start;
  for label in &mut labels {
    *label = weekday_label(day);
    day = day.succ();
  }
  labels
}

fn weekday_label(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Mon => "Mon",
    | Weekday::Tue => "Tue",
    | Weekday::Wed => "Wed",
    | Weekday::Thu => "Thu",
    | Weekday::Fri => "Fri",
    | Weekday::Sat => "Sat",
    | Weekday::Sun => "Sun"
  }
}
