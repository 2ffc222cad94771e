//! The selected reference day of a month view and how it moves.

use anyhow::anyhow;
use chrono::{
  Datelike,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::dates;
use crate::error::{
  CalendarError,
  CalendarResult
};

pub const DEFAULT_YEAR_MIN: i32 = 1900;
pub const DEFAULT_YEAR_MAX: i32 = 2100;

/// Half-open `[min, max)` range of years a focus date may land in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct YearBounds {
  min: i32,
  max: i32
}

impl YearBounds {
  pub fn new(
    min: i32,
    max: i32
  ) -> CalendarResult<Self> {
    if min >= max {
      return Err(
        CalendarError::InvalidYearBounds {
          min,
          max
        }
      );
    }
    Ok(Self { min, max })
  }

  pub fn min(self) -> i32 {
    self.min
  }

  pub fn max(self) -> i32 {
    self.max
  }

  pub fn contains(
    self,
    year: i32
  ) -> bool {
    year >= self.min && year < self.max
  }

  pub fn check(
    self,
    year: i32
  ) -> CalendarResult<()> {
    if self.contains(year) {
      Ok(())
    } else {
      Err(
        CalendarError::YearOutOfRange {
          year,
          min: self.min,
          max: self.max
        }
      )
    }
  }
}

impl Default for YearBounds {
  fn default() -> Self {
    Self {
      min: DEFAULT_YEAR_MIN,
      max: DEFAULT_YEAR_MAX
    }
  }
}

/// A (day, month, year) triple. `month0` is zero-based (0 = January).
///
/// Navigation returns a new value; a focus date is never edited in place.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct FocusDate {
  date: NaiveDate
}

impl FocusDate {
  pub fn new(
    day: u32,
    month0: u32,
    year: i32
  ) -> CalendarResult<Self> {
    if month0 > 11 {
      return Err(
        CalendarError::MonthOutOfRange(
          month0
        )
      );
    }

    let month = month0 + 1;
    let max =
      dates::days_in_month(year, month)?;
    if day == 0 || day > max {
      return Err(
        CalendarError::DayOutOfRange {
          day,
          month,
          year,
          max
        }
      );
    }

    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self::from_date)
    .ok_or(CalendarError::DateOutOfRange)
  }

  pub fn from_date(
    date: NaiveDate
  ) -> Self {
    Self { date }
  }

  /// Wall-clock today in `timezone`.
  pub fn today(timezone: &Tz) -> Self {
    Self::from_date(
      Utc::now()
        .with_timezone(timezone)
        .date_naive()
    )
  }

  pub fn today_in(
    timezone: &Tz,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    let today = Self::today(timezone);
    bounds.check(today.year())?;
    Ok(today)
  }

  /// Focus on a date picked directly from the grid. Picking a leading or
  /// trailing cell moves the view to that cell's month.
  pub fn select(
    date: NaiveDate,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    bounds.check(date.year())?;
    Ok(Self::from_date(date))
  }

  pub fn day(self) -> u32 {
    self.date.day()
  }

  pub fn month0(self) -> u32 {
    self.date.month0()
  }

  /// One-based month, as chrono counts it.
  pub fn month(self) -> u32 {
    self.date.month()
  }

  pub fn year(self) -> i32 {
    self.date.year()
  }

  pub fn to_date(self) -> NaiveDate {
    self.date
  }

  pub fn first_of_month(
    self
  ) -> CalendarResult<NaiveDate> {
    dates::first_day_of_month(
      self.year(),
      self.month()
    )
  }

  pub fn days_in_month(
    self
  ) -> CalendarResult<u32> {
    dates::days_in_month(
      self.year(),
      self.month()
    )
  }

  /// Moves by whole months, rolling the year over in either direction.
  /// The day clamps to the last day of a shorter target month.
  pub fn shift_months(
    self,
    months: i32,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    let total = i64::from(self.year())
      * 12
      + i64::from(self.month0())
      + i64::from(months);
    let year = i32::try_from(
      total.div_euclid(12)
    )
    .map_err(|_| {
      CalendarError::DateOutOfRange
    })?;
    let month0 =
      total.rem_euclid(12) as u32;

    bounds.check(year)?;

    let day = self.day().min(
      dates::days_in_month(
        year,
        month0 + 1
      )?
    );
    let shifted =
      Self::new(day, month0, year)?;
    debug!(
      from = %self.date,
      to = %shifted.date,
      months,
      "shifted focus date"
    );
    Ok(shifted)
  }

  pub fn shift_years(
    self,
    years: i32,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    let months = years
      .checked_mul(12)
      .ok_or(
        CalendarError::DateOutOfRange
      )?;
    self.shift_months(months, bounds)
  }

  pub fn next_month(
    self,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    self.shift_months(1, bounds)
  }

  pub fn prev_month(
    self,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    self.shift_months(-1, bounds)
  }

  pub fn next_year(
    self,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    self.shift_years(1, bounds)
  }

  pub fn prev_year(
    self,
    bounds: YearBounds
  ) -> CalendarResult<Self> {
    self.shift_years(-1, bounds)
  }
}

impl Serialize for FocusDate {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer
  {
    use serde::ser::SerializeStruct;

    let mut state = serializer
      .serialize_struct(
        "FocusDate", 3
      )?;
    state.serialize_field(
      "day",
      &self.day()
    )?;
    state.serialize_field(
      "month",
      &self.month0()
    )?;
    state.serialize_field(
      "year",
      &self.year()
    )?;
    state.end()
  }
}

/// Parses the focus expressions accepted on the command line:
/// `today`, `YYYY-MM`, `YYYY-MM-DD` and `+Nm`, `-Nm`, `+Ny`, `-Ny`
/// relative to `today`. Month numbers in expressions are one-based.
#[tracing::instrument(skip(
  today, bounds
))]
pub fn parse_focus_expr(
  expr: &str,
  today: FocusDate,
  bounds: YearBounds
) -> anyhow::Result<FocusDate> {
  let token = expr.trim();
  let invalid = || {
    CalendarError::InvalidDateExpr(
      token.to_string()
    )
  };

  if token.eq_ignore_ascii_case("today")
  {
    bounds.check(today.year())?;
    return Ok(today);
  }

  let abs_re = Regex::new(
    r"^(?P<year>\d{4})-(?P<month>\d{1,2})(?:-(?P<day>\d{1,2}))?$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    abs_re.captures(token)
  {
    let year: i32 = caps["year"]
      .parse()
      .map_err(|_| invalid())?;
    let month: u32 = caps["month"]
      .parse()
      .map_err(|_| invalid())?;
    let day: u32 = match caps
      .name("day")
    {
      | Some(m) => {
        m.as_str()
          .parse()
          .map_err(|_| invalid())?
      }
      | None => 1
    };
    if month == 0 {
      return Err(invalid().into());
    }

    bounds.check(year)?;
    let focus = FocusDate::new(
      day,
      month - 1,
      year
    )?;
    debug!(focus = %focus.date, "parsed absolute focus");
    return Ok(focus);
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[myMY])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(token)
  {
    let num: i32 = caps["num"]
      .parse()
      .map_err(|_| invalid())?;
    let num = if &caps["sign"] == "-" {
      -num
    } else {
      num
    };
    let focus = match &caps["unit"] {
      | "y" | "Y" => {
        today.shift_years(num, bounds)?
      }
      | _ => {
        today
          .shift_months(num, bounds)?
      }
    };
    debug!(focus = %focus.date, "parsed relative focus");
    return Ok(focus);
  }

  Err(invalid().into())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn focus(
    y: i32,
    m0: u32,
    d: u32
  ) -> FocusDate {
    FocusDate::new(d, m0, y)
      .expect("valid focus")
  }

  #[test]
  fn rejects_out_of_range_month_and_day() {
    assert_eq!(
      FocusDate::new(1, 12, 2024),
      Err(
        CalendarError::MonthOutOfRange(
          12
        )
      )
    );
    assert!(matches!(
      FocusDate::new(30, 1, 2024),
      Err(CalendarError::DayOutOfRange {
        max: 29,
        ..
      })
    ));
    assert!(matches!(
      FocusDate::new(0, 0, 2024),
      Err(
        CalendarError::DayOutOfRange {
          ..
        }
      )
    ));
  }

  #[test]
  fn month_is_zero_based() {
    let feb = focus(2024, 1, 15);
    assert_eq!(feb.month0(), 1);
    assert_eq!(feb.month(), 2);
    assert_eq!(
      feb.to_date(),
      NaiveDate::from_ymd_opt(
        2024, 2, 15
      )
      .expect("valid date")
    );
  }

  #[test]
  fn month_navigation_rolls_over_years() {
    let bounds = YearBounds::default();
    let jan = focus(2024, 0, 10);

    assert_eq!(
      jan
        .prev_month(bounds)
        .expect("previous month"),
      focus(2023, 11, 10)
    );
    assert_eq!(
      focus(2023, 11, 10)
        .next_month(bounds)
        .expect("next month"),
      jan
    );
    assert_eq!(
      jan
        .shift_months(-25, bounds)
        .expect("25 months back"),
      focus(2021, 11, 10)
    );
  }

  #[test]
  fn navigation_clamps_day_to_short_months()
  {
    let bounds = YearBounds::default();
    assert_eq!(
      focus(2024, 0, 31)
        .next_month(bounds)
        .expect("jan 31 + 1m"),
      focus(2024, 1, 29)
    );
    assert_eq!(
      focus(2024, 1, 29)
        .next_year(bounds)
        .expect("leap day + 1y"),
      focus(2025, 1, 28)
    );
  }

  #[test]
  fn navigation_respects_year_bounds() {
    let bounds =
      YearBounds::new(2000, 2030)
        .expect("bounds");
    assert_eq!(
      focus(2000, 0, 1)
        .prev_month(bounds),
      Err(
        CalendarError::YearOutOfRange {
          year: 1999,
          min:  2000,
          max:  2030
        }
      )
    );
    assert!(
      focus(2029, 6, 1)
        .next_year(bounds)
        .is_err()
    );
    assert!(
      focus(2028, 6, 1)
        .next_year(bounds)
        .is_ok()
    );
    assert_eq!(
      focus(2024, 1, 29)
        .prev_year(bounds)
        .expect("leap day - 1y"),
      focus(2023, 1, 28)
    );
    assert!(
      focus(2000, 5, 1)
        .prev_year(bounds)
        .is_err()
    );
  }

  #[test]
  fn today_in_checks_year_bounds() {
    let tz = chrono_tz::UTC;
    assert!(
      FocusDate::today_in(
        &tz,
        YearBounds::default()
      )
      .is_ok()
    );

    let past = YearBounds::new(1900, 1901)
      .expect("bounds");
    assert!(matches!(
      FocusDate::today_in(&tz, past),
      Err(CalendarError::YearOutOfRange { .. })
    ));
  }

  #[test]
  fn year_bounds_reject_empty_range() {
    assert_eq!(
      YearBounds::new(2020, 2020),
      Err(
        CalendarError::InvalidYearBounds {
          min: 2020,
          max: 2020
        }
      )
    );
  }

  #[test]
  fn select_moves_to_adjacent_month() {
    let picked =
      NaiveDate::from_ymd_opt(2024, 1, 28)
        .expect("valid date");
    let selected = FocusDate::select(
      picked,
      YearBounds::default()
    )
    .expect("select");
    assert_eq!(selected.month0(), 0);
    assert_eq!(selected.day(), 28);
  }

  #[test]
  fn parses_focus_expressions() {
    let bounds = YearBounds::default();
    let today = focus(2026, 9, 16);

    assert_eq!(
      parse_focus_expr(
        "today", today, bounds
      )
      .expect("today"),
      today
    );
    assert_eq!(
      parse_focus_expr(
        "2024-02", today, bounds
      )
      .expect("month"),
      focus(2024, 1, 1)
    );
    assert_eq!(
      parse_focus_expr(
        "2024-02-15",
        today,
        bounds
      )
      .expect("full date"),
      focus(2024, 1, 15)
    );
    assert_eq!(
      parse_focus_expr(
        "-10m", today, bounds
      )
      .expect("relative months"),
      focus(2025, 11, 16)
    );
    assert_eq!(
      parse_focus_expr(
        "+1y", today, bounds
      )
      .expect("relative year"),
      focus(2027, 9, 16)
    );
  }

  #[test]
  fn rejects_bad_focus_expressions() {
    let bounds = YearBounds::default();
    let today = focus(2026, 9, 16);

    for expr in [
      "2024-13", "2024-00", "2024-02-30",
      "next week", "+3d", "1850-01",
    ] {
      assert!(
        parse_focus_expr(
          expr, today, bounds
        )
        .is_err(),
        "{expr} should be rejected"
      );
    }
  }
}
