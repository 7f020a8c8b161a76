//! The synthetic time dimension.
//!
//! Every attribute of a [`TimeRow`] is a pure function of the calendar date,
//! so the fact loader can recompute a [`TimeKey`] from a race date and land
//! on the same row the time dimension generator produced.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Surrogate key ───────────────────────────────────────────────────────────

/// A date encoded as `year * 10000 + month * 100 + day` (e.g. `20230507`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeKey(i64);

impl TimeKey {
  pub fn from_date(date: NaiveDate) -> Self {
    Self(
      i64::from(date.year()) * 10_000
        + i64::from(date.month()) * 100
        + i64::from(date.day()),
    )
  }

  pub fn get(self) -> i64 { self.0 }

  /// Decode the key back into a calendar date, if it names a real one.
  pub fn to_date(self) -> Option<NaiveDate> {
    let year = i32::try_from(self.0 / 10_000).ok()?;
    let month = u32::try_from(self.0 / 100 % 100).ok()?;
    let day = u32::try_from(self.0 % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
  }
}

impl From<NaiveDate> for TimeKey {
  fn from(date: NaiveDate) -> Self { Self::from_date(date) }
}

impl fmt::Display for TimeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Derived attributes ──────────────────────────────────────────────────────

/// Quarter of the year, `⌈month / 3⌉`.
pub fn quarter(month: u32) -> u32 { (month + 2) / 3 }

/// The year floored to its decade (`1987` → `1980`).
pub fn decade(year: i32) -> i32 { year.div_euclid(10) * 10 }

/// Saturday or Sunday, i.e. weekday index ≥ 5 counting Monday as 0.
pub fn is_weekend(date: NaiveDate) -> bool {
  date.weekday().num_days_from_monday() >= 5
}

/// Language used for the month and weekday names stored in the dimension.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
  #[default]
  Es,
  En,
}

const MONTHS_ES: [&str; 12] = [
  "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
  "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

const MONTHS_EN: [&str; 12] = [
  "January", "February", "March", "April", "May", "June", "July", "August",
  "September", "October", "November", "December",
];

const WEEKDAYS_ES: [&str; 7] =
  ["Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado", "Domingo"];

const WEEKDAYS_EN: [&str; 7] = [
  "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

impl Locale {
  /// Month name for a 1-based month; `None` outside `1..=12`.
  pub fn month_name(self, month: u32) -> Option<&'static str> {
    let names = match self {
      Self::Es => &MONTHS_ES,
      Self::En => &MONTHS_EN,
    };
    let idx = usize::try_from(month.checked_sub(1)?).ok()?;
    names.get(idx).copied()
  }

  pub fn weekday_name(self, weekday: Weekday) -> &'static str {
    let names = match self {
      Self::Es => &WEEKDAYS_ES,
      Self::En => &WEEKDAYS_EN,
    };
    names[weekday.num_days_from_monday() as usize]
  }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// One row of the time dimension; one per distinct race date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRow {
  pub time_key:     TimeKey,
  pub date:         NaiveDate,
  pub year:         i32,
  pub month:        u32,
  pub day:          u32,
  pub quarter:      u32,
  pub decade:       i32,
  pub month_name:   String,
  pub weekday_name: String,
  pub is_weekend:   bool,
}

impl TimeRow {
  pub fn from_date(date: NaiveDate, locale: Locale) -> Self {
    Self {
      time_key:     TimeKey::from_date(date),
      date,
      year:         date.year(),
      month:        date.month(),
      day:          date.day(),
      quarter:      quarter(date.month()),
      decade:       decade(date.year()),
      // chrono guarantees 1..=12 here.
      month_name:   locale.month_name(date.month()).unwrap_or_default().to_owned(),
      weekday_name: locale.weekday_name(date.weekday()).to_owned(),
      is_weekend:   is_weekend(date),
    }
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 4] = [
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an event date written in any of the accepted textual forms.
///
/// Timestamps and offset-qualified values collapse to the calendar date as
/// written, so `2023-05-07`, `2023/05/07` and `2023-05-07T15:00:00+02:00`
/// all yield the same date. Returns `None` for anything unparseable.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Some(date) = DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
  {
    return Some(date);
  }

  if let Some(dt) = DATETIME_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
  {
    return Some(dt.date());
  }

  DateTime::parse_from_rfc3339(raw)
    .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z"))
    .map(|dt| dt.date_naive())
    .ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn time_key_encodes_yyyymmdd() {
    assert_eq!(TimeKey::from_date(ymd(2023, 5, 7)).get(), 20_230_507);
    assert_eq!(TimeKey::from_date(ymd(1950, 12, 31)).get(), 19_501_231);
  }

  #[test]
  fn time_key_decodes_back_to_date() {
    let key = TimeKey::from_date(ymd(1988, 2, 29));
    assert_eq!(key.to_date(), Some(ymd(1988, 2, 29)));
  }

  #[test]
  fn quarter_is_ceiling_of_month_over_three() {
    let quarters: Vec<u32> = (1..=12).map(quarter).collect();
    assert_eq!(quarters, [1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
  }

  #[test]
  fn decade_floors_year() {
    assert_eq!(decade(1950), 1950);
    assert_eq!(decade(1959), 1950);
    assert_eq!(decade(2023), 2020);
  }

  #[test]
  fn weekend_uses_monday_zero_convention() {
    // 2023-05-06 is a Saturday, 2023-05-07 a Sunday, 2023-05-08 a Monday.
    assert!(is_weekend(ymd(2023, 5, 6)));
    assert!(is_weekend(ymd(2023, 5, 7)));
    assert!(!is_weekend(ymd(2023, 5, 8)));
    assert!(!is_weekend(ymd(2023, 5, 5)));
  }

  #[test]
  fn row_for_sunday_race() {
    let row = TimeRow::from_date(ymd(2023, 5, 7), Locale::Es);
    assert_eq!(row.time_key.get(), 20_230_507);
    assert_eq!(row.year, 2023);
    assert_eq!(row.quarter, 2);
    assert_eq!(row.decade, 2020);
    assert_eq!(row.month_name, "Mayo");
    assert_eq!(row.weekday_name, "Domingo");
    assert!(row.is_weekend);
  }

  #[test]
  fn english_names() {
    let row = TimeRow::from_date(ymd(2021, 12, 1), Locale::En);
    assert_eq!(row.month_name, "December");
    assert_eq!(row.weekday_name, "Wednesday");
    assert!(!row.is_weekend);
  }

  #[test]
  fn month_name_out_of_range() {
    assert_eq!(Locale::Es.month_name(0), None);
    assert_eq!(Locale::Es.month_name(13), None);
  }

  #[test]
  fn differing_representations_collapse_to_one_key() {
    let forms = [
      "2023-05-07",
      " 2023-05-07 ",
      "2023/05/07",
      "2023-05-07 14:00:00",
      "2023-05-07T14:00:00",
      "2023-05-07T14:00:00+02:00",
      "2023-05-07T23:30:00Z",
    ];
    for form in forms {
      let date = parse_event_date(form).unwrap_or_else(|| panic!("{form:?}"));
      assert_eq!(TimeKey::from_date(date).get(), 20_230_507, "{form:?}");
    }
  }

  #[test]
  fn unparseable_dates_are_rejected() {
    assert_eq!(parse_event_date(""), None);
    assert_eq!(parse_event_date("not a date"), None);
    assert_eq!(parse_event_date("2023-02-30"), None);
  }
}
