//! The time dimension, synthesised from race dates.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use paddock_core::calendar::{Locale, TimeRow, parse_event_date};
use paddock_extract::records::RaceRecord;

/// One [`TimeRow`] per distinct parseable race date, in date order.
///
/// Races with an absent or unparseable date contribute nothing.
pub fn time_rows(races: &[RaceRecord], locale: Locale) -> Vec<TimeRow> {
  race_dates(races)
    .into_iter()
    .map(|date| TimeRow::from_date(date, locale))
    .collect()
}

fn race_dates(races: &[RaceRecord]) -> BTreeSet<NaiveDate> {
  races
    .iter()
    .filter_map(|r| {
      let raw = r.date.as_deref()?;
      let date = parse_event_date(raw);
      if date.is_none() {
        tracing::warn!(race_id = ?r.race_id, date = raw, "unparseable race date");
      }
      date
    })
    .collect()
}
