//! Loader for the race dimension, which depends on circuits.

use std::collections::HashSet;

use chrono::NaiveTime;
use paddock_core::{calendar::parse_event_date, dimension::Race};
use paddock_extract::records::RaceRecord;

/// Races whose circuit is present and already loaded.
///
/// `circuits` is the set of keys in the circuit dimension. A race with an
/// absent `circuitId`, or one naming a circuit that is not in that set, is
/// dropped. So is a race without a `raceId`.
pub fn races(records: &[RaceRecord], circuits: &HashSet<i64>) -> Vec<Race> {
  records
    .iter()
    .filter_map(|r| {
      let race_id = r.race_id?;
      let Some(circuit_id) = r.circuit_id else {
        tracing::debug!(race_id, "race without circuitId dropped");
        return None;
      };
      if !circuits.contains(&circuit_id) {
        tracing::debug!(race_id, circuit_id, "race with unknown circuit dropped");
        return None;
      }

      Some(Race {
        race_id,
        year: r.year,
        round: r.round,
        circuit_id,
        name: r.name.clone(),
        date: r.date.as_deref().and_then(parse_event_date),
        time: r.time.as_deref().and_then(parse_start_time),
        url: r.url.clone(),
      })
    })
    .collect()
}

fn parse_start_time(raw: &str) -> Option<NaiveTime> {
  NaiveTime::parse_from_str(raw, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
    .ok()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn record(id: i64, circuit: Option<i64>) -> RaceRecord {
    RaceRecord {
      race_id:    Some(id),
      year:       Some(2023),
      round:      Some(6),
      circuit_id: circuit,
      name:       Some("Monaco Grand Prix".into()),
      date:       Some("2023-05-28".into()),
      time:       Some("13:00:00".into()),
      url:        None,
    }
  }

  #[test]
  fn races_need_a_known_circuit() {
    let known = HashSet::from([6]);
    let rows = races(&[record(1, Some(6)), record(2, None), record(3, Some(99))], &known);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].race_id, 1);
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2023, 5, 28));
    assert_eq!(rows[0].time, NaiveTime::from_hms_opt(13, 0, 0));
  }

  #[test]
  fn short_and_garbage_start_times() {
    assert_eq!(parse_start_time("15:00"), NaiveTime::from_hms_opt(15, 0, 0));
    assert_eq!(parse_start_time("tbc"), None);
  }
}
