//! The fact loader.
//!
//! Each result is joined to its race for the circuit and the race date, the
//! date resolved to a time key, and the boolean measures derived. A row whose
//! fields could not be typed is skipped and counted. A row with a foreign key
//! that is absent, or that names a dimension row that was never loaded, is
//! excluded. Only rows whose every key resolves reach the warehouse, so the
//! fact table never holds an orphan.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  fmt,
  num::NonZeroUsize,
};

use chrono::NaiveDate;
use paddock_core::{
  calendar::{TimeKey, parse_event_date},
  fact::{DerivedMeasures, ForeignKey, Measures, ResultFact},
  stage::Stage,
  warehouse::{InsertPolicy, Warehouse},
};
use paddock_extract::{
  Extract, Located, RowError,
  records::{RaceRecord, ResultRecord},
};
use strum::IntoEnumIterator as _;

use crate::{EtlConfig, Error, Result, StageReport};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Per-run settings that shape fact rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactRules {
  pub finished_status:        i64,
  pub require_final_position: bool,
}

impl From<&EtlConfig> for FactRules {
  fn from(config: &EtlConfig) -> Self {
    Self {
      finished_status:        config.finished_status_id,
      require_final_position: config.require_final_position,
    }
  }
}

/// Keys present in each referenced dimension when the fact stage starts.
#[derive(Debug, Clone, Default)]
pub struct KnownKeys(BTreeMap<ForeignKey, HashSet<i64>>);

impl KnownKeys {
  pub async fn fetch<W: Warehouse>(warehouse: &W) -> Result<Self, W::Error> {
    let mut keys = BTreeMap::new();
    for fk in ForeignKey::iter() {
      keys.insert(fk, warehouse.dimension_keys(fk.dimension()).await?);
    }
    Ok(Self(keys))
  }

  pub fn insert(&mut self, fk: ForeignKey, keys: impl IntoIterator<Item = i64>) {
    self.0.entry(fk).or_default().extend(keys);
  }

  pub fn contains(&self, fk: ForeignKey, key: i64) -> bool {
    self.0.get(&fk).is_some_and(|keys| keys.contains(&key))
  }
}

/// What a result needs from its race.
#[derive(Debug, Clone, Copy)]
struct RaceLink {
  circuit_id: Option<i64>,
  date:       Option<NaiveDate>,
}

fn race_links(races: &[RaceRecord]) -> HashMap<i64, RaceLink> {
  races
    .iter()
    .filter_map(|r| {
      let link = RaceLink {
        circuit_id: r.circuit_id,
        date:       r.date.as_deref().and_then(parse_event_date),
      };
      Some((r.race_id?, link))
    })
    .collect()
}

// ─── Transform ───────────────────────────────────────────────────────────────

/// Why a result was left out of the fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
  /// The result itself carries no value for this column.
  MissingKey(&'static str),
  /// The key could not be resolved against its dimension.
  Unresolved(ForeignKey),
}

impl fmt::Display for Exclusion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingKey(column) => write!(f, "missing {column}"),
      Self::Unresolved(fk) => write!(f, "unresolved {fk}"),
    }
  }
}

/// Fact rows ready to load, plus the rows that were not.
#[derive(Debug, Default)]
pub struct FactBatch {
  pub rows:      Vec<ResultFact>,
  /// Rows skipped as malformed, in file order.
  pub malformed: Vec<RowError>,
  pub excluded:  usize,
}

/// Build fact rows from the results extract.
pub fn facts(
  results: &Extract<ResultRecord>,
  races:   &[RaceRecord],
  known:   &KnownKeys,
  rules:   FactRules,
) -> FactBatch {
  let links = race_links(races);
  let mut batch = FactBatch::default();

  for row in &results.rows {
    let (line, record) = match row {
      Ok(located) => (located.line, &located.record),
      Err(e) => {
        tracing::warn!(line = e.line, error = %e.message, "malformed result skipped");
        batch.malformed.push(e.clone());
        continue;
      }
    };

    if rules.require_final_position && record.position.is_none() {
      tracing::warn!(
        line,
        result_id = ?record.result_id,
        "result without a final position skipped"
      );
      batch.malformed.push(RowError { line, message: "final position is absent".into() });
      continue;
    }

    match resolve(record, &links, known, rules) {
      Ok(fact) => batch.rows.push(fact),
      Err(reason) => {
        tracing::debug!(result_id = ?record.result_id, %reason, "result excluded");
        batch.excluded += 1;
      }
    }
  }

  batch
}

fn resolve(
  r:     &ResultRecord,
  links: &HashMap<i64, RaceLink>,
  known: &KnownKeys,
  rules: FactRules,
) -> std::result::Result<ResultFact, Exclusion> {
  let result_id = r.result_id.ok_or(Exclusion::MissingKey("resultId"))?;
  let race_id = r.race_id.ok_or(Exclusion::MissingKey("raceId"))?;
  let driver_id = r.driver_id.ok_or(Exclusion::MissingKey("driverId"))?;
  let constructor_id = r.constructor_id.ok_or(Exclusion::MissingKey("constructorId"))?;

  let link = links.get(&race_id).ok_or(Exclusion::Unresolved(ForeignKey::Race))?;
  let circuit_id = link.circuit_id.ok_or(Exclusion::Unresolved(ForeignKey::Circuit))?;
  let date = link.date.ok_or(Exclusion::Unresolved(ForeignKey::Time))?;

  let measures = Measures {
    points:            r.points,
    final_position:    r.position,
    starting_position: r.grid,
    laps:              r.laps,
    elapsed_ms:        r.milliseconds,
    fastest_lap:       r.fastest_lap,
    fastest_lap_time:  r.fastest_lap_time.clone(),
    average_speed:     r.fastest_lap_speed,
    status_id:         r.status_id,
  };

  let fact = ResultFact {
    result_id,
    race_id,
    driver_id,
    constructor_id,
    circuit_id,
    time_key: TimeKey::from_date(date),
    derived: DerivedMeasures::compute(&measures, rules.finished_status),
    measures,
  };

  match ForeignKey::iter().find(|&fk| !known.contains(fk, fact.key(fk))) {
    Some(fk) => Err(Exclusion::Unresolved(fk)),
    None => Ok(fact),
  }
}

// ─── Load ────────────────────────────────────────────────────────────────────

/// Insert `batch` in commits of `batch_size`, skipping rows the warehouse
/// rejects.
pub async fn load<W: Warehouse>(
  warehouse:  &W,
  extracted:  usize,
  batch:      FactBatch,
  batch_size: NonZeroUsize,
) -> Result<StageReport> {
  let report =
    StageReport::new(Stage::Results, extracted, batch.excluded, batch.malformed.len());
  let outcome = warehouse
    .load_facts(batch.rows, InsertPolicy::batched(batch_size))
    .await
    .map_err(Error::stage(Stage::Results))?;
  Ok(report.with_outcome(&outcome))
}

#[cfg(test)]
mod tests {
  use paddock_extract::SourceTable;

  use super::*;

  fn known() -> KnownKeys {
    let mut keys = KnownKeys::default();
    keys.insert(ForeignKey::Race, [10]);
    keys.insert(ForeignKey::Driver, [1, 2]);
    keys.insert(ForeignKey::Constructor, [1]);
    keys.insert(ForeignKey::Circuit, [6]);
    keys.insert(ForeignKey::Time, [20_230_507]);
    keys
  }

  fn races() -> Vec<RaceRecord> {
    vec![RaceRecord {
      race_id:    Some(10),
      year:       Some(2023),
      round:      Some(5),
      circuit_id: Some(6),
      name:       None,
      date:       Some("2023-05-07".into()),
      time:       None,
      url:        None,
    }]
  }

  fn result(id: i64, driver: i64, position: Option<i32>, grid: i32, points: f64) -> ResultRecord {
    ResultRecord {
      result_id:         Some(id),
      race_id:           Some(10),
      driver_id:         Some(driver),
      constructor_id:    Some(1),
      grid:              Some(grid),
      position,
      points:            Some(points),
      laps:              Some(57),
      milliseconds:      None,
      fastest_lap:       None,
      fastest_lap_time:  None,
      fastest_lap_speed: None,
      status_id:         Some(1),
    }
  }

  type Row = std::result::Result<Located<ResultRecord>, RowError>;

  fn extract(rows: Vec<Row>) -> Extract<ResultRecord> {
    Extract { table: SourceTable::Results, rows }
  }

  fn at(line: u64, record: ResultRecord) -> Row { Ok(Located { line, record }) }

  const RULES: FactRules = FactRules { finished_status: 1, require_final_position: false };

  #[test]
  fn join_and_derive() {
    let results = extract(vec![
      at(2, result(1, 1, Some(1), 2, 25.0)),
      at(3, result(2, 2, Some(2), 1, 18.0)),
    ]);
    let batch = facts(&results, &races(), &known(), RULES);

    assert_eq!(batch.rows.len(), 2);
    let a = &batch.rows[0];
    assert_eq!(a.circuit_id, 6);
    assert_eq!(a.time_key.get(), 20_230_507);
    assert!(a.derived.is_win && a.derived.is_podium && !a.derived.is_pole);
    assert!(a.derived.is_scored && a.derived.is_finished);

    let b = &batch.rows[1];
    assert!(!b.derived.is_win && b.derived.is_podium && b.derived.is_pole);
  }

  #[test]
  fn malformed_rows_are_skipped_not_fatal() {
    let results = extract(vec![
      at(2, result(1, 1, Some(1), 1, 25.0)),
      Err(RowError { line: 3, message: "invalid digit".into() }),
      at(4, result(3, 2, Some(2), 2, 18.0)),
    ]);
    let batch = facts(&results, &races(), &known(), RULES);
    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.malformed.len(), 1);
    assert_eq!(batch.malformed[0].line, 3);
    assert_eq!(batch.excluded, 0);
  }

  #[test]
  fn absent_position_follows_the_rule() {
    // Follows a record whose quoted field spans two lines.
    let results = extract(vec![at(4, result(1, 1, None, 4, 0.0))]);

    let lenient = facts(&results, &races(), &known(), RULES);
    assert_eq!(lenient.rows.len(), 1);
    assert!(!lenient.rows[0].derived.is_podium);

    let strict = FactRules { require_final_position: true, ..RULES };
    let batch = facts(&results, &races(), &known(), strict);
    assert!(batch.rows.is_empty());
    assert_eq!(batch.malformed.len(), 1);
    assert_eq!(batch.malformed[0].line, 4);
  }

  #[test]
  fn unresolvable_keys_are_excluded() {
    let mut no_race = result(1, 1, Some(1), 1, 25.0);
    no_race.race_id = Some(999);
    let no_driver = result(2, 7, Some(2), 2, 18.0);
    let mut absent_constructor = result(3, 1, Some(3), 3, 15.0);
    absent_constructor.constructor_id = None;
    let ok = result(4, 2, Some(4), 4, 12.0);

    let results =
      extract(vec![at(2, no_race), at(3, no_driver), at(4, absent_constructor), at(5, ok)]);
    let batch = facts(&results, &races(), &known(), RULES);

    assert_eq!(batch.excluded, 3);
    assert_eq!(batch.rows.len(), 1);
    assert_eq!(batch.rows[0].result_id, 4);
  }

  #[test]
  fn race_without_a_date_excludes_its_results() {
    let mut undated = races();
    undated[0].date = None;
    let results = extract(vec![at(2, result(1, 1, Some(1), 1, 25.0))]);
    let batch = facts(&results, &undated, &known(), RULES);
    assert_eq!(batch.excluded, 1);
  }

  #[test]
  fn exclusion_reasons_read_plainly() {
    assert_eq!(Exclusion::MissingKey("raceId").to_string(), "missing raceId");
    assert_eq!(Exclusion::Unresolved(ForeignKey::Time).to_string(), "unresolved time");
  }
}
