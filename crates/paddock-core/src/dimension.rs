//! Dimension rows of the star schema.
//!
//! Driver, constructor and circuit rows keep the natural key from the source
//! extract as their warehouse key. Rows are append-only: once a key is loaded
//! it is never updated, and reloading it is a no-op.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::calendar::TimeRow;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The five dimensions of the warehouse.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
  Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  Driver,
  Constructor,
  Circuit,
  Time,
  Race,
}

impl Dimension {
  pub fn table_name(self) -> &'static str {
    match self {
      Self::Driver => "dim_driver",
      Self::Constructor => "dim_constructor",
      Self::Circuit => "dim_circuit",
      Self::Time => "dim_time",
      Self::Race => "dim_race",
    }
  }

  /// Primary-key column of the dimension table.
  pub fn key_column(self) -> &'static str {
    match self {
      Self::Driver => "driver_id",
      Self::Constructor => "constructor_id",
      Self::Circuit => "circuit_id",
      Self::Time => "time_key",
      Self::Race => "race_id",
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
  pub driver_id:     i64,
  pub forename:      Option<String>,
  pub surname:       Option<String>,
  /// `forename surname`; absent unless both parts are present.
  pub full_name:     Option<String>,
  pub code:          Option<String>,
  pub number:        Option<i64>,
  pub nationality:   Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub url:           Option<String>,
}

impl Driver {
  pub fn full_name_of(forename: Option<&str>, surname: Option<&str>) -> Option<String> {
    match (forename, surname) {
      (Some(f), Some(s)) => Some(format!("{f} {s}")),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
  pub constructor_id: i64,
  pub name:           Option<String>,
  /// Short stable reference such as `mclaren`.
  pub reference:      Option<String>,
  pub nationality:    Option<String>,
  pub url:            Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
  pub circuit_id: i64,
  pub name:       Option<String>,
  pub location:   Option<String>,
  pub country:    Option<String>,
  pub latitude:   Option<f64>,
  pub longitude:  Option<f64>,
  /// Metres above sea level.
  pub altitude:   Option<f64>,
  pub url:        Option<String>,
}

/// A race weekend's main event. Always linked to a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
  pub race_id:    i64,
  pub year:       Option<i32>,
  pub round:      Option<i32>,
  pub circuit_id: i64,
  pub name:       Option<String>,
  pub date:       Option<NaiveDate>,
  pub time:       Option<NaiveTime>,
  pub url:        Option<String>,
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// A homogeneous set of rows destined for one dimension table.
#[derive(Debug, Clone)]
pub enum DimensionBatch {
  Drivers(Vec<Driver>),
  Constructors(Vec<Constructor>),
  Circuits(Vec<Circuit>),
  Times(Vec<TimeRow>),
  Races(Vec<Race>),
}

impl DimensionBatch {
  pub fn dimension(&self) -> Dimension {
    match self {
      Self::Drivers(_) => Dimension::Driver,
      Self::Constructors(_) => Dimension::Constructor,
      Self::Circuits(_) => Dimension::Circuit,
      Self::Times(_) => Dimension::Time,
      Self::Races(_) => Dimension::Race,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Drivers(rows) => rows.len(),
      Self::Constructors(rows) => rows.len(),
      Self::Circuits(rows) => rows.len(),
      Self::Times(rows) => rows.len(),
      Self::Races(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
