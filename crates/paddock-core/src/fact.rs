//! The race-result fact table.
//!
//! One row per driver per race. Raw measures are carried through from the
//! results extract; the boolean measures are derived once, at load time, and
//! bound to their columns by name.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{calendar::TimeKey, dimension::Dimension};

/// Status code the results extract uses for a classified finish.
pub const DEFAULT_FINISHED_STATUS: i64 = 1;

// ─── Measures ────────────────────────────────────────────────────────────────

/// Raw numeric measures of a single result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measures {
  pub points:            Option<f64>,
  pub final_position:    Option<i32>,
  /// Grid slot; `0` means a pit-lane start.
  pub starting_position: Option<i32>,
  pub laps:              Option<i32>,
  pub elapsed_ms:        Option<i64>,
  pub fastest_lap:       Option<i32>,
  /// Lap time as printed in the extract, e.g. `1:27.452`.
  pub fastest_lap_time:  Option<String>,
  /// Average speed over the fastest lap, km/h.
  pub average_speed:     Option<f64>,
  pub status_id:         Option<i64>,
}

/// Boolean measures computed from [`Measures`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMeasures {
  pub is_win:      bool,
  pub is_podium:   bool,
  pub is_pole:     bool,
  pub is_scored:   bool,
  pub is_finished: bool,
}

impl DerivedMeasures {
  /// An absent position, grid slot or points value never counts as a hit.
  pub fn compute(measures: &Measures, finished_status: i64) -> Self {
    Self {
      is_win:      measures.final_position == Some(1),
      is_podium:   matches!(measures.final_position, Some(1..=3)),
      is_pole:     measures.starting_position == Some(1),
      is_scored:   measures.points.is_some_and(|p| p > 0.0),
      is_finished: measures.status_id == Some(finished_status),
    }
  }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// A fully resolved fact row, ready for insertion.
///
/// `result_id` is the source's identity for the driver-per-race result and is
/// what duplicate suppression keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFact {
  pub result_id:      i64,
  pub race_id:        i64,
  pub driver_id:      i64,
  pub constructor_id: i64,
  /// Denormalised from the race for query convenience.
  pub circuit_id:     i64,
  pub time_key:       TimeKey,
  pub measures:       Measures,
  pub derived:        DerivedMeasures,
}

impl ResultFact {
  /// Value of the given foreign key on this row.
  pub fn key(&self, fk: ForeignKey) -> i64 {
    match fk {
      ForeignKey::Race => self.race_id,
      ForeignKey::Driver => self.driver_id,
      ForeignKey::Constructor => self.constructor_id,
      ForeignKey::Circuit => self.circuit_id,
      ForeignKey::Time => self.time_key.get(),
    }
  }
}

/// The foreign keys carried by every fact row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
  Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForeignKey {
  Race,
  Driver,
  Constructor,
  Circuit,
  Time,
}

impl ForeignKey {
  pub fn dimension(self) -> Dimension {
    match self {
      Self::Race => Dimension::Race,
      Self::Driver => Dimension::Driver,
      Self::Constructor => Dimension::Constructor,
      Self::Circuit => Dimension::Circuit,
      Self::Time => Dimension::Time,
    }
  }

  /// Column on the fact table; always named like the dimension key.
  pub fn column(self) -> &'static str { self.dimension().key_column() }
}
