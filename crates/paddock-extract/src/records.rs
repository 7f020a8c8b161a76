//! Typed records for each source extract.
//!
//! Field names follow the extract headers. Every field is optional: a
//! null-like token arrives here as `None`, and deciding which absences are
//! fatal is left to the loaders.

use serde::Deserialize;

use crate::{SourceRecord, SourceTable};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverRecord {
  #[serde(rename = "driverId")]
  pub driver_id:   Option<i64>,
  pub forename:    Option<String>,
  pub surname:     Option<String>,
  pub code:        Option<String>,
  pub number:      Option<i64>,
  pub nationality: Option<String>,
  /// Date of birth, still in its textual form.
  pub dob:         Option<String>,
  pub url:         Option<String>,
}

impl SourceRecord for DriverRecord {
  const TABLE: SourceTable = SourceTable::Drivers;
  const COLUMNS: &'static [&'static str] = &[
    "driverId", "forename", "surname", "code", "number", "nationality", "dob", "url",
  ];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstructorRecord {
  #[serde(rename = "constructorId")]
  pub constructor_id:  Option<i64>,
  #[serde(rename = "constructorRef")]
  pub constructor_ref: Option<String>,
  pub name:            Option<String>,
  pub nationality:     Option<String>,
  pub url:             Option<String>,
}

impl SourceRecord for ConstructorRecord {
  const TABLE: SourceTable = SourceTable::Constructors;
  const COLUMNS: &'static [&'static str] =
    &["constructorId", "constructorRef", "name", "nationality", "url"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CircuitRecord {
  #[serde(rename = "circuitId")]
  pub circuit_id: Option<i64>,
  pub name:       Option<String>,
  pub location:   Option<String>,
  pub country:    Option<String>,
  pub lat:        Option<f64>,
  pub lng:        Option<f64>,
  pub alt:        Option<f64>,
  pub url:        Option<String>,
}

impl SourceRecord for CircuitRecord {
  const TABLE: SourceTable = SourceTable::Circuits;
  const COLUMNS: &'static [&'static str] =
    &["circuitId", "name", "location", "country", "lat", "lng", "alt", "url"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RaceRecord {
  #[serde(rename = "raceId")]
  pub race_id:    Option<i64>,
  pub year:       Option<i32>,
  pub round:      Option<i32>,
  #[serde(rename = "circuitId")]
  pub circuit_id: Option<i64>,
  pub name:       Option<String>,
  /// Kept textual; the time dimension decides what parses.
  pub date:       Option<String>,
  pub time:       Option<String>,
  pub url:        Option<String>,
}

impl SourceRecord for RaceRecord {
  const TABLE: SourceTable = SourceTable::Races;
  const COLUMNS: &'static [&'static str] =
    &["raceId", "year", "round", "circuitId", "name", "date", "time", "url"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultRecord {
  #[serde(rename = "resultId")]
  pub result_id:         Option<i64>,
  #[serde(rename = "raceId")]
  pub race_id:           Option<i64>,
  #[serde(rename = "driverId")]
  pub driver_id:         Option<i64>,
  #[serde(rename = "constructorId")]
  pub constructor_id:    Option<i64>,
  pub grid:              Option<i32>,
  pub position:          Option<i32>,
  pub points:            Option<f64>,
  pub laps:              Option<i32>,
  pub milliseconds:      Option<i64>,
  #[serde(rename = "fastestLap")]
  pub fastest_lap:       Option<i32>,
  #[serde(rename = "fastestLapTime")]
  pub fastest_lap_time:  Option<String>,
  #[serde(rename = "fastestLapSpeed")]
  pub fastest_lap_speed: Option<f64>,
  #[serde(rename = "statusId")]
  pub status_id:         Option<i64>,
}

impl SourceRecord for ResultRecord {
  const TABLE: SourceTable = SourceTable::Results;
  const COLUMNS: &'static [&'static str] = &[
    "resultId",
    "raceId",
    "driverId",
    "constructorId",
    "grid",
    "position",
    "points",
    "laps",
    "milliseconds",
    "fastestLap",
    "fastestLapTime",
    "fastestLapSpeed",
    "statusId",
  ];
}
