//! Raw extractor for the race-results CSV extracts.
//!
//! Reads one extract at a time into typed records, replacing every configured
//! null-like token (`\N`, `N/A`, the empty string, …) with an absent value.
//! Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use paddock_extract::{Extractor, records::DriverRecord};
//!
//! let extractor = Extractor::new("data", ["\\N", "N/A", ""]);
//! let drivers = extractor.extract::<DriverRecord>().unwrap();
//! println!("{} driver rows", drivers.len());
//! ```
//!
//! A missing file, a missing column or broken CSV framing fails the whole
//! extract. A field that does not fit its column type only fails its own
//! row, which is reported as a [`RowError`] in place.

pub mod error;
mod reader;
pub mod records;

pub use error::{Error, Result};
pub use reader::Extractor;
use serde::de::DeserializeOwned;
use strum::{Display, EnumIter};

// ─── Source tables ───────────────────────────────────────────────────────────

/// The extracts the warehouse is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SourceTable {
  Drivers,
  Constructors,
  Circuits,
  Races,
  Results,
}

impl SourceTable {
  pub fn file_name(self) -> &'static str {
    match self {
      Self::Drivers => "drivers.csv",
      Self::Constructors => "constructors.csv",
      Self::Circuits => "circuits.csv",
      Self::Races => "races.csv",
      Self::Results => "results.csv",
    }
  }
}

/// A typed row of one source extract.
pub trait SourceRecord: DeserializeOwned {
  const TABLE: SourceTable;
  /// Header names that must be present in the extract.
  const COLUMNS: &'static [&'static str];
}

// ─── Extract ─────────────────────────────────────────────────────────────────

/// A row whose fields could not be typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
  /// 1-based line in the source file.
  pub line:    u64,
  pub message: String,
}

/// A typed row and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<R> {
  /// 1-based line in the source file.
  pub line:   u64,
  pub record: R,
}

/// Every row of one extract, in file order.
#[derive(Debug)]
pub struct Extract<R> {
  pub table: SourceTable,
  pub rows:  Vec<std::result::Result<Located<R>, RowError>>,
}

impl<R> Extract<R> {
  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// All rows, or the first malformed one as an error.
  pub fn into_strict(self) -> Result<Vec<R>> {
    let table = self.table;
    self
      .rows
      .into_iter()
      .map(|row| {
        row
          .map(|r| r.record)
          .map_err(|e| Error::MalformedRow { table, line: e.line, message: e.message })
      })
      .collect()
  }

  /// Well-formed rows and malformed rows, each in file order.
  pub fn partition(self) -> (Vec<R>, Vec<RowError>) {
    let mut good = Vec::with_capacity(self.rows.len());
    let mut bad = Vec::new();
    for row in self.rows {
      match row {
        Ok(r) => good.push(r.record),
        Err(e) => bad.push(e),
      }
    }
    (good, bad)
  }
}
