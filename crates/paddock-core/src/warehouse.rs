//! The `Warehouse` trait and its supporting types.
//!
//! The trait is implemented by storage backends (e.g. `paddock-store-sqlite`).
//! The ETL orchestrator depends on this abstraction, not on a concrete
//! backend.

use std::{collections::HashSet, future::Future, num::NonZeroUsize};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator as _};

use crate::{
  dimension::{Dimension, DimensionBatch},
  fact::{ForeignKey, ResultFact},
};

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Every table the warehouse owns.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Driver,
  Constructor,
  Circuit,
  Time,
  Race,
  RaceResult,
}

impl Table {
  pub fn name(self) -> &'static str {
    match self.dimension() {
      Some(dim) => dim.table_name(),
      None => "fact_race_result",
    }
  }

  pub fn dimension(self) -> Option<Dimension> {
    match self {
      Self::Driver => Some(Dimension::Driver),
      Self::Constructor => Some(Dimension::Constructor),
      Self::Circuit => Some(Dimension::Circuit),
      Self::Time => Some(Dimension::Time),
      Self::Race => Some(Dimension::Race),
      Self::RaceResult => None,
    }
  }

  /// All tables, dimensions first.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

impl From<Dimension> for Table {
  fn from(dim: Dimension) -> Self {
    match dim {
      Dimension::Driver => Self::Driver,
      Dimension::Constructor => Self::Constructor,
      Dimension::Circuit => Self::Circuit,
      Dimension::Time => Self::Time,
      Dimension::Race => Self::Race,
    }
  }
}

// ─── Insert policy ───────────────────────────────────────────────────────────

/// What a batch insert does when a single row is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
  /// Abort and roll back the open transaction.
  FailFast,
  /// Record the failure, skip the row, keep going.
  CollectAndContinue,
}

/// How a typed batch insert commits and reacts to per-row failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPolicy {
  /// Commit every `n` rows; `None` commits once at the end.
  pub batch_size:   Option<NonZeroUsize>,
  pub on_row_error: RowErrorPolicy,
}

impl InsertPolicy {
  /// One transaction, rolled back in full on the first failure.
  pub fn all_or_nothing() -> Self {
    Self { batch_size: None, on_row_error: RowErrorPolicy::FailFast }
  }

  /// Commit every `batch_size` rows, skipping rows the store rejects.
  pub fn batched(batch_size: NonZeroUsize) -> Self {
    Self {
      batch_size:   Some(batch_size),
      on_row_error: RowErrorPolicy::CollectAndContinue,
    }
  }
}

/// A row the store refused under [`RowErrorPolicy::CollectAndContinue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
  /// Natural key of the rejected row.
  pub key:    String,
  pub reason: String,
}

/// What a batch insert did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
  pub attempted:  usize,
  /// Rows actually persisted by this call.
  pub inserted:   usize,
  /// Rows whose key already existed; left untouched.
  pub duplicates: usize,
  pub failures:   Vec<RowFailure>,
}

// ─── Audit types ─────────────────────────────────────────────────────────────

/// Sums of the derived boolean measures over the whole fact table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureTotals {
  pub results:  u64,
  pub wins:     u64,
  pub podiums:  u64,
  pub poles:    u64,
  pub scored:   u64,
  pub finished: u64,
  pub points:   f64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a warehouse backend.
///
/// Loads are append-only and duplicate-suppressing: inserting a row whose key
/// already exists is a no-op, never an overwrite. Referential integrity
/// between facts and dimensions is not enforced by the store; it is audited
/// afterwards through [`Warehouse::orphan_count`].
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create any missing tables. Idempotent.
  fn init_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert a batch of dimension rows under `policy`.
  fn load_dimension(
    &self,
    batch: DimensionBatch,
    policy: InsertPolicy,
  ) -> impl Future<Output = Result<LoadOutcome, Self::Error>> + Send + '_;

  /// Insert fact rows under `policy`.
  fn load_facts(
    &self,
    rows: Vec<ResultFact>,
    policy: InsertPolicy,
  ) -> impl Future<Output = Result<LoadOutcome, Self::Error>> + Send + '_;

  /// Every key currently present in a dimension table.
  fn dimension_keys(
    &self,
    dimension: Dimension,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + '_;

  fn row_count(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Fact rows whose `key` does not resolve to a dimension row.
  fn orphan_count(
    &self,
    key: ForeignKey,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn measure_totals(
    &self,
  ) -> impl Future<Output = Result<MeasureTotals, Self::Error>> + Send + '_;
}
