//! The integrity verifier.
//!
//! Read-only and advisory: it reports row counts, orphaned foreign keys and
//! measure totals, and never changes the warehouse or the exit status of a
//! run.

use std::fmt;

use paddock_core::{
  fact::ForeignKey,
  warehouse::{MeasureTotals, Table, Warehouse},
};
use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
  pub table: Table,
  pub rows:  u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanCount {
  pub key:     ForeignKey,
  pub orphans: u64,
}

/// A snapshot of warehouse health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
  pub counts:  Vec<TableCount>,
  pub orphans: Vec<OrphanCount>,
  pub totals:  MeasureTotals,
}

impl IntegrityReport {
  pub fn row_count(&self, table: Table) -> Option<u64> {
    self.counts.iter().find(|c| c.table == table).map(|c| c.rows)
  }

  pub fn orphan_count(&self, key: ForeignKey) -> Option<u64> {
    self.orphans.iter().find(|o| o.key == key).map(|o| o.orphans)
  }

  /// True when no fact row has an unresolved foreign key.
  pub fn is_healthy(&self) -> bool { self.orphans.iter().all(|o| o.orphans == 0) }
}

/// Audit `warehouse`.
pub async fn verify<W: Warehouse>(warehouse: &W) -> Result<IntegrityReport> {
  let failed = |e: W::Error| Error::Verify(Box::new(e));

  let mut counts = Vec::new();
  for table in Table::all() {
    let rows = warehouse.row_count(table).await.map_err(failed)?;
    counts.push(TableCount { table, rows });
  }

  let mut orphans = Vec::new();
  for key in ForeignKey::iter() {
    let n = warehouse.orphan_count(key).await.map_err(failed)?;
    if n > 0 {
      tracing::warn!(%key, orphans = n, "orphaned fact rows");
    }
    orphans.push(OrphanCount { key, orphans: n });
  }

  let totals = warehouse.measure_totals().await.map_err(failed)?;

  let report = IntegrityReport { counts, orphans, totals };
  tracing::info!(
    healthy = report.is_healthy(),
    results = report.totals.results,
    "integrity checked"
  );
  Ok(report)
}

impl fmt::Display for IntegrityReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "row counts")?;
    for c in &self.counts {
      writeln!(f, "  {:<18}{:>10}", c.table.name(), c.rows)?;
    }

    writeln!(f, "foreign keys")?;
    for o in &self.orphans {
      let verdict = if o.orphans == 0 { "PASS" } else { "FAIL" };
      writeln!(f, "  {:<18}{:>10} orphans  {verdict}", o.key.to_string(), o.orphans)?;
    }

    let t = &self.totals;
    writeln!(f, "measures")?;
    writeln!(f, "  wins {}  podiums {}  poles {}", t.wins, t.podiums, t.poles)?;
    writeln!(f, "  scored {}  finished {}  points {:.1}", t.scored, t.finished, t.points)?;

    let overall = if self.is_healthy() { "PASS" } else { "FAIL" };
    writeln!(f, "integrity: {overall}")
  }
}
