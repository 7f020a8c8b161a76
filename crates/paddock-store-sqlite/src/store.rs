//! [`SqliteWarehouse`], the SQLite implementation of [`Warehouse`].

use std::{collections::HashSet, path::Path};

use paddock_core::{
  dimension::{Dimension, DimensionBatch},
  fact::{ForeignKey, ResultFact},
  warehouse::{
    InsertPolicy, LoadOutcome, MeasureTotals, RowErrorPolicy, RowFailure, Table, Warehouse,
  },
};
use rusqlite::{Connection, OpenFlags};

use crate::{Error, Result, encode::Insertable, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A paddock warehouse backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteWarehouse {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse file at `path`. Call
  /// [`Warehouse::init_schema`] before loading.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an existing, already loaded warehouse for reading.
  ///
  /// Fails if the file does not exist or lacks any warehouse table. Every
  /// write through the returned handle is refused by SQLite.
  pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
    let conn =
      tokio_rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .await?;
    let warehouse = Self { conn };
    warehouse.require_tables().await?;
    Ok(warehouse)
  }

  /// Open an in-memory warehouse.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  async fn require_tables(&self) -> Result<()> {
    let present = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(names)
      })
      .await?;

    match Table::all().find(|t| !present.contains(t.name())) {
      Some(table) => Err(Error::NotInitialised { table: table.name() }),
      None => Ok(()),
    }
  }

  async fn count(&self, sql: String) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── Batch insert ────────────────────────────────────────────────────────────

/// Insert `rows` under `policy`, one transaction per batch.
///
/// A failing row either rolls back its open batch and returns the error
/// ([`RowErrorPolicy::FailFast`]) or is recorded and skipped
/// ([`RowErrorPolicy::CollectAndContinue`]). Batches already committed stay
/// committed either way.
fn insert_rows<R: Insertable>(
  conn:   &mut Connection,
  rows:   &[R],
  policy: InsertPolicy,
) -> rusqlite::Result<LoadOutcome> {
  let mut outcome = LoadOutcome::default();
  let batch_size = policy.batch_size.map_or(rows.len(), |n| n.get()).max(1);

  for batch in rows.chunks(batch_size) {
    let tx = conn.transaction()?;
    {
      let mut stmt = tx.prepare_cached(R::INSERT)?;
      for row in batch {
        outcome.attempted += 1;
        match row.insert(&mut stmt) {
          Ok(0) => outcome.duplicates += 1,
          Ok(n) => outcome.inserted += n,
          Err(e) => match policy.on_row_error {
            RowErrorPolicy::FailFast => {
              tracing::error!(key = %row.key(), error = %e, "row rejected; rolling back");
              return Err(e);
            }
            RowErrorPolicy::CollectAndContinue => {
              tracing::warn!(key = %row.key(), error = %e, "row rejected; skipping");
              outcome.failures.push(RowFailure { key: row.key(), reason: e.to_string() });
            }
          },
        }
      }
    }
    tx.commit()?;
    if policy.batch_size.is_some() {
      tracing::debug!(attempted = outcome.attempted, inserted = outcome.inserted, "batch committed");
    }
  }

  Ok(outcome)
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = crate::Error;

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_dimension(
    &self,
    batch:  DimensionBatch,
    policy: InsertPolicy,
  ) -> Result<LoadOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let outcome = match &batch {
          DimensionBatch::Drivers(rows) => insert_rows(conn, rows, policy)?,
          DimensionBatch::Constructors(rows) => insert_rows(conn, rows, policy)?,
          DimensionBatch::Circuits(rows) => insert_rows(conn, rows, policy)?,
          DimensionBatch::Times(rows) => insert_rows(conn, rows, policy)?,
          DimensionBatch::Races(rows) => insert_rows(conn, rows, policy)?,
        };
        Ok(outcome)
      })
      .await?;
    Ok(outcome)
  }

  async fn load_facts(
    &self,
    rows:   Vec<ResultFact>,
    policy: InsertPolicy,
  ) -> Result<LoadOutcome> {
    let outcome = self
      .conn
      .call(move |conn| Ok(insert_rows(conn, &rows, policy)?))
      .await?;
    Ok(outcome)
  }

  async fn dimension_keys(&self, dimension: Dimension) -> Result<HashSet<i64>> {
    let sql = format!(
      "SELECT {} FROM {}",
      dimension.key_column(),
      dimension.table_name()
    );

    let keys = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let keys = stmt
          .query_map([], |row| row.get::<_, i64>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }

  async fn row_count(&self, table: Table) -> Result<u64> {
    self.count(format!("SELECT COUNT(*) FROM {}", table.name())).await
  }

  async fn orphan_count(&self, key: ForeignKey) -> Result<u64> {
    let dim = key.dimension();
    let sql = format!(
      "SELECT COUNT(*)
       FROM fact_race_result f
       LEFT JOIN {table} d ON f.{fk} = d.{pk}
       WHERE f.{fk} IS NOT NULL AND d.{pk} IS NULL",
      table = dim.table_name(),
      fk = key.column(),
      pk = dim.key_column(),
    );
    self.count(sql).await
  }

  async fn measure_totals(&self) -> Result<MeasureTotals> {
    let totals = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*),
             COALESCE(SUM(is_win), 0),
             COALESCE(SUM(is_podium), 0),
             COALESCE(SUM(is_pole), 0),
             COALESCE(SUM(is_scored), 0),
             COALESCE(SUM(is_finished), 0),
             TOTAL(points)
           FROM fact_race_result",
          [],
          |row| {
            let count = |i: usize| row.get::<_, i64>(i).map(|n| n.max(0) as u64);
            Ok(MeasureTotals {
              results:  count(0)?,
              wins:     count(1)?,
              podiums:  count(2)?,
              poles:    count(3)?,
              scored:   count(4)?,
              finished: count(5)?,
              points:   row.get(6)?,
            })
          },
        )?)
      })
      .await?;
    Ok(totals)
  }
}
