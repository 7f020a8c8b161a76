//! Error type for `paddock-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("warehouse has no {table} table; load it first")]
  NotInitialised { table: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
