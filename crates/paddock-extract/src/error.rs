//! Error types for the paddock-extract reader.

use std::path::PathBuf;

use thiserror::Error;

use crate::SourceTable;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed {table} extract: {source}")]
  Csv {
    table:  SourceTable,
    #[source]
    source: csv::Error,
  },

  #[error("{table} extract has no `{column}` column")]
  MissingColumn { table: SourceTable, column: &'static str },

  #[error("{table} extract, line {line}: {message}")]
  MalformedRow { table: SourceTable, line: u64, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
