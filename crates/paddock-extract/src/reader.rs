//! CSV reading and null-token normalisation.

use std::{fs::File, io, path::PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{Error, Extract, Located, Result, RowError, SourceRecord};

/// Reads source extracts from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct Extractor {
  data_dir:    PathBuf,
  null_tokens: Vec<String>,
}

impl Extractor {
  pub fn new<I, S>(data_dir: impl Into<PathBuf>, null_tokens: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      data_dir:    data_dir.into(),
      null_tokens: null_tokens.into_iter().map(Into::into).collect(),
    }
  }

  /// Read `R::TABLE` from `<data_dir>/<file_name>`.
  pub fn extract<R: SourceRecord>(&self) -> Result<Extract<R>> {
    let path = self.data_dir.join(R::TABLE.file_name());
    let file = File::open(&path).map_err(|source| Error::Io { path, source })?;
    let extract = self.read::<R, _>(file)?;
    tracing::debug!(table = %R::TABLE, rows = extract.len(), "extracted");
    Ok(extract)
  }

  /// Read an extract from any reader; the first line must be the header.
  pub fn read<R: SourceRecord, Rd: io::Read>(&self, reader: Rd) -> Result<Extract<R>> {
    let table = R::TABLE;
    let mut rdr = ReaderBuilder::new()
      .has_headers(true)
      .trim(Trim::All)
      .from_reader(reader);

    let headers = rdr
      .headers()
      .map_err(|source| Error::Csv { table, source })?
      .clone();
    if let Some(column) = R::COLUMNS
      .iter()
      .copied()
      .find(|column| !headers.iter().any(|h| h == *column))
    {
      return Err(Error::MissingColumn { table, column });
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
      let record = record.map_err(|source| Error::Csv { table, source })?;
      // Header is line 1.
      let line = record
        .position()
        .map_or(idx as u64 + 2, csv::Position::line);

      let normalised = self.normalise(&record);
      let row = normalised
        .deserialize::<R>(Some(&headers))
        .map(|record| Located { line, record })
        .map_err(|e| RowError { line, message: e.to_string() });
      rows.push(row);
    }

    Ok(Extract { table, rows })
  }

  fn is_null(&self, field: &str) -> bool {
    self.null_tokens.iter().any(|token| token == field)
  }

  /// Blank out null-like fields; the record decoder reads an empty field as
  /// `None`.
  fn normalise(&self, record: &StringRecord) -> StringRecord {
    record
      .iter()
      .map(|field| if self.is_null(field) { "" } else { field })
      .collect()
  }
}
