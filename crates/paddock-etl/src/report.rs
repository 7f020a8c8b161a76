//! Per-stage and per-run summaries.

use std::fmt;

use paddock_core::{stage::Stage, warehouse::LoadOutcome};
use serde::Serialize;
use uuid::Uuid;

use crate::verify::IntegrityReport;

/// What one stage did with its rows.
///
/// Every extracted row was either excluded, skipped as malformed, or
/// transformed. Every transformed row was then loaded, found already
/// present, or rejected by the warehouse and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage:       Stage,
  /// Rows read from the source.
  pub extracted:   usize,
  /// Rows that survived transformation.
  pub transformed: usize,
  /// Rows dropped for a missing or unresolvable key.
  pub excluded:    usize,
  pub loaded:      usize,
  /// Rows whose key was already in the warehouse.
  pub duplicates:  usize,
  /// Malformed rows plus rows the warehouse rejected.
  pub skipped:     usize,
}

impl StageReport {
  pub(crate) fn new(stage: Stage, extracted: usize, excluded: usize, malformed: usize) -> Self {
    Self {
      stage,
      extracted,
      transformed: extracted.saturating_sub(excluded + malformed),
      excluded,
      loaded: 0,
      duplicates: 0,
      skipped: malformed,
    }
  }

  pub(crate) fn with_outcome(mut self, outcome: &LoadOutcome) -> Self {
    self.loaded = outcome.inserted;
    self.duplicates = outcome.duplicates;
    self.skipped += outcome.failures.len();
    self
  }

  pub(crate) fn log(&self) {
    tracing::info!(
      stage = %self.stage,
      extracted = self.extracted,
      transformed = self.transformed,
      excluded = self.excluded,
      loaded = self.loaded,
      duplicates = self.duplicates,
      skipped = self.skipped,
      "stage complete"
    );
  }
}

/// What the closing integrity check produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Audit {
  Checked(IntegrityReport),
  /// The warehouse could not be audited; the loads still stand.
  Unavailable { reason: String },
}

/// The outcome of a full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id: Uuid,
  pub stages: Vec<StageReport>,
  pub audit:  Audit,
}

impl RunReport {
  pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
    self.stages.iter().find(|s| s.stage == stage)
  }

  pub fn integrity(&self) -> Option<&IntegrityReport> {
    match &self.audit {
      Audit::Checked(report) => Some(report),
      Audit::Unavailable { .. } => None,
    }
  }
}

impl fmt::Display for RunReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "run {}", self.run_id)?;
    writeln!(
      f,
      "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}",
      "stage", "extracted", "excluded", "loaded", "existing", "skipped"
    )?;
    for s in &self.stages {
      writeln!(
        f,
        "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}",
        s.stage.to_string(),
        s.extracted,
        s.excluded,
        s.loaded,
        s.duplicates,
        s.skipped
      )?;
    }
    writeln!(f)?;
    match &self.audit {
      Audit::Checked(report) => write!(f, "{report}"),
      Audit::Unavailable { reason } => writeln!(f, "integrity: FAIL (could not audit: {reason})"),
    }
  }
}
