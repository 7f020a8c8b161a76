//! The orchestrator.
//!
//! A run extracts every source first, so a broken extract fails the run
//! before anything is written. It then creates the schema, executes the stage
//! plan in order, and finishes with the integrity verifier. Each stage checks
//! that its prerequisites completed before it starts. A failed audit is
//! reported but does not fail the run.

use std::collections::BTreeSet;

use paddock_core::{
  dimension::{Dimension, DimensionBatch},
  stage::{Stage, StagePlan},
  warehouse::Warehouse,
};
use paddock_extract::Extractor;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{
  EtlConfig, Error, Result, RunReport, StageReport, dimensions,
  facts::{self, FactRules, KnownKeys},
  races,
  report::Audit,
  sources::SourceSet,
  time, verify,
};

pub struct Pipeline<'a, W> {
  warehouse: &'a W,
  config:    &'a EtlConfig,
  plan:      StagePlan,
}

impl<'a, W: Warehouse> Pipeline<'a, W> {
  /// A pipeline running the full stage plan.
  pub fn new(warehouse: &'a W, config: &'a EtlConfig) -> Self {
    Self { warehouse, config, plan: StagePlan::full() }
  }

  /// Run `order` instead of the full plan. Fails if `order` breaks the
  /// dependency graph.
  pub fn with_stages(mut self, order: Vec<Stage>) -> Result<Self> {
    self.plan = StagePlan::new(order)?;
    Ok(self)
  }

  pub async fn run(&self) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("etl_run", %run_id);
    self.run_inner(run_id).instrument(span).await
  }

  async fn run_inner(&self, run_id: Uuid) -> Result<RunReport> {
    tracing::info!(data_dir = %self.config.data_dir.display(), "run started");

    let extractor = Extractor::new(self.config.data_dir.clone(), &self.config.null_tokens);
    let sources = SourceSet::extract(&extractor)?;

    self
      .warehouse
      .init_schema()
      .await
      .map_err(|e| Error::Schema(Box::new(e)))?;

    let mut completed = BTreeSet::new();
    let mut stages = Vec::with_capacity(self.plan.stages().len());
    for &stage in self.plan.stages() {
      if let Some(missing) = stage.missing_prerequisite(&completed) {
        return Err(Error::OutOfOrder { stage, missing });
      }

      let report = self
        .run_stage(stage, &sources)
        .await
        .inspect_err(|e| tracing::error!(%stage, error = %e, "stage aborted"))?;
      report.log();

      completed.insert(stage);
      stages.push(report);
    }

    let audit = match verify(self.warehouse).await {
      Ok(integrity) => {
        if !integrity.is_healthy() {
          tracing::warn!("integrity check reported orphaned rows");
        }
        Audit::Checked(integrity)
      }
      Err(e) => {
        tracing::error!(error = %e, "integrity check could not run");
        Audit::Unavailable { reason: e.to_string() }
      }
    };

    tracing::info!("run finished");
    Ok(RunReport { run_id, stages, audit })
  }

  async fn run_stage(&self, stage: Stage, sources: &SourceSet) -> Result<StageReport> {
    let w = self.warehouse;
    match stage {
      Stage::Drivers => {
        let rows = dimensions::drivers(&sources.drivers);
        dimensions::load(w, stage, sources.drivers.len(), DimensionBatch::Drivers(rows)).await
      }
      Stage::Constructors => {
        let rows = dimensions::constructors(&sources.constructors);
        let batch = DimensionBatch::Constructors(rows);
        dimensions::load(w, stage, sources.constructors.len(), batch).await
      }
      Stage::Circuits => {
        let rows = dimensions::circuits(&sources.circuits);
        dimensions::load(w, stage, sources.circuits.len(), DimensionBatch::Circuits(rows)).await
      }
      Stage::Time => {
        let rows = time::time_rows(&sources.races, self.config.locale);
        dimensions::load(w, stage, sources.races.len(), DimensionBatch::Times(rows)).await
      }
      Stage::Races => {
        let circuits = w
          .dimension_keys(Dimension::Circuit)
          .await
          .map_err(Error::stage(stage))?;
        let rows = races::races(&sources.races, &circuits);
        dimensions::load(w, stage, sources.races.len(), DimensionBatch::Races(rows)).await
      }
      Stage::Results => {
        let known = KnownKeys::fetch(w).await.map_err(Error::stage(stage))?;
        let rules = FactRules::from(self.config);
        let batch = facts::facts(&sources.results, &sources.races, &known, rules);
        facts::load(w, sources.results.len(), batch, self.config.batch_size).await
      }
    }
  }
}
