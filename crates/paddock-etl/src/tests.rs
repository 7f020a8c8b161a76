//! End-to-end pipeline runs over CSV fixtures in a temporary directory.

use std::{collections::HashSet, fmt::Write as _, fs, num::NonZeroUsize, path::PathBuf};

use paddock_core::{
  dimension::{Dimension, DimensionBatch},
  fact::{ForeignKey, ResultFact},
  stage::Stage,
  warehouse::{InsertPolicy, LoadOutcome, MeasureTotals, Table, Warehouse},
};
use paddock_store_sqlite::SqliteWarehouse;
use strum::IntoEnumIterator as _;
use tempfile::TempDir;

use crate::{Audit, EtlConfig, Error, Pipeline, RunReport};

const DRIVERS: &str = "\
driverId,driverRef,number,code,forename,surname,dob,nationality,url
1,verstappen,1,VER,Max,Verstappen,1997-09-30,Dutch,\\N
2,perez,11,PER,Sergio,Pérez,1990-01-26,Mexican,\\N
3,alonso,14,ALO,Fernando,Alonso,1981-07-29,Spanish,\\N
";

const CONSTRUCTORS: &str = "\
constructorId,constructorRef,name,nationality,url
9,red_bull,Red Bull,Austrian,\\N
117,aston_martin,Aston Martin,British,\\N
";

const CIRCUITS: &str = "\
circuitId,circuitRef,name,location,country,lat,lng,alt,url
79,miami,Miami International Autodrome,Miami,USA,25.9581,-80.2389,\\N,\\N
";

const RACES: &str = "\
raceId,year,round,circuitId,name,date,time,url
1102,2023,5,79,Miami Grand Prix,2023-05-07,19:30:00,\\N
";

const RESULTS_HEADER: &str = "resultId,raceId,driverId,constructorId,grid,position,points,laps,\
                              milliseconds,fastestLap,fastestLapTime,fastestLapSpeed,statusId";

/// Driver 1 wins from third, driver 2 is second from pole, driver 3 has no
/// classified position.
const RESULTS: &str = "\
1,1102,1,9,3,1,25,57,5343345,55,1:29.708,214.102,1
2,1102,2,9,1,2,18,57,5348729,53,1:30.131,213.097,1
3,1102,3,117,5,\\N,0,57,\\N,\\N,\\N,\\N,11
";

struct Fixture {
  dir: TempDir,
}

impl Fixture {
  fn new() -> Self {
    let fixture = Self { dir: TempDir::new().unwrap() };
    fixture.write("drivers.csv", DRIVERS);
    fixture.write("constructors.csv", CONSTRUCTORS);
    fixture.write("circuits.csv", CIRCUITS);
    fixture.write("races.csv", RACES);
    fixture.write_results(RESULTS);
    fixture
  }

  fn write(&self, name: &str, contents: &str) {
    fs::write(self.dir.path().join(name), contents).unwrap();
  }

  fn write_results(&self, rows: &str) {
    self.write("results.csv", &format!("{RESULTS_HEADER}\n{rows}"));
  }

  fn db_path(&self) -> PathBuf { self.dir.path().join("paddock.db") }

  fn config(&self) -> EtlConfig {
    EtlConfig {
      data_dir: self.dir.path().to_path_buf(),
      warehouse_path: self.db_path(),
      ..EtlConfig::default()
    }
  }

  async fn warehouse(&self) -> SqliteWarehouse {
    SqliteWarehouse::open(self.db_path()).await.unwrap()
  }

  /// A plain connection for inspecting loaded rows.
  fn inspect(&self) -> rusqlite::Connection {
    rusqlite::Connection::open(self.db_path()).unwrap()
  }
}

async fn run(fixture: &Fixture, config: &EtlConfig) -> RunReport {
  let warehouse = fixture.warehouse().await;
  Pipeline::new(&warehouse, config).run().await.unwrap()
}

// ─── Faulty backend ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FaultyError {
  #[error(transparent)]
  Store(#[from] paddock_store_sqlite::Error),
  #[error("backend unavailable")]
  Unavailable,
}

/// SQLite with chosen operations failing.
struct Faulty {
  inner:             SqliteWarehouse,
  failing_dimension: Option<Dimension>,
  failing_audit:     bool,
}

impl Faulty {
  async fn new(fixture: &Fixture) -> Self {
    Self { inner: fixture.warehouse().await, failing_dimension: None, failing_audit: false }
  }
}

impl Warehouse for Faulty {
  type Error = FaultyError;

  async fn init_schema(&self) -> Result<(), FaultyError> { Ok(self.inner.init_schema().await?) }

  async fn load_dimension(
    &self,
    batch:  DimensionBatch,
    policy: InsertPolicy,
  ) -> Result<LoadOutcome, FaultyError> {
    if self.failing_dimension == Some(batch.dimension()) {
      return Err(FaultyError::Unavailable);
    }
    Ok(self.inner.load_dimension(batch, policy).await?)
  }

  async fn load_facts(
    &self,
    rows:   Vec<ResultFact>,
    policy: InsertPolicy,
  ) -> Result<LoadOutcome, FaultyError> {
    Ok(self.inner.load_facts(rows, policy).await?)
  }

  async fn dimension_keys(&self, dimension: Dimension) -> Result<HashSet<i64>, FaultyError> {
    Ok(self.inner.dimension_keys(dimension).await?)
  }

  async fn row_count(&self, table: Table) -> Result<u64, FaultyError> {
    Ok(self.inner.row_count(table).await?)
  }

  async fn orphan_count(&self, key: ForeignKey) -> Result<u64, FaultyError> {
    if self.failing_audit {
      return Err(FaultyError::Unavailable);
    }
    Ok(self.inner.orphan_count(key).await?)
  }

  async fn measure_totals(&self) -> Result<MeasureTotals, FaultyError> {
    Ok(self.inner.measure_totals().await?)
  }
}

fn flags(conn: &rusqlite::Connection, driver_id: i64) -> (bool, bool, bool) {
  conn
    .query_row(
      "SELECT is_win, is_podium, is_pole FROM fact_race_result WHERE driver_id = ?1",
      [driver_id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .unwrap()
}

// ─── Scenario ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_race_end_to_end() {
  let fixture = Fixture::new();
  let report = run(&fixture, &fixture.config()).await;

  let results = report.stage(Stage::Results).unwrap();
  assert_eq!(results.extracted, 3);
  assert_eq!(results.loaded, 3);
  assert_eq!(results.skipped, 0);
  assert_eq!(results.excluded, 0);

  let conn = fixture.inspect();
  assert_eq!(flags(&conn, 1), (true, true, false));
  assert_eq!(flags(&conn, 2), (false, true, true));
  assert_eq!(flags(&conn, 3), (false, false, false));

  let (key, decade, quarter, weekday, weekend): (i64, i32, u32, String, bool) = conn
    .query_row(
      "SELECT time_key, decade, quarter, weekday_name, is_weekend FROM dim_time",
      [],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
    )
    .unwrap();
  assert_eq!(key, 20_230_507);
  assert_eq!(decade, 2020);
  assert_eq!(quarter, 2);
  assert_eq!(weekday, "Domingo");
  assert!(weekend);

  let integrity = report.integrity().unwrap();
  assert_eq!(integrity.row_count(Table::Time), Some(1));
  assert_eq!(integrity.totals.wins, 1);
  assert_eq!(integrity.totals.podiums, 2);
  assert_eq!(integrity.totals.poles, 1);
  assert_eq!(integrity.totals.finished, 2);
  assert_eq!(integrity.totals.points, 43.0);
  assert!(integrity.is_healthy());
}

#[tokio::test]
async fn required_final_position_skips_unclassified_results() {
  let fixture = Fixture::new();
  let config = EtlConfig { require_final_position: true, ..fixture.config() };
  let report = run(&fixture, &config).await;

  let results = report.stage(Stage::Results).unwrap();
  assert_eq!(results.loaded, 2);
  assert_eq!(results.skipped, 1);
  assert_eq!(report.integrity().unwrap().row_count(Table::RaceResult), Some(2));
}

#[tokio::test]
async fn rerun_changes_nothing() {
  let fixture = Fixture::new();
  let config = fixture.config();

  let first = run(&fixture, &config).await;
  let second = run(&fixture, &config).await;

  let (before, after) = (first.integrity().unwrap(), second.integrity().unwrap());
  assert_eq!(before.counts, after.counts);
  assert_eq!(before.totals, after.totals);
  for stage in &second.stages {
    assert_eq!(stage.loaded, 0, "{}", stage.stage);
    assert_eq!(stage.duplicates, stage.transformed, "{}", stage.stage);
  }
  assert_ne!(first.run_id, second.run_id);
}

// ─── Failure containment ─────────────────────────────────────────────────────

#[tokio::test]
async fn one_malformed_result_in_a_thousand() {
  let fixture = Fixture::new();
  let mut rows = String::new();
  for id in 1..=1000 {
    let driver = id % 3 + 1;
    let position = if id == 500 { "P3".to_owned() } else { (id % 20 + 1).to_string() };
    writeln!(rows, "{id},1102,{driver},9,{driver},{position},0,57,\\N,\\N,\\N,\\N,1").unwrap();
  }
  fixture.write_results(&rows);

  let config = EtlConfig { batch_size: NonZeroUsize::new(64).unwrap(), ..fixture.config() };
  let report = run(&fixture, &config).await;

  let results = report.stage(Stage::Results).unwrap();
  assert_eq!(results.extracted, 1000);
  assert_eq!(results.loaded, 999);
  assert_eq!(results.skipped, 1);
  assert_eq!(report.integrity().unwrap().row_count(Table::RaceResult), Some(999));

  let missing: i64 = fixture
    .inspect()
    .query_row("SELECT COUNT(*) FROM fact_race_result WHERE result_id = 500", [], |r| r.get(0))
    .unwrap();
  assert_eq!(missing, 0);
}

#[tokio::test]
async fn race_at_unknown_circuit_is_excluded_with_its_results() {
  let fixture = Fixture::new();
  fixture.write(
    "races.csv",
    &format!("{RACES}1103,2023,6,99,Nowhere Grand Prix,2023-05-28,13:00:00,\\N\n"),
  );
  fixture.write_results(&format!(
    "{RESULTS}4,1103,1,9,1,1,25,78,\\N,\\N,\\N,\\N,1\n5,1103,2,9,2,2,18,78,\\N,\\N,\\N,\\N,1\n"
  ));

  let report = run(&fixture, &fixture.config()).await;

  let races = report.stage(Stage::Races).unwrap();
  assert_eq!(races.extracted, 2);
  assert_eq!(races.excluded, 1);
  assert_eq!(races.loaded, 1);

  let results = report.stage(Stage::Results).unwrap();
  assert_eq!(results.excluded, 2);
  assert_eq!(results.loaded, 3);

  for key in ForeignKey::iter() {
    assert_eq!(report.integrity().unwrap().orphan_count(key), Some(0), "{key}");
  }
  assert!(report.integrity().unwrap().is_healthy());
}

#[tokio::test]
async fn results_for_unknown_drivers_are_excluded() {
  let fixture = Fixture::new();
  fixture.write_results(&format!("{RESULTS}4,1102,77,9,7,4,12,57,\\N,\\N,\\N,\\N,1\n"));

  let report = run(&fixture, &fixture.config()).await;
  let results = report.stage(Stage::Results).unwrap();
  assert_eq!(results.excluded, 1);
  assert_eq!(results.loaded, 3);
  assert_eq!(report.integrity().unwrap().orphan_count(ForeignKey::Driver), Some(0));
}

// ─── Aborts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_dimension_source_aborts_before_any_write() {
  let fixture = Fixture::new();
  fixture.write("circuits.csv", &format!("{CIRCUITS}80,x,X,X,X,north,0,0,\\N\n"));

  let warehouse = fixture.warehouse().await;
  let err = Pipeline::new(&warehouse, &fixture.config()).run().await.unwrap_err();
  assert!(matches!(err, Error::Source(_)), "{err}");

  // The schema was never created.
  assert!(warehouse.row_count(Table::Driver).await.is_err());
}

#[tokio::test]
async fn missing_source_file_aborts() {
  let fixture = Fixture::new();
  fs::remove_file(fixture.dir.path().join("results.csv")).unwrap();

  let warehouse = fixture.warehouse().await;
  let err = Pipeline::new(&warehouse, &fixture.config()).run().await.unwrap_err();
  assert!(matches!(err, Error::Source(paddock_extract::Error::Io { .. })), "{err}");
}

#[tokio::test]
async fn failed_dimension_load_stops_dependent_stages() {
  let fixture = Fixture::new();
  let warehouse =
    Faulty { failing_dimension: Some(Dimension::Circuit), ..Faulty::new(&fixture).await };

  let err = Pipeline::new(&warehouse, &fixture.config()).run().await.unwrap_err();
  assert!(matches!(err, Error::Stage { stage: Stage::Circuits, .. }), "{err}");

  let inner = &warehouse.inner;
  assert_eq!(inner.row_count(Table::Circuit).await.unwrap(), 0);
  assert_eq!(inner.row_count(Table::Race).await.unwrap(), 0);
  assert_eq!(inner.row_count(Table::RaceResult).await.unwrap(), 0);
  // Stages ahead of the failure keep their rows.
  assert_eq!(inner.row_count(Table::Driver).await.unwrap(), 3);
}

#[tokio::test]
async fn failed_audit_does_not_fail_the_run() {
  let fixture = Fixture::new();
  let warehouse = Faulty { failing_audit: true, ..Faulty::new(&fixture).await };

  let report = Pipeline::new(&warehouse, &fixture.config()).run().await.unwrap();

  assert_eq!(report.stages.len(), Stage::iter().count());
  assert_eq!(report.stage(Stage::Results).unwrap().loaded, 3);
  assert!(report.integrity().is_none());
  assert!(matches!(report.audit, Audit::Unavailable { .. }));
  assert!(report.to_string().contains("integrity: FAIL (could not audit"));
}

#[tokio::test]
async fn stage_order_must_respect_dependencies() {
  let fixture = Fixture::new();
  let warehouse = fixture.warehouse().await;
  let config = fixture.config();

  let result =
    Pipeline::new(&warehouse, &config).with_stages(vec![Stage::Races, Stage::Circuits]);
  assert!(matches!(result, Err(Error::Plan(_))));
}

#[tokio::test]
async fn partial_plan_loads_only_its_stages() {
  let fixture = Fixture::new();
  let warehouse = fixture.warehouse().await;
  let config = fixture.config();

  let report = Pipeline::new(&warehouse, &config)
    .with_stages(vec![Stage::Circuits, Stage::Drivers])
    .unwrap()
    .run()
    .await
    .unwrap();

  assert_eq!(report.stages.len(), 2);
  assert_eq!(report.integrity().unwrap().row_count(Table::Circuit), Some(1));
  assert_eq!(report.integrity().unwrap().row_count(Table::Driver), Some(3));
  assert_eq!(report.integrity().unwrap().row_count(Table::Race), Some(0));
}

#[tokio::test]
async fn time_stage_counts_every_race_date() {
  let fixture = Fixture::new();
  fixture.write(
    "races.csv",
    &format!(
      "{RACES}1103,2023,6,79,Sprint,2023-05-07,15:00:00,\\N\n1104,2023,7,79,TBA,\\N,\\N,\\N\n"
    ),
  );

  let report = run(&fixture, &fixture.config()).await;
  let time = report.stage(Stage::Time).unwrap();
  assert_eq!(time.extracted, 3);
  assert_eq!(time.excluded, 2);
  assert_eq!(time.loaded, 1);
}

#[tokio::test]
async fn report_renders_pass_verdict() {
  let fixture = Fixture::new();
  let report = run(&fixture, &fixture.config()).await;
  let text = report.to_string();
  assert!(text.contains("fact_race_result"));
  assert!(text.ends_with("integrity: PASS\n"));
}
