//! `paddock`: load the race-results extracts into the warehouse.
//!
//! ```sh
//! paddock run --config paddock.toml
//! paddock verify
//! paddock stats --year 2023 --limit 5
//! ```
//!
//! Settings come from built-in defaults, then the TOML file given with
//! `--config`, then `PADDOCK_*` environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use paddock_core::warehouse::{MeasureTotals, Warehouse as _};
use paddock_etl::{
  EtlConfig, Pipeline,
  config::{ConfigSources, resolve},
  verify,
};
use paddock_store_sqlite::{
  SqliteWarehouse,
  queries::{
    ConstructorPerformance, DecadeLeader, DriverTally, PoleConversion, SeasonRaces, Standing,
  },
};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Race-results warehouse loader")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, global = true, default_value = "paddock.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Extract, transform and load every stage, then verify.
  Run,
  /// Audit an existing warehouse.
  Verify,
  /// Print aggregate statistics as JSON.
  Stats {
    /// Season for the standings table.
    #[arg(long)]
    year:  Option<i32>,
    /// Rows per ranking.
    #[arg(long, default_value_t = 10)]
    limit: usize,
  },
}

#[derive(Serialize)]
struct Stats {
  overall:      MeasureTotals,
  top_winners:  Vec<DriverTally>,
  top_poles:    Vec<DriverTally>,
  decades:      Vec<DecadeLeader>,
  constructors: Vec<ConstructorPerformance>,
  poles:        PoleConversion,
  seasons:      Vec<SeasonRaces>,
  #[serde(skip_serializing_if = "Option::is_none")]
  standings:    Option<Vec<Standing>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = resolve(ConfigSources::with_file(&cli.config))
    .with_context(|| format!("failed to resolve settings from {:?}", cli.config))?
    .expand_paths();

  match cli.command {
    Command::Run => run(&config).await,
    Command::Verify => {
      let warehouse = open_existing(&config).await?;
      let report = verify(&warehouse).await.context("integrity check failed")?;
      print!("{report}");
      Ok(())
    }
    Command::Stats { year, limit } => stats(&open_existing(&config).await?, year, limit).await,
  }
}

/// Open the configured warehouse read-only; it must already be loaded.
async fn open_existing(config: &EtlConfig) -> anyhow::Result<SqliteWarehouse> {
  SqliteWarehouse::open_read_only(&config.warehouse_path)
    .await
    .with_context(|| format!("failed to open existing warehouse at {:?}", config.warehouse_path))
}

async fn run(config: &EtlConfig) -> anyhow::Result<()> {
  let warehouse = SqliteWarehouse::open(&config.warehouse_path)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", config.warehouse_path))?;

  let report = Pipeline::new(&warehouse, config)
    .run()
    .await
    .context("pipeline aborted")?;
  print!("{report}");
  Ok(())
}

async fn stats(
  warehouse: &SqliteWarehouse,
  year:      Option<i32>,
  limit:     usize,
) -> anyhow::Result<()> {
  let standings = match year {
    Some(year) => Some(warehouse.season_standings(year).await?),
    None => None,
  };
  let stats = Stats {
    overall: warehouse.measure_totals().await?,
    top_winners: warehouse.top_drivers_by_wins(limit).await?,
    top_poles: warehouse.top_drivers_by_poles(limit).await?,
    decades: warehouse.decade_leaders().await?,
    constructors: warehouse.constructor_performance(limit).await?,
    poles: warehouse.pole_conversion().await?,
    seasons: warehouse.races_per_year().await?,
    standings,
  };

  println!("{}", serde_json::to_string_pretty(&stats)?);
  Ok(())
}
