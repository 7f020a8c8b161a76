//! ETL orchestration for the paddock warehouse.
//!
//! Extracts the race-results CSVs, transforms them into dimension and fact
//! rows, loads them through any [`Warehouse`] in dependency order, and audits
//! the result.
//!
//! ```no_run
//! # async fn run() -> paddock_etl::Result<()> {
//! use paddock_etl::{EtlConfig, Pipeline};
//! use paddock_store_sqlite::SqliteWarehouse;
//!
//! let config = EtlConfig::default();
//! let warehouse = SqliteWarehouse::open(&config.warehouse_path).await.unwrap();
//! let report = Pipeline::new(&warehouse, &config).run().await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! [`Warehouse`]: paddock_core::warehouse::Warehouse

pub mod config;
pub mod dimensions;
pub mod error;
pub mod facts;
pub mod pipeline;
pub mod races;
pub mod report;
pub mod sources;
pub mod time;
pub mod verify;

#[cfg(test)]
mod tests;

pub use self::{
  config::EtlConfig,
  error::{Error, Result},
  pipeline::Pipeline,
  report::{Audit, RunReport, StageReport},
  verify::{IntegrityReport, verify},
};
