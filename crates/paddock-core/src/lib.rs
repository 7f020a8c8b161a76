//! Core types and trait definitions for the paddock race-results warehouse.
//!
//! This crate is deliberately free of CSV and database dependencies. The
//! extractor, the SQLite backend and the ETL orchestrator all depend on it.

// Native `async fn` in traits; the returned futures are declared `Send`
// explicitly on the trait methods.
#![allow(async_fn_in_trait)]

pub mod calendar;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod stage;
pub mod warehouse;

pub use error::{Error, Result};
