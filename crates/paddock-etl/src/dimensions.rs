//! Loaders for the independent dimensions: drivers, constructors, circuits.
//!
//! Each transform keeps the source's natural key and drops rows that have
//! none. Every dimension load runs as one all-or-nothing transaction.

use paddock_core::{
  calendar::parse_event_date,
  dimension::{Circuit, Constructor, DimensionBatch, Driver},
  stage::Stage,
  warehouse::{InsertPolicy, Warehouse},
};
use paddock_extract::records::{CircuitRecord, ConstructorRecord, DriverRecord};

use crate::{Error, Result, StageReport};

pub fn drivers(records: &[DriverRecord]) -> Vec<Driver> {
  records
    .iter()
    .filter_map(|r| {
      let Some(driver_id) = r.driver_id else {
        tracing::debug!("driver without driverId dropped");
        return None;
      };
      let date_of_birth = r.dob.as_deref().and_then(|raw| {
        let parsed = parse_event_date(raw);
        if parsed.is_none() {
          tracing::warn!(driver_id, dob = raw, "unparseable date of birth");
        }
        parsed
      });
      Some(Driver {
        driver_id,
        full_name: Driver::full_name_of(r.forename.as_deref(), r.surname.as_deref()),
        forename: r.forename.clone(),
        surname: r.surname.clone(),
        code: r.code.clone(),
        number: r.number,
        nationality: r.nationality.clone(),
        date_of_birth,
        url: r.url.clone(),
      })
    })
    .collect()
}

pub fn constructors(records: &[ConstructorRecord]) -> Vec<Constructor> {
  records
    .iter()
    .filter_map(|r| {
      Some(Constructor {
        constructor_id: r.constructor_id?,
        name:           r.name.clone(),
        reference:      r.constructor_ref.clone(),
        nationality:    r.nationality.clone(),
        url:            r.url.clone(),
      })
    })
    .collect()
}

pub fn circuits(records: &[CircuitRecord]) -> Vec<Circuit> {
  records
    .iter()
    .filter_map(|r| {
      Some(Circuit {
        circuit_id: r.circuit_id?,
        name:       r.name.clone(),
        location:   r.location.clone(),
        country:    r.country.clone(),
        latitude:   r.lat,
        longitude:  r.lng,
        altitude:   r.alt,
        url:        r.url.clone(),
      })
    })
    .collect()
}

/// Load one dimension batch under [`InsertPolicy::all_or_nothing`].
///
/// `extracted` is the source row count, so the report can account for rows
/// the transform dropped.
pub async fn load<W: Warehouse>(
  warehouse: &W,
  stage:     Stage,
  extracted: usize,
  batch:     DimensionBatch,
) -> Result<StageReport> {
  let report = StageReport::new(stage, extracted, extracted.saturating_sub(batch.len()), 0);
  let outcome = warehouse
    .load_dimension(batch, InsertPolicy::all_or_nothing())
    .await
    .map_err(Error::stage(stage))?;
  Ok(report.with_outcome(&outcome))
}
