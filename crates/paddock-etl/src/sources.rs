//! The extraction phase: every source read up front, before any load.

use paddock_extract::{
  Extract, Extractor, Result,
  records::{CircuitRecord, ConstructorRecord, DriverRecord, RaceRecord, ResultRecord},
};

/// All five extracts, typed.
///
/// Dimension extracts are strict: one malformed row fails the run before
/// anything is written. The results extract keeps malformed rows in place so
/// the fact loader can skip and count them.
#[derive(Debug)]
pub struct SourceSet {
  pub drivers:      Vec<DriverRecord>,
  pub constructors: Vec<ConstructorRecord>,
  pub circuits:     Vec<CircuitRecord>,
  pub races:        Vec<RaceRecord>,
  pub results:      Extract<ResultRecord>,
}

impl SourceSet {
  pub fn extract(extractor: &Extractor) -> Result<Self> {
    let set = Self {
      drivers:      extractor.extract::<DriverRecord>()?.into_strict()?,
      constructors: extractor.extract::<ConstructorRecord>()?.into_strict()?,
      circuits:     extractor.extract::<CircuitRecord>()?.into_strict()?,
      races:        extractor.extract::<RaceRecord>()?.into_strict()?,
      results:      extractor.extract::<ResultRecord>()?,
    };

    tracing::info!(
      drivers = set.drivers.len(),
      constructors = set.constructors.len(),
      circuits = set.circuits.len(),
      races = set.races.len(),
      results = set.results.len(),
      "sources extracted"
    );
    Ok(set)
  }
}
