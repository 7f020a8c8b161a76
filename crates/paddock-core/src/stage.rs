//! Load stages and the dependency graph between them.
//!
//! Dimensions come first, the race dimension after circuits, and the fact
//! table after every dimension. The graph is declared here and checked by
//! the orchestrator before each stage starts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{Error, Result, dimension::Dimension, warehouse::Table};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
  Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
  Drivers,
  Constructors,
  Circuits,
  Time,
  Races,
  Results,
}

impl Stage {
  /// Stages that must have completed before this one may start.
  pub fn prerequisites(self) -> &'static [Stage] {
    match self {
      Self::Drivers | Self::Constructors | Self::Circuits | Self::Time => &[],
      Self::Races => &[Self::Circuits],
      Self::Results => &[
        Self::Drivers,
        Self::Constructors,
        Self::Circuits,
        Self::Time,
        Self::Races,
      ],
    }
  }

  /// The table this stage writes.
  pub fn table(self) -> Table {
    match self {
      Self::Drivers => Dimension::Driver.into(),
      Self::Constructors => Dimension::Constructor.into(),
      Self::Circuits => Dimension::Circuit.into(),
      Self::Time => Dimension::Time.into(),
      Self::Races => Dimension::Race.into(),
      Self::Results => Table::RaceResult,
    }
  }

  /// First prerequisite not yet in `completed`, if any.
  pub fn missing_prerequisite(self, completed: &BTreeSet<Stage>) -> Option<Stage> {
    self
      .prerequisites()
      .iter()
      .copied()
      .find(|p| !completed.contains(p))
  }
}

/// An execution order that respects [`Stage::prerequisites`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
  order: Vec<Stage>,
}

impl StagePlan {
  /// Validate `order` against the dependency graph.
  ///
  /// Every stage may appear once, and each prerequisite must be present and
  /// scheduled earlier.
  pub fn new(order: Vec<Stage>) -> Result<Self> {
    let mut seen = BTreeSet::new();
    for &stage in &order {
      if !seen.insert(stage) {
        return Err(Error::DuplicateStage(stage));
      }
    }

    let mut scheduled = BTreeSet::new();
    for &stage in &order {
      for &prerequisite in stage.prerequisites() {
        if !seen.contains(&prerequisite) {
          return Err(Error::MissingPrerequisite { stage, prerequisite });
        }
        if !scheduled.contains(&prerequisite) {
          return Err(Error::PrerequisiteOutOfOrder { stage, prerequisite });
        }
      }
      scheduled.insert(stage);
    }

    Ok(Self { order })
  }

  /// Independent dimensions, time, races, then results.
  pub fn full() -> Self {
    Self {
      order: vec![
        Stage::Drivers,
        Stage::Constructors,
        Stage::Circuits,
        Stage::Time,
        Stage::Races,
        Stage::Results,
      ],
    }
  }

  pub fn stages(&self) -> &[Stage] { &self.order }
}

impl Default for StagePlan {
  fn default() -> Self { Self::full() }
}
