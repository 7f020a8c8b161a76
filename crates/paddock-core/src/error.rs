//! Error types for `paddock-core`.

use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error)]
pub enum Error {
  #[error("stage {0} appears more than once in the plan")]
  DuplicateStage(Stage),

  #[error("stage {stage} is scheduled before its prerequisite {prerequisite}")]
  PrerequisiteOutOfOrder { stage: Stage, prerequisite: Stage },

  #[error("stage {stage} requires {prerequisite}, which is not in the plan")]
  MissingPrerequisite { stage: Stage, prerequisite: Stage },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
