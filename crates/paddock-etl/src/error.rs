use paddock_core::stage::Stage;
use thiserror::Error;

/// A backend error, boxed so the pipeline stays generic over the warehouse.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] ::config::ConfigError),

  #[error("invalid stage plan: {0}")]
  Plan(#[from] paddock_core::Error),

  #[error("source extract failed: {0}")]
  Source(#[from] paddock_extract::Error),

  #[error("stage {stage} started before {missing} completed")]
  OutOfOrder { stage: Stage, missing: Stage },

  #[error("schema initialisation failed: {0}")]
  Schema(#[source] BoxError),

  #[error("stage {stage} failed: {source}")]
  Stage {
    stage:  Stage,
    #[source]
    source: BoxError,
  },

  #[error("integrity check failed: {0}")]
  Verify(#[source] BoxError),
}

impl Error {
  pub(crate) fn stage<E>(stage: Stage) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Stage { stage, source: Box::new(e) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
