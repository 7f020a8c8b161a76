//! Run configuration.
//!
//! Resolved once at startup and handed to the pipeline by value. Loaders
//! never read the environment or the filesystem for settings themselves.

use std::{
  num::NonZeroUsize,
  path::{Path, PathBuf},
};

use ::config::{Config, Environment, File, FileFormat, Map};
use paddock_core::{calendar::Locale, fact::DEFAULT_FINISHED_STATUS};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "PADDOCK";

/// Everything a pipeline run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
  /// Directory holding the source CSV extracts.
  pub data_dir:               PathBuf,
  pub warehouse_path:         PathBuf,
  /// Fact rows per commit.
  pub batch_size:             NonZeroUsize,
  /// `statusId` meaning a classified finish.
  pub finished_status_id:     i64,
  /// Field values read as absent.
  pub null_tokens:            Vec<String>,
  /// Language of month and weekday names in the time dimension.
  pub locale:                 Locale,
  /// Skip results without a final position instead of loading them.
  pub require_final_position: bool,
}

impl Default for EtlConfig {
  fn default() -> Self {
    Self {
      data_dir:               PathBuf::from("data"),
      warehouse_path:         PathBuf::from("paddock.db"),
      batch_size:             NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN),
      finished_status_id:     DEFAULT_FINISHED_STATUS,
      null_tokens:            vec!["\\N".into(), "N/A".into(), String::new()],
      locale:                 Locale::default(),
      require_final_position: false,
    }
  }
}

impl EtlConfig {
  /// Expand a leading `~` in both paths.
  pub fn expand_paths(mut self) -> Self {
    self.data_dir = expand_tilde(&self.data_dir);
    self.warehouse_path = expand_tilde(&self.warehouse_path);
    self
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// The secret store: a TOML document with any subset of the keys.
#[derive(Debug, Clone)]
pub enum SecretSource {
  /// A file on disk; silently skipped when missing.
  File(PathBuf),
  /// TOML text held in memory.
  Inline(String),
}

/// Inputs to [`resolve`]. Environment variables are read from the process
/// unless `env` supplies a replacement map.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
  pub secrets: Option<SecretSource>,
  pub env:     Option<Map<String, String>>,
}

impl ConfigSources {
  pub fn with_file(path: impl Into<PathBuf>) -> Self {
    Self { secrets: Some(SecretSource::File(path.into())), env: None }
  }
}

/// Layer built-in defaults, then the secret store, then `PADDOCK_*`
/// environment variables, and deserialise the result.
///
/// `PADDOCK_NULL_TOKENS` is a comma-separated list.
pub fn resolve(sources: ConfigSources) -> Result<EtlConfig> {
  let defaults = EtlConfig::default();

  let mut builder = Config::builder()
    .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
    .set_default("warehouse_path", defaults.warehouse_path.to_string_lossy().into_owned())?
    .set_default("batch_size", defaults.batch_size.get() as i64)?
    .set_default("finished_status_id", defaults.finished_status_id)?
    .set_default("null_tokens", defaults.null_tokens)?
    .set_default("locale", defaults.locale.to_string())?
    .set_default("require_final_position", defaults.require_final_position)?;

  builder = match sources.secrets {
    Some(SecretSource::File(path)) => builder.add_source(File::from(path).required(false)),
    Some(SecretSource::Inline(text)) => {
      builder.add_source(File::from_str(&text, FileFormat::Toml))
    }
    None => builder,
  };

  let env = Environment::with_prefix(ENV_PREFIX)
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("null_tokens")
    .source(sources.env);

  Ok(builder.add_source(env).build()?.try_deserialize()?)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
