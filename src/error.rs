//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// A failed search, the backend's failure sentinel.
///
/// The engine never surfaces this to the platform: a failed search marks the
/// query as unsuccessful and lets the native database query run instead.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("Search backend unreachable: {0}")]
  Unavailable(String),

  #[error("Search request rejected: {0}")]
  Rejected(String),

  #[error("Malformed search response: {0}")]
  MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
