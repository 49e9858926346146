//! Integration configuration.
//!
//! Every field has a default matching the platform's stock behaviour, so an
//! empty TOML document is a valid configuration.

use crate::error::{ConfigError, ConfigResult};
use crate::types::ReturnField;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for a `QueryIntegration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
  /// Post type assumed when a non-search query names none.
  pub default_post_type: String,
  /// Table named in the zero-row replacement query.
  pub posts_table: String,
  /// Fields copied from hits into full records, before extension overrides.
  pub return_fields: Vec<ReturnField>,
  /// Response header announcing a diverted request. Empty disables it.
  pub search_header: String,
}

impl Default for IntegrationConfig {
  fn default() -> Self {
    Self {
      default_post_type: "post".to_string(),
      posts_table: "wp_posts".to_string(),
      return_fields: ReturnField::defaults(),
      search_header: "X-ElasticPress-Search".to_string(),
    }
  }
}

impl IntegrationConfig {
  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a TOML file.
  pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&source)
  }

  pub fn validate(&self) -> ConfigResult<()> {
    if self.posts_table.trim().is_empty() {
      return Err(ConfigError::Invalid("posts_table must not be empty".into()));
    }
    if self.default_post_type.trim().is_empty() {
      return Err(ConfigError::Invalid(
        "default_post_type must not be empty".into(),
      ));
    }
    Ok(())
  }

  /// The native query that is guaranteed to return no rows.
  pub fn empty_request(&self) -> String {
    format!("SELECT * FROM {} WHERE 1=0", self.posts_table)
  }
}
