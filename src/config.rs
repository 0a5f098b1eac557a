//! `catalog.toml` settings.

use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::wishlist::DEFAULT_STORAGE_KEY;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "catalog.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse catalog.toml: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("invalid config: {0}")]
  Validation(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
  pub page_size: usize,
  /// Remote wishlist JSON. Without it the wishlist is local only.
  pub wishlist_url: Option<String>,
  pub storage_key: String,
  /// Enables the edit gate when set.
  pub edit_secret: Option<String>,
  /// Card dataset to load at startup, relative to the config directory.
  pub dataset_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      wishlist_url: None,
      storage_key: DEFAULT_STORAGE_KEY.to_string(),
      edit_secret: None,
      dataset_path: None,
    }
  }
}

impl CatalogConfig {
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    let config: CatalogConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path)?;
    Self::from_toml_str(&text)
  }

  /// Defaults when the file is missing; defaults plus a warning when it is
  /// unreadable or invalid.
  pub fn load_or_default(path: &Path) -> Self {
    if !path.exists() {
      return Self::default();
    }
    match Self::load(path) {
      Ok(config) => config,
      Err(error) => {
        warn!("Ignoring {}: {}", path.display(), error);
        Self::default()
      }
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.page_size == 0 {
      return Err(ConfigError::Validation("page_size must be at least 1".to_string()));
    }
    if self.storage_key.trim().is_empty() {
      return Err(ConfigError::Validation("storage_key must not be empty".to_string()));
    }
    if let Some(url) = &self.wishlist_url {
      if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
          "wishlist_url must be an http(s) URL, got '{}'",
          url
        )));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn empty_file_gives_defaults() {
    assert_eq!(CatalogConfig::from_toml_str("").unwrap(), CatalogConfig::default());
  }

  #[test]
  fn parses_every_field() {
    let config = CatalogConfig::from_toml_str(
      r#"
      page_size = 48
      wishlist_url = "https://example.org/wishlist.json"
      storage_key = "my-wishlist"
      edit_secret = "straw-hat"
      dataset_path = "cards.json"
      "#,
    )
    .unwrap();
    assert_eq!(config.page_size, 48);
    assert_eq!(config.wishlist_url.as_deref(), Some("https://example.org/wishlist.json"));
    assert_eq!(config.storage_key, "my-wishlist");
    assert_eq!(config.edit_secret.as_deref(), Some("straw-hat"));
    assert_eq!(config.dataset_path, Some(PathBuf::from("cards.json")));
  }

  #[test]
  fn rejects_invalid_values() {
    assert!(matches!(
      CatalogConfig::from_toml_str("page_size = 0"),
      Err(ConfigError::Validation(_))
    ));
    assert!(matches!(
      CatalogConfig::from_toml_str("wishlist_url = \"wishlist.json\""),
      Err(ConfigError::Validation(_))
    ));
    assert!(matches!(
      CatalogConfig::from_toml_str("page_sise = 10"),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn load_or_default_tolerates_bad_files() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join(CONFIG_FILE);
    assert_eq!(CatalogConfig::load_or_default(&missing), CatalogConfig::default());

    fs::write(&missing, "page_size = \"many\"").unwrap();
    assert_eq!(CatalogConfig::load_or_default(&missing), CatalogConfig::default());

    fs::write(&missing, "page_size = 25").unwrap();
    assert_eq!(CatalogConfig::load_or_default(&missing).page_size, 25);
  }
}
