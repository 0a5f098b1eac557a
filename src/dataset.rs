//! The scraped card dataset (`cards.json`).

use crate::card::CardRecord;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
  #[error("failed to read card dataset: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse card dataset: {0}")]
  Parse(#[from] serde_json::Error),
}

pub fn parse_cards(text: &str) -> Result<Vec<CardRecord>, DatasetError> {
  Ok(serde_json::from_str(text)?)
}

pub fn load_cards(path: &Path) -> Result<Vec<CardRecord>, DatasetError> {
  let text = fs::read_to_string(path)?;
  let cards = parse_cards(&text)?;
  log::info!("Loaded {} cards from {}", cards.len(), path.display());
  Ok(cards)
}

/// SHA-256 over every record in order. Equal fingerprints mean the derived
/// views can be reused.
pub fn fingerprint(records: &[CardRecord]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(records.len().to_le_bytes());
  for record in records {
    for field in [&record.character, &record.color, &record.picture_url] {
      hasher.update((field.len() as u64).to_le_bytes());
      hasher.update(field.as_bytes());
    }
  }
  format!("{:x}", hasher.finalize())
}
