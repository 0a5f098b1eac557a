use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const UNKNOWN_SERIES: &str = "Unknown";
const PARALLEL_MARKER: &str = " (parallel)";

static CARD_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?i)([a-z]+[0-9]{2,})-([0-9]{3})").expect("card code pattern is valid")
});

static IDENTITY_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?i)[a-z]+[0-9]{2,}-[0-9]{3}$").expect("identity code pattern is valid")
});

static SERIES_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([A-Z]+)([0-9]{2})$").expect("series pattern is valid"));

/// One row of the scraped card dataset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CardRecord {
  #[serde(rename = "Character")]
  pub character: String,
  #[serde(rename = "Color")]
  pub color: String,
  #[serde(rename = "Picture")]
  pub picture_url: String,
}

impl CardRecord {
  pub fn new(
    character: impl Into<String>,
    color: impl Into<String>,
    picture_url: impl Into<String>,
  ) -> Self {
    Self {
      character: character.into(),
      color: color.into(),
      picture_url: picture_url.into(),
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCard {
  pub character: String,
  pub color: String,
  pub picture_url: String,
  pub card_code: String,
  pub series_code: String,
  pub series_label: String,
  pub identity: String,
  pub normalized_character: String,
}

/// Derives the code, series and wishlist identity of a single record.
///
/// Identity is the upper-cased card code, so alternate-art prints of one card
/// share a wishlist entry. Records without a recognizable code fall back to
/// their picture URL.
pub fn enrich(record: &CardRecord) -> EnrichedCard {
  let card_code = extract_card_code(&record.picture_url);
  let series_code = card_code
    .split_once('-')
    .map(|(series, _)| series.to_string())
    .unwrap_or_default();
  let series_label = series_label(&series_code);
  let identity = if card_code.is_empty() {
    record.picture_url.clone()
  } else {
    card_code.clone()
  };

  EnrichedCard {
    character: record.character.clone(),
    color: record.color.clone(),
    picture_url: record.picture_url.clone(),
    card_code,
    series_code,
    series_label,
    identity,
    normalized_character: normalize_character(&record.character),
  }
}

pub fn enrich_all(records: &[CardRecord]) -> Vec<EnrichedCard> {
  records.iter().map(enrich).collect()
}

/// Looks for `<LETTERS><2+ digits>-<3 digits>` at the start of the last path
/// segment, e.g. `.../OP01-001_p1.png` gives `OP01-001`.
pub fn extract_card_code(picture_url: &str) -> String {
  let path = picture_url
    .split(['?', '#'])
    .next()
    .unwrap_or_default()
    .trim_end_matches('/');
  let segment = path.rsplit('/').next().unwrap_or_default();

  CARD_CODE_RE
    .captures(segment)
    .map(|captures| format!("{}-{}", &captures[1], &captures[2]).to_uppercase())
    .unwrap_or_default()
}

/// Normalizes a wishlist identity from outside the catalog: bare card codes
/// are upper-cased to match `enrich`, anything else is only trimmed.
pub fn canonical_identity(raw: &str) -> String {
  let trimmed = raw.trim();
  if IDENTITY_CODE_RE.is_match(trimmed) {
    trimmed.to_uppercase()
  } else {
    trimmed.to_string()
  }
}

pub fn series_label(series_code: &str) -> String {
  if series_code.is_empty() {
    return UNKNOWN_SERIES.to_string();
  }
  match SERIES_RE.captures(series_code) {
    Some(captures) => format!("{}-{}", &captures[1], &captures[2]),
    None => series_code.to_string(),
  }
}

pub fn normalize_character(character: &str) -> String {
  let trimmed = character.trim();
  let split_at = trimmed.len().saturating_sub(PARALLEL_MARKER.len());
  match (trimmed.get(..split_at), trimmed.get(split_at..)) {
    (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(PARALLEL_MARKER) => {
      head.trim_end().to_string()
    }
    _ => trimmed.to_string(),
  }
}
