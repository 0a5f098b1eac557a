//! Wishlist membership, with a remote-then-local load and best-effort local
//! persistence.

use crate::card::canonical_identity;
use crate::storage::{KeyValueStorage, StorageError};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_STORAGE_KEY: &str = "opcg-wishlist";

#[derive(Debug, Error)]
pub enum WishlistError {
  #[error("wishlist request failed: {0}")]
  Network(#[from] reqwest::Error),
  #[error("wishlist request failed with status {0}")]
  Status(u16),
  #[error("wishlist payload is not a JSON array: {0}")]
  Malformed(String),
  #[error(transparent)]
  Storage(#[from] StorageError),
  #[error("no remote wishlist configured")]
  NotConfigured,
}

/// A set of card identities kept in the order they were added, which is also
/// the order they are persisted and exported in.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Wishlist {
  order: Vec<String>,
  members: HashSet<String>,
  /// Where the most recent removal sat. Re-adding that identity straight away
  /// puts it back in place.
  last_removed: Option<(String, usize)>,
}

impl Wishlist {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, identity: &str) -> bool {
    self.members.contains(identity)
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.order.iter().map(String::as_str)
  }

  /// Returns false when the identity was already present.
  pub fn insert(&mut self, identity: &str) -> bool {
    if identity.is_empty() || !self.members.insert(identity.to_string()) {
      return false;
    }
    let position = match self.last_removed.take() {
      Some((removed, position)) if removed == identity => position.min(self.order.len()),
      _ => self.order.len(),
    };
    self.order.insert(position, identity.to_string());
    true
  }

  /// Returns false when the identity was not present.
  pub fn remove(&mut self, identity: &str) -> bool {
    if !self.members.remove(identity) {
      return false;
    }
    if let Some(position) = self.order.iter().position(|id| id == identity) {
      self.order.remove(position);
      self.last_removed = Some((identity.to_string(), position));
    }
    true
  }

  /// Flips membership and returns whether the identity is now wishlisted.
  pub fn toggle(&mut self, identity: &str) -> bool {
    if self.remove(identity) {
      false
    } else {
      self.insert(identity)
    }
  }

  pub fn set(&mut self, identity: &str, wishlisted: bool) {
    if wishlisted {
      self.insert(identity);
    } else {
      self.remove(identity);
    }
  }

  pub fn to_json_pretty(&self) -> Vec<u8> {
    // A list of strings always serializes.
    serde_json::to_vec_pretty(&self.order).unwrap_or_default()
  }
}

impl PartialEq for Wishlist {
  fn eq(&self, other: &Self) -> bool {
    self.order == other.order
  }
}

impl Eq for Wishlist {}

impl From<Vec<String>> for Wishlist {
  fn from(ids: Vec<String>) -> Self {
    ids.into_iter().collect()
  }
}

impl From<Wishlist> for Vec<String> {
  fn from(wishlist: Wishlist) -> Self {
    wishlist.order
  }
}

impl<S: Into<String>> FromIterator<S> for Wishlist {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut wishlist = Wishlist::new();
    for identity in iter {
      wishlist.insert(&identity.into());
    }
    wishlist.last_removed = None;
    wishlist
  }
}

/// Accepts any JSON array, keeping only its string elements. Card codes are
/// upper-cased so hand-edited files still match the catalog.
pub fn parse_wishlist_payload(body: &str) -> Result<Wishlist, WishlistError> {
  let value: serde_json::Value =
    serde_json::from_str(body).map_err(|e| WishlistError::Malformed(e.to_string()))?;
  match value {
    serde_json::Value::Array(items) => Ok(
      items
        .iter()
        .filter_map(|item| item.as_str())
        .map(canonical_identity)
        .collect(),
    ),
    other => Err(WishlistError::Malformed(format!(
      "expected an array, found {}",
      json_kind(&other)
    ))),
  }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
  match value {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}

pub trait WishlistSource: Send {
  fn fetch(&self) -> Result<String, WishlistError>;
}

/// Used when no remote wishlist URL is configured.
pub struct NoRemote;

impl WishlistSource for NoRemote {
  fn fetch(&self) -> Result<String, WishlistError> {
    Err(WishlistError::NotConfigured)
  }
}

pub struct HttpWishlistSource {
  url: String,
  client: Client,
}

impl HttpWishlistSource {
  pub fn new(url: impl Into<String>) -> Result<Self, WishlistError> {
    let client = Client::builder().build()?;
    Ok(Self {
      url: url.into(),
      client,
    })
  }
}

impl WishlistSource for HttpWishlistSource {
  fn fetch(&self) -> Result<String, WishlistError> {
    let response = self
      .client
      .get(&self.url)
      .header(USER_AGENT, concat!("card-catalog/", env!("CARGO_PKG_VERSION")))
      .header(ACCEPT, "application/json,text/plain,*/*")
      .send()?;

    if !response.status().is_success() {
      return Err(WishlistError::Status(response.status().as_u16()));
    }

    Ok(response.text()?)
  }
}

/// Remote wishlist when it can be fetched and parsed, which also replaces the
/// local copy; otherwise the local copy; otherwise nothing.
pub fn load_wishlist(
  source: &dyn WishlistSource,
  storage: &dyn KeyValueStorage,
  key: &str,
) -> Wishlist {
  match source.fetch().and_then(|body| parse_wishlist_payload(&body)) {
    Ok(wishlist) => {
      info!("Loaded {} wishlist entries from remote", wishlist.len());
      if let Err(error) = write_local(storage, key, &wishlist) {
        warn!("Could not refresh local wishlist cache: {}", error);
      }
      return wishlist;
    }
    Err(WishlistError::NotConfigured) => {}
    Err(error) => warn!("Remote wishlist unavailable, using local copy: {}", error),
  }

  match read_local(storage, key) {
    Ok(Some(wishlist)) => {
      info!("Loaded {} wishlist entries from local storage", wishlist.len());
      wishlist
    }
    Ok(None) => Wishlist::new(),
    Err(error) => {
      warn!("Local wishlist unreadable, starting empty: {}", error);
      Wishlist::new()
    }
  }
}

fn read_local(storage: &dyn KeyValueStorage, key: &str) -> Result<Option<Wishlist>, WishlistError> {
  match storage.get(key)? {
    Some(body) => parse_wishlist_payload(&body).map(Some),
    None => Ok(None),
  }
}

fn write_local(storage: &dyn KeyValueStorage, key: &str, wishlist: &Wishlist) -> Result<(), WishlistError> {
  let body = serde_json::to_string(wishlist).map_err(|e| WishlistError::Malformed(e.to_string()))?;
  storage.set(key, &body)?;
  Ok(())
}

/// Shared-secret speed-bump in front of wishlist edits. The secret ships with
/// the client, so this is not an access control.
#[derive(Clone, Debug, Default)]
pub struct EditGate {
  secret: Option<String>,
  unlocked: bool,
}

impl EditGate {
  pub fn open() -> Self {
    Self::default()
  }

  pub fn new(secret: Option<String>) -> Self {
    let secret = secret.filter(|value| !value.trim().is_empty());
    Self {
      secret,
      unlocked: false,
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.secret.is_some()
  }

  pub fn is_locked(&self) -> bool {
    self.secret.is_some() && !self.unlocked
  }

  pub fn unlock(&mut self, candidate: &str) -> bool {
    match &self.secret {
      Some(secret) if secret == candidate.trim() => {
        self.unlocked = true;
        true
      }
      Some(_) => false,
      None => true,
    }
  }

  pub fn lock(&mut self) {
    self.unlocked = false;
  }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToggleOutcome {
  Added,
  Removed,
  Locked,
  /// Blank identities are never stored.
  Ignored,
}

pub struct WishlistStore {
  wishlist: Wishlist,
  storage: Box<dyn KeyValueStorage>,
  key: String,
  gate: EditGate,
  revision: u64,
  loaded: bool,
  /// Edits made before the first load, replayed onto the loaded set.
  early_edits: Vec<(String, bool)>,
}

impl WishlistStore {
  pub fn new(storage: Box<dyn KeyValueStorage>, key: impl Into<String>, gate: EditGate) -> Self {
    Self {
      wishlist: Wishlist::new(),
      storage,
      key: key.into(),
      gate,
      revision: 0,
      loaded: false,
      early_edits: Vec::new(),
    }
  }

  pub fn load(&mut self, source: &dyn WishlistSource) {
    let loaded = load_wishlist(source, self.storage.as_ref(), &self.key);
    self.install(loaded);
  }

  /// Replaces the in-memory set with one loaded elsewhere (e.g. on a
  /// background thread). Toggles made before the first load are applied on
  /// top of it and written back; otherwise storage is left to `load_wishlist`.
  pub fn install(&mut self, wishlist: Wishlist) {
    self.wishlist = wishlist;
    let early_edits = std::mem::take(&mut self.early_edits);
    for (identity, wishlisted) in &early_edits {
      self.wishlist.set(identity, *wishlisted);
    }
    self.loaded = true;
    self.revision += 1;
    if !early_edits.is_empty() {
      info!("Replayed {} wishlist edits made before load", early_edits.len());
      self.persist();
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.loaded
  }

  pub fn toggle(&mut self, identity: &str) -> ToggleOutcome {
    if self.gate.is_locked() {
      return ToggleOutcome::Locked;
    }
    let identity = canonical_identity(identity);
    if identity.is_empty() {
      return ToggleOutcome::Ignored;
    }
    let added = self.wishlist.toggle(&identity);
    self.revision += 1;
    if self.loaded {
      self.persist();
    } else {
      self.early_edits.push((identity, added));
    }
    if added {
      ToggleOutcome::Added
    } else {
      ToggleOutcome::Removed
    }
  }

  /// Writes the set to its storage slot. Before the first load the slot still
  /// holds the saved wishlist, so nothing is written.
  pub fn persist(&self) {
    if !self.loaded {
      debug!("Wishlist not loaded yet, skipping persist");
      return;
    }
    if let Err(error) = write_local(self.storage.as_ref(), &self.key, &self.wishlist) {
      warn!("Wishlist not persisted: {}", error);
    }
  }

  pub fn export(&self) -> Vec<u8> {
    self.wishlist.to_json_pretty()
  }

  pub fn wishlist(&self) -> &Wishlist {
    &self.wishlist
  }

  pub fn contains(&self, identity: &str) -> bool {
    self.wishlist.contains(identity)
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn gate(&self) -> &EditGate {
    &self.gate
  }

  pub fn unlock(&mut self, candidate: &str) -> bool {
    self.gate.unlock(candidate)
  }

  pub fn lock(&mut self) {
    self.gate.lock();
  }

}
