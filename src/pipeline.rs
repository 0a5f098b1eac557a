//! Filtering, ordering and dropdown options over enriched cards.

use crate::card::{EnrichedCard, UNKNOWN_SERIES};
use crate::natural::natural_cmp;
use crate::view_state::{FilterCriteria, SortCriteria, SortDirection, SortKey, ViewState};
use crate::wishlist::Wishlist;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Wishlisted identities per normalized character.
pub type Popularity = BTreeMap<String, usize>;

pub fn apply<'a>(cards: &'a [EnrichedCard], state: &ViewState, wishlist: &Wishlist) -> Vec<&'a EnrichedCard> {
  let filtered = filter_indices(cards, &state.filter_criteria(), wishlist);
  let popularity = character_popularity(cards, wishlist);
  sort_indices(cards, filtered, state.sort_criteria(), wishlist, &popularity)
    .into_iter()
    .map(|index| &cards[index])
    .collect()
}

pub fn matches(card: &EnrichedCard, criteria: &FilterCriteria, wishlist: &Wishlist) -> bool {
  if let Some(character) = &criteria.character {
    if card.normalized_character != *character {
      return false;
    }
  }
  if let Some(color) = &criteria.color {
    if card.color != *color {
      return false;
    }
  }
  if let Some(series) = &criteria.series {
    if card.series_label != *series {
      return false;
    }
  }
  if criteria.wishlist_only && !wishlist.contains(&card.identity) {
    return false;
  }
  let needle = criteria.search.trim().to_lowercase();
  if !needle.is_empty()
    && !card.character.to_lowercase().contains(&needle)
    && !card.card_code.to_lowercase().contains(&needle)
  {
    return false;
  }
  true
}

/// Positions of matching cards, in input order.
pub fn filter_indices(cards: &[EnrichedCard], criteria: &FilterCriteria, wishlist: &Wishlist) -> Vec<usize> {
  cards
    .iter()
    .enumerate()
    .filter(|(_, card)| matches(card, criteria, wishlist))
    .map(|(index, _)| index)
    .collect()
}

pub fn character_popularity(cards: &[EnrichedCard], wishlist: &Wishlist) -> Popularity {
  let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
  let mut counts = Popularity::new();
  for card in cards.iter().filter(|card| wishlist.contains(&card.identity)) {
    if seen.insert((card.normalized_character.as_str(), card.identity.as_str())) {
      *counts.entry(card.normalized_character.clone()).or_insert(0) += 1;
    }
  }
  counts
}

/// Orders `indices` into `cards`. Ties always fall through to the picture URL
/// and finally to input position, so the result is fully determined.
pub fn sort_indices(
  cards: &[EnrichedCard],
  mut indices: Vec<usize>,
  criteria: SortCriteria,
  wishlist: &Wishlist,
  popularity: &Popularity,
) -> Vec<usize> {
  indices.sort_by(|&left, &right| {
    let a = &cards[left];
    let b = &cards[right];
    let primary = match criteria.key {
      SortKey::Favorites => favorites_first(a, b, wishlist, popularity),
      key => {
        let ordering = field_order(a, b, key);
        match criteria.direction {
          SortDirection::Asc => ordering,
          SortDirection::Desc => ordering.reverse(),
        }
      }
    };
    primary
      .then_with(|| natural_cmp(&a.picture_url, &b.picture_url))
      .then_with(|| a.picture_url.cmp(&b.picture_url))
      .then_with(|| left.cmp(&right))
  });
  indices
}

fn favorites_first(a: &EnrichedCard, b: &EnrichedCard, wishlist: &Wishlist, popularity: &Popularity) -> Ordering {
  let count = |card: &EnrichedCard| popularity.get(&card.normalized_character).copied().unwrap_or(0);
  wishlist
    .contains(&b.identity)
    .cmp(&wishlist.contains(&a.identity))
    .then_with(|| count(b).cmp(&count(a)))
    .then_with(|| natural_cmp(&a.normalized_character, &b.normalized_character))
    .then_with(|| natural_cmp(&a.card_code, &b.card_code))
}

fn field_order(a: &EnrichedCard, b: &EnrichedCard, key: SortKey) -> Ordering {
  match key {
    SortKey::Name | SortKey::Favorites => natural_cmp(&a.normalized_character, &b.normalized_character)
      .then_with(|| natural_cmp(&a.card_code, &b.card_code)),
    SortKey::Series => series_order(&a.series_label, &b.series_label)
      .then_with(|| natural_cmp(&a.card_code, &b.card_code))
      .then_with(|| natural_cmp(&a.normalized_character, &b.normalized_character)),
    SortKey::Color => natural_cmp(&a.color, &b.color)
      .then_with(|| natural_cmp(&a.normalized_character, &b.normalized_character))
      .then_with(|| natural_cmp(&a.card_code, &b.card_code)),
  }
}

// "Unknown" goes after every real series.
fn series_order(a: &str, b: &str) -> Ordering {
  (a == UNKNOWN_SERIES)
    .cmp(&(b == UNKNOWN_SERIES))
    .then_with(|| natural_cmp(a, b))
}

/// Distinct values for the filter dropdowns.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
  pub characters: Vec<String>,
  pub colors: Vec<String>,
  pub series: Vec<String>,
}

pub fn filter_options(cards: &[EnrichedCard]) -> FilterOptions {
  FilterOptions {
    characters: distinct_sorted(cards.iter().map(|card| card.normalized_character.as_str()), natural_cmp),
    colors: distinct_sorted(cards.iter().map(|card| card.color.as_str()), natural_cmp),
    series: distinct_sorted(cards.iter().map(|card| card.series_label.as_str()), series_order),
  }
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>, order: fn(&str, &str) -> Ordering) -> Vec<String> {
  let mut distinct: Vec<String> = values
    .filter(|value| !value.is_empty())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .map(str::to_string)
    .collect();
  distinct.sort_by(|a, b| order(a, b).then_with(|| a.cmp(b)));
  distinct
}
