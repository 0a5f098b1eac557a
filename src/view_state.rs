use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "label", rename_all = "camelCase")]
pub enum SortBucket {
  /// Every series, ordered by the sort key.
  #[default]
  Free,
  /// Only cards whose series label matches.
  Series(String),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
  /// Wishlisted first, then characters with the most wishlisted cards.
  #[default]
  Favorites,
  Name,
  Series,
  Color,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn flipped(self) -> Self {
    match self {
      SortDirection::Asc => SortDirection::Desc,
      SortDirection::Desc => SortDirection::Asc,
    }
  }
}

/// Everything a user has selected. Defaults mean "no restriction".
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
  pub character: Option<String>,
  pub color: Option<String>,
  pub bucket: SortBucket,
  pub search: String,
  pub sort_key: SortKey,
  pub direction: SortDirection,
  pub wishlist_only: bool,
  pub page: usize,
}

impl Default for ViewState {
  fn default() -> Self {
    Self {
      character: None,
      color: None,
      bucket: SortBucket::Free,
      search: String::new(),
      sort_key: SortKey::Favorites,
      direction: SortDirection::Asc,
      wishlist_only: false,
      page: 1,
    }
  }
}

/// The subset of [`ViewState`] that decides which cards match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
  pub character: Option<String>,
  pub color: Option<String>,
  pub series: Option<String>,
  pub search: String,
  pub wishlist_only: bool,
}

/// The subset of [`ViewState`] that decides the order of matching cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortCriteria {
  pub key: SortKey,
  pub direction: SortDirection,
}

impl ViewState {
  pub fn filter_criteria(&self) -> FilterCriteria {
    let series = match &self.bucket {
      SortBucket::Series(label) => Some(label.clone()),
      SortBucket::Free => None,
    };
    FilterCriteria {
      character: self.character.clone(),
      color: self.color.clone(),
      series,
      search: self.search.trim().to_lowercase(),
      wishlist_only: self.wishlist_only,
    }
  }

  pub fn sort_criteria(&self) -> SortCriteria {
    SortCriteria {
      key: self.sort_key,
      direction: self.direction,
    }
  }

  /// Applies one transition. Result-affecting changes always land on page 1.
  /// `total_pages` bounds relative and absolute navigation; out-of-range
  /// navigation leaves the state untouched.
  pub fn reduce(&self, action: &ViewAction, total_pages: usize) -> ViewState {
    let mut next = self.clone();
    match action {
      ViewAction::SetCharacter(value) => next.character = non_empty(value),
      ViewAction::SetColor(value) => next.color = non_empty(value),
      ViewAction::SetBucket(bucket) => next.bucket = bucket.clone(),
      ViewAction::SetSearch(text) => next.search = text.clone(),
      ViewAction::SetSortKey(key) => next.sort_key = *key,
      ViewAction::SetDirection(direction) => next.direction = *direction,
      ViewAction::ToggleDirection => next.direction = self.direction.flipped(),
      ViewAction::SetWishlistOnly(enabled) => next.wishlist_only = *enabled,
      ViewAction::ResetAll => return ViewState::default(),
      ViewAction::GoToPage(page) => {
        if (1..=total_pages).contains(page) {
          next.page = *page;
        }
        return next;
      }
      ViewAction::NextPage => {
        if self.page < total_pages {
          next.page = self.page + 1;
        }
        return next;
      }
      ViewAction::PrevPage => {
        if self.page > 1 {
          next.page = (self.page - 1).min(total_pages.max(1));
        }
        return next;
      }
    }
    next.page = 1;
    next
  }
}

fn non_empty(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|text| !text.is_empty())
    .map(str::to_string)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ViewAction {
  SetCharacter(Option<String>),
  SetColor(Option<String>),
  SetBucket(SortBucket),
  SetSearch(String),
  SetSortKey(SortKey),
  SetDirection(SortDirection),
  ToggleDirection,
  SetWishlistOnly(bool),
  GoToPage(usize),
  NextPage,
  PrevPage,
  ResetAll,
}

impl ViewAction {
  pub fn is_navigation(&self) -> bool {
    matches!(
      self,
      ViewAction::GoToPage(_) | ViewAction::NextPage | ViewAction::PrevPage
    )
  }
}
