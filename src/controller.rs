//! Owns the view state and derives what the frontend shows.

use crate::card::{enrich_all, CardRecord, EnrichedCard};
use crate::config::CatalogConfig;
use crate::dataset::fingerprint;
use crate::memo::Memo;
use crate::paginate::{paginate, total_pages, PageWindow};
use crate::pipeline::{character_popularity, filter_indices, filter_options, sort_indices, FilterOptions, Popularity};
use crate::storage::KeyValueStorage;
use crate::view_state::{FilterCriteria, SortCriteria, SortKey, ViewAction, ViewState};
use crate::wishlist::{EditGate, ToggleOutcome, Wishlist, WishlistSource, WishlistStore};
use chrono::Local;
use log::info;
use serde::Serialize;

/// Something the controller was asked to do.
#[derive(Clone, Debug)]
pub enum Intent {
  View(ViewAction),
  ToggleWishlist(String),
  Unlock(String),
  Lock,
  ExportWishlist,
  WishlistLoaded(Wishlist),
}

/// Side effects for the presentation layer to carry out.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
  ScrollToTop,
  PromptUnlock,
  #[serde(rename_all = "camelCase")]
  Download {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
  },
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
  #[serde(flatten)]
  pub card: EnrichedCard,
  pub wishlisted: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
  pub cards: Vec<CardView>,
  pub total_cards: usize,
  pub total_matches: usize,
  pub page: usize,
  pub total_pages: usize,
  /// `None` when everything fits on one page.
  pub pagination: Option<PageWindow>,
  pub options: FilterOptions,
  pub state: ViewState,
  pub wishlist_count: usize,
  pub gate_enabled: bool,
  pub editing_locked: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DerivationCounts {
  pub enriched: u64,
  pub options: u64,
  pub popularity: u64,
  pub filtered: u64,
  pub sorted: u64,
}

type FilterKey = (u64, u64, FilterCriteria);
type SortMemoKey = (FilterKey, u64, SortCriteria);

struct Derived<'a> {
  cards: &'a [EnrichedCard],
  order: &'a [usize],
  options: &'a FilterOptions,
  wishlist: &'a Wishlist,
}

pub struct ViewController {
  records: Vec<CardRecord>,
  dataset_fingerprint: String,
  dataset_revision: u64,
  state: ViewState,
  wishlist: WishlistStore,
  page_size: usize,
  enriched: Memo<u64, Vec<EnrichedCard>>,
  options: Memo<u64, FilterOptions>,
  popularity: Memo<(u64, u64), Popularity>,
  filtered: Memo<FilterKey, Vec<usize>>,
  sorted: Memo<SortMemoKey, Vec<usize>>,
}

impl ViewController {
  pub fn new(config: &CatalogConfig, storage: Box<dyn KeyValueStorage>) -> Self {
    let gate = EditGate::new(config.edit_secret.clone());
    Self {
      records: Vec::new(),
      dataset_fingerprint: fingerprint(&[]),
      dataset_revision: 0,
      state: ViewState::default(),
      wishlist: WishlistStore::new(storage, config.storage_key.clone(), gate),
      page_size: config.page_size.max(1),
      enriched: Memo::new("enriched cards"),
      options: Memo::new("filter options"),
      popularity: Memo::new("wishlist popularity"),
      filtered: Memo::new("filtered cards"),
      sorted: Memo::new("sorted cards"),
    }
  }

  /// Replaces the dataset. Identical content keeps every cached derivation.
  pub fn set_cards(&mut self, records: Vec<CardRecord>) {
    let next_fingerprint = fingerprint(&records);
    if next_fingerprint == self.dataset_fingerprint {
      return;
    }
    info!("Catalog dataset replaced with {} cards", records.len());
    self.records = records;
    self.dataset_fingerprint = next_fingerprint;
    self.dataset_revision += 1;
    self.state.page = 1;
  }

  /// Blocking wishlist load; the desktop shell runs `load_wishlist` on its own
  /// thread and sends the result through [`Intent::WishlistLoaded`] instead.
  pub fn load_wishlist(&mut self, source: &dyn WishlistSource) {
    self.wishlist.load(source);
  }

  pub fn apply(&mut self, intent: Intent) -> Vec<Command> {
    match intent {
      Intent::View(action) => self.dispatch(action),
      Intent::ToggleWishlist(identity) => match self.wishlist.toggle(&identity) {
        ToggleOutcome::Locked => vec![Command::PromptUnlock],
        ToggleOutcome::Added | ToggleOutcome::Removed | ToggleOutcome::Ignored => Vec::new(),
      },
      Intent::Unlock(secret) => {
        if self.wishlist.unlock(&secret) {
          Vec::new()
        } else {
          vec![Command::PromptUnlock]
        }
      }
      Intent::Lock => {
        self.wishlist.lock();
        Vec::new()
      }
      Intent::ExportWishlist => vec![Command::Download {
        file_name: format!("wishlist-{}.json", Local::now().format("%Y-%m-%d")),
        mime_type: "application/json".to_string(),
        bytes: self.wishlist.export(),
      }],
      Intent::WishlistLoaded(wishlist) => {
        self.wishlist.install(wishlist);
        Vec::new()
      }
    }
  }

  fn dispatch(&mut self, action: ViewAction) -> Vec<Command> {
    let pages = total_pages(self.results().len(), self.page_size);
    let next = self.state.reduce(&action, pages);
    let moved = action.is_navigation() && next.page != self.state.page;
    self.state = next;
    if moved {
      vec![Command::ScrollToTop]
    } else {
      Vec::new()
    }
  }

  /// Every matching card in display order.
  pub fn results(&mut self) -> Vec<&EnrichedCard> {
    let derived = self.derive();
    derived.order.iter().map(|&index| &derived.cards[index]).collect()
  }

  pub fn view(&mut self) -> CatalogView {
    let page_size = self.page_size;
    let current = self.state.page;
    let state = self.state.clone();
    let gate_enabled = self.wishlist.gate().is_enabled();
    let editing_locked = self.wishlist.gate().is_locked();

    let derived = self.derive();
    let page = paginate(derived.order, page_size, current);
    let page_cards = page
      .items
      .iter()
      .map(|&index| {
        let card = derived.cards[index].clone();
        let wishlisted = derived.wishlist.contains(&card.identity);
        CardView { card, wishlisted }
      })
      .collect();

    CatalogView {
      cards: page_cards,
      total_cards: derived.cards.len(),
      total_matches: page.total_items,
      page: current,
      total_pages: page.total_pages,
      pagination: page.controls_visible().then(|| page.window.clone()),
      options: derived.options.clone(),
      state,
      wishlist_count: derived.wishlist.len(),
      gate_enabled,
      editing_locked,
    }
  }

  fn derive(&mut self) -> Derived<'_> {
    let dataset = self.dataset_revision;
    let wishlist_revision = self.wishlist.revision();
    let filter = self.state.filter_criteria();
    let sort = self.state.sort_criteria();
    let filter_key: FilterKey = (
      dataset,
      if filter.wishlist_only { wishlist_revision } else { 0 },
      filter.clone(),
    );
    let sort_key: SortMemoKey = (
      filter_key.clone(),
      if sort.key == SortKey::Favorites { wishlist_revision } else { 0 },
      sort,
    );

    let records = &self.records;
    let wishlist = self.wishlist.wishlist();
    let cards = self.enriched.get_or_compute(dataset, || enrich_all(records));
    let options = self.options.get_or_compute(dataset, || filter_options(cards));
    let popularity = self
      .popularity
      .get_or_compute((dataset, wishlist_revision), || character_popularity(cards, wishlist));
    let filtered = self
      .filtered
      .get_or_compute(filter_key, || filter_indices(cards, &filter, wishlist));
    let order = self
      .sorted
      .get_or_compute(sort_key, || sort_indices(cards, filtered.clone(), sort, wishlist, popularity));

    Derived {
      cards: cards.as_slice(),
      order: order.as_slice(),
      options,
      wishlist,
    }
  }

  pub fn state(&self) -> &ViewState {
    &self.state
  }

  pub fn wishlist(&self) -> &Wishlist {
    self.wishlist.wishlist()
  }

  pub fn derivation_counts(&self) -> DerivationCounts {
    DerivationCounts {
      enriched: self.enriched.computations(),
      options: self.options.computations(),
      popularity: self.popularity.computations(),
      filtered: self.filtered.computations(),
      sorted: self.sorted.computations(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStorage;
  use crate::view_state::SortDirection;

  fn controller() -> ViewController {
    ViewController::new(&CatalogConfig::default(), Box::new(MemoryStorage::new()))
  }

  fn records(count: usize) -> Vec<CardRecord> {
    (0..count)
      .map(|index| {
        CardRecord::new(
          format!("Pirate {}", index % 7),
          if index % 2 == 0 { "Red" } else { "Blue" },
          format!("https://example.org/cards/OP{:02}-{:03}.png", index / 100 + 1, index % 100),
        )
      })
      .collect()
  }

  #[test]
  fn view_pages_through_results() {
    let mut controller = controller();
    controller.set_cards(records(250));

    let first = controller.view();
    assert_eq!(first.total_matches, 250);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.cards.len(), 100);
    assert_eq!(first.pagination.as_ref().map(|window| window.pages.clone()), Some(vec![1, 2, 3]));

    assert_eq!(controller.apply(Intent::View(ViewAction::GoToPage(3))), vec![Command::ScrollToTop]);
    assert_eq!(controller.view().cards.len(), 50);
    assert!(controller.apply(Intent::View(ViewAction::NextPage)).is_empty());
    assert_eq!(controller.state().page, 3);
  }

  #[test]
  fn criteria_change_returns_to_first_page() {
    let mut controller = controller();
    controller.set_cards(records(250));
    controller.apply(Intent::View(ViewAction::GoToPage(2)));
    let commands = controller.apply(Intent::View(ViewAction::SetColor(Some("Red".to_string()))));
    assert!(commands.is_empty());
    let view = controller.view();
    assert_eq!(view.page, 1);
    assert_eq!(view.total_matches, 125);
    assert!(view.cards.iter().all(|card| card.card.color == "Red"));
  }

  #[test]
  fn memoized_derivations_skip_unrelated_work() {
    let mut controller = controller();
    controller.set_cards(records(30));
    controller.view();
    controller.view();
    assert_eq!(
      controller.derivation_counts(),
      DerivationCounts {
        enriched: 1,
        options: 1,
        popularity: 1,
        filtered: 1,
        sorted: 1,
      }
    );

    controller.apply(Intent::View(ViewAction::SetSortKey(SortKey::Name)));
    controller.view();
    let counts = controller.derivation_counts();
    assert_eq!((counts.enriched, counts.filtered, counts.sorted), (1, 1, 2));

    // Name sort ignores the wishlist, so toggling only refreshes popularity.
    controller.apply(Intent::ToggleWishlist("OP01-001".to_string()));
    controller.view();
    let counts = controller.derivation_counts();
    assert_eq!((counts.filtered, counts.sorted, counts.popularity), (1, 2, 2));

    controller.set_cards(records(30));
    controller.view();
    assert_eq!(controller.derivation_counts().enriched, 1);

    controller.set_cards(records(31));
    controller.view();
    assert_eq!(controller.derivation_counts().enriched, 2);
  }

  #[test]
  fn toggle_keeps_view_state_but_moves_card() {
    let mut controller = controller();
    controller.set_cards(records(5));
    let before = controller.state().clone();

    controller.apply(Intent::ToggleWishlist("OP01-004".to_string()));
    assert_eq!(controller.state(), &before);

    let view = controller.view();
    assert_eq!(view.cards[0].card.identity, "OP01-004");
    assert!(view.cards[0].wishlisted);
    assert_eq!(view.wishlist_count, 1);
  }

  #[test]
  fn locked_gate_prompts_instead_of_toggling() {
    let config = CatalogConfig {
      edit_secret: Some("gomu-gomu".to_string()),
      ..CatalogConfig::default()
    };
    let mut controller = ViewController::new(&config, Box::new(MemoryStorage::new()));
    controller.set_cards(records(3));

    assert_eq!(
      controller.apply(Intent::ToggleWishlist("OP01-000".to_string())),
      vec![Command::PromptUnlock]
    );
    assert!(controller.wishlist().is_empty());
    assert!(controller.view().editing_locked);

    assert_eq!(controller.apply(Intent::Unlock("nope".to_string())), vec![Command::PromptUnlock]);
    assert!(controller.apply(Intent::Unlock("gomu-gomu".to_string())).is_empty());
    assert!(controller.apply(Intent::ToggleWishlist("OP01-000".to_string())).is_empty());
    assert!(controller.wishlist().contains("OP01-000"));

    controller.apply(Intent::Lock);
    assert!(controller.view().editing_locked);
  }

  #[test]
  fn export_downloads_json_array() {
    let mut controller = controller();
    controller.apply(Intent::WishlistLoaded(vec!["OP01-002".to_string()].into()));
    let commands = controller.apply(Intent::ExportWishlist);
    match commands.as_slice() {
      [Command::Download { file_name, mime_type, bytes }] => {
        assert!(file_name.starts_with("wishlist-") && file_name.ends_with(".json"));
        assert_eq!(mime_type, "application/json");
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "[\n  \"OP01-002\"\n]");
      }
      other => panic!("unexpected commands: {:?}", other),
    }
  }

  #[test]
  fn reset_all_clears_everything() {
    let mut controller = controller();
    controller.set_cards(records(250));
    for action in [
      ViewAction::SetSearch("pirate 3".to_string()),
      ViewAction::SetSortKey(SortKey::Color),
      ViewAction::SetDirection(SortDirection::Desc),
      ViewAction::SetWishlistOnly(true),
    ] {
      controller.apply(Intent::View(action));
    }
    assert_eq!(controller.view().total_matches, 0);

    controller.apply(Intent::View(ViewAction::ResetAll));
    assert_eq!(controller.state(), &ViewState::default());
    assert_eq!(controller.view().total_matches, 250);
  }

  #[test]
  fn empty_catalog_has_no_pagination() {
    let mut controller = controller();
    let view = controller.view();
    assert!(view.cards.is_empty());
    assert_eq!(view.total_pages, 0);
    assert_eq!(view.pagination, None);
  }
}
