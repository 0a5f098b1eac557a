//! Catalog view engine for the One Piece card game index.
//!
//! Cards are enriched with their code, series and wishlist identity, filtered
//! and ordered from a [`ViewState`], then paginated. The wishlist loads from a
//! remote JSON file with a local SQLite fallback and persists after every
//! change. With the `desktop` feature the engine runs inside a Tauri shell.

pub mod card;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod memo;
pub mod natural;
pub mod paginate;
pub mod pipeline;
pub mod storage;
pub mod view_state;
pub mod wishlist;

#[cfg(feature = "desktop")]
mod desktop;

pub use card::{enrich, enrich_all, CardRecord, EnrichedCard};
pub use config::{CatalogConfig, ConfigError};
pub use controller::{CardView, CatalogView, Command, Intent, ViewController};
pub use dataset::{load_cards, DatasetError};
pub use paginate::{paginate, total_pages, Page, PageWindow};
pub use pipeline::{apply, filter_options, FilterOptions};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
pub use view_state::{SortBucket, SortDirection, SortKey, ViewAction, ViewState};
pub use wishlist::{
  load_wishlist, EditGate, HttpWishlistSource, NoRemote, Wishlist, WishlistError, WishlistSource, WishlistStore,
};

#[cfg(feature = "desktop")]
pub use desktop::run;
