use crate::card::CardRecord;
use crate::config::{CatalogConfig, CONFIG_FILE};
use crate::controller::{CatalogView, Command, Intent, ViewController};
use crate::dataset::load_cards;
use crate::storage::SqliteStorage;
use crate::view_state::ViewAction;
use crate::wishlist::{load_wishlist, HttpWishlistSource, NoRemote, WishlistSource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tauri::{AppHandle, Emitter, Manager, State};

const DATABASE_FILE: &str = "catalog.db";
const WISHLIST_LOADED_EVENT: &str = "wishlist-loaded";

struct AppState {
  controller: Mutex<ViewController>,
  config_dir: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchResultDto {
  view: CatalogView,
  commands: Vec<Command>,
}

fn lock_controller<'a>(state: &'a State<'_, AppState>) -> Result<MutexGuard<'a, ViewController>, String> {
  state
    .controller
    .lock()
    .map_err(|_| "Catalog state is unavailable.".to_string())
}

fn apply_intent(state: &State<'_, AppState>, intent: Intent) -> Result<DispatchResultDto, String> {
  let mut controller = lock_controller(state)?;
  let commands = controller.apply(intent);
  Ok(DispatchResultDto {
    view: controller.view(),
    commands,
  })
}

#[tauri::command]
fn get_catalog_view(state: State<'_, AppState>) -> Result<CatalogView, String> {
  Ok(lock_controller(&state)?.view())
}

#[tauri::command]
fn set_cards(state: State<'_, AppState>, records: Vec<CardRecord>) -> Result<CatalogView, String> {
  let mut controller = lock_controller(&state)?;
  controller.set_cards(records);
  Ok(controller.view())
}

#[tauri::command]
fn load_cards_file(state: State<'_, AppState>, path: String) -> Result<CatalogView, String> {
  let trimmed = path.trim();
  if trimmed.is_empty() {
    return Err("Dataset path is required.".to_string());
  }
  let resolved = state.config_dir.join(trimmed);
  let records = load_cards(&resolved).map_err(|e| e.to_string())?;
  let mut controller = lock_controller(&state)?;
  controller.set_cards(records);
  Ok(controller.view())
}

#[tauri::command]
fn dispatch_view_action(state: State<'_, AppState>, action: ViewAction) -> Result<DispatchResultDto, String> {
  apply_intent(&state, Intent::View(action))
}

#[tauri::command]
fn toggle_wishlist(state: State<'_, AppState>, identity: String) -> Result<DispatchResultDto, String> {
  let identity = identity.trim().to_string();
  if identity.is_empty() {
    return Err("Card identity is required.".to_string());
  }
  apply_intent(&state, Intent::ToggleWishlist(identity))
}

#[tauri::command]
fn unlock_wishlist(state: State<'_, AppState>, secret: String) -> Result<DispatchResultDto, String> {
  apply_intent(&state, Intent::Unlock(secret))
}

#[tauri::command]
fn lock_wishlist(state: State<'_, AppState>) -> Result<DispatchResultDto, String> {
  apply_intent(&state, Intent::Lock)
}

#[tauri::command]
fn export_wishlist(state: State<'_, AppState>) -> Result<DispatchResultDto, String> {
  apply_intent(&state, Intent::ExportWishlist)
}

fn wishlist_source(config: &CatalogConfig) -> Box<dyn WishlistSource> {
  match config.wishlist_url.as_deref() {
    Some(url) => match HttpWishlistSource::new(url) {
      Ok(source) => Box::new(source),
      Err(error) => {
        log::warn!("Remote wishlist disabled: {}", error);
        Box::new(NoRemote)
      }
    },
    None => Box::new(NoRemote),
  }
}

/// One-shot startup load. The view shows an empty wishlist until it lands.
fn spawn_wishlist_load(app: AppHandle, config: CatalogConfig, storage: SqliteStorage) {
  std::thread::spawn(move || {
    let source = wishlist_source(&config);
    let wishlist = load_wishlist(source.as_ref(), &storage, &config.storage_key);

    let state = app.state::<AppState>();
    let view = match state.controller.lock() {
      Ok(mut controller) => {
        controller.apply(Intent::WishlistLoaded(wishlist));
        controller.view()
      }
      Err(_) => return,
    };
    if let Err(error) = app.emit(WISHLIST_LOADED_EVENT, view) {
      log::warn!("Could not notify frontend of wishlist load: {}", error);
    }
  });
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  tauri::Builder::default()
    .setup(|app| {
      if cfg!(debug_assertions) {
        app.handle().plugin(
          tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
        )?;
      }

      let config_dir = app.path().app_config_dir()?;
      let app_data_dir = app.path().app_data_dir()?;
      let config = CatalogConfig::load_or_default(&config_dir.join(CONFIG_FILE));

      let storage = SqliteStorage::open(app_data_dir.join(DATABASE_FILE))
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::Other, error.to_string()))?;
      let mut controller = ViewController::new(&config, Box::new(storage.clone()));

      if let Some(dataset_path) = &config.dataset_path {
        match load_cards(&config_dir.join(dataset_path)) {
          Ok(records) => controller.set_cards(records),
          Err(error) => log::warn!("Starting with an empty catalog: {}", error),
        }
      }

      app.manage(AppState {
        controller: Mutex::new(controller),
        config_dir,
      });
      spawn_wishlist_load(app.handle().clone(), config, storage);
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      get_catalog_view,
      set_cards,
      load_cards_file,
      dispatch_view_action,
      toggle_wishlist,
      unlock_wishlist,
      lock_wishlist,
      export_wishlist
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
