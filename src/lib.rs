/// Undo Close Tab - browser extension for restoring recently closed tabs
/// Built with Rust + WASM

pub mod background;
pub mod bridge;
pub mod dispatch;
pub mod menu;
pub mod reconcile;
pub mod storage;
pub mod tab_data;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Entry point for the background page: probes the platform, registers all
// event listeners and runs the startup migration.
#[wasm_bindgen]
pub async fn start_background() {
    background::boot().await;
}

// Effective preferences (defaults, stored values and managed overrides
// resolved), for the options page.
#[wasm_bindgen]
pub async fn get_preferences() -> Result<JsValue, JsValue> {
    let prefs = background::load_prefs().await;
    serde_wasm_bindgen::to_value(&prefs).map_err(|e| JsValue::from_str(&e.to_string()))
}

// Persist a partial preference update.
#[wasm_bindgen]
pub async fn set_preferences(values: JsValue) -> Result<(), JsValue> {
    bridge::storageLocalSet(values).await?;
    Ok(())
}

// Drop stored preference keys, reverting them to their defaults.
#[wasm_bindgen]
pub async fn remove_preferences(keys: JsValue) -> Result<(), JsValue> {
    bridge::storageLocalRemove(keys).await?;
    Ok(())
}
