/// JS bridge to the WebExtension APIs (see background.js)

use js_sys::Function;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/background.js")]
extern "C" {
    // Capability probes, resolved once at startup
    pub fn hasSessions() -> bool;
    pub fn hasWindows() -> bool;
    pub fn hasMenus() -> bool;
    pub fn menuTopLevelLimit() -> u32;

    // Session history
    #[wasm_bindgen(catch)]
    pub async fn sessionsGetRecentlyClosed() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn sessionsRestore(session_id: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn sessionsForgetTab(window_id: i32, session_id: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn sessionsForgetWindow(session_id: &str) -> Result<JsValue, JsValue>;

    // Windows
    #[wasm_bindgen(catch)]
    pub async fn windowsGetCurrent() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn windowsFocus(window_id: i32) -> Result<JsValue, JsValue>;

    // Tabs
    #[wasm_bindgen(catch)]
    pub async fn tabsCreate(url: &str) -> Result<JsValue, JsValue>;

    // Menus
    #[wasm_bindgen(catch)]
    pub async fn menusRemoveAll() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn menusCreate(item: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn menusRefresh() -> Result<JsValue, JsValue>;

    // Preference persistence
    #[wasm_bindgen(catch)]
    pub async fn storageLocalGet() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn storageLocalSet(values: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn storageLocalRemove(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn storageManagedGet() -> Result<JsValue, JsValue>;

    // Listener registration
    pub fn onSessionsChanged(callback: &Function);
    pub fn onWindowFocusChanged(callback: &Function);
    pub fn onMenuShown(callback: &Function);
    pub fn onMenuClicked(callback: &Function);
    pub fn onToolbarClicked(callback: &Function);
    pub fn onTabRemoved(callback: &Function);
    pub fn onTabUpdated(callback: &Function);
}
