/// Background service: platform probing, event wiring and restore logic

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::join_all;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::console;

use crate::bridge;
use crate::dispatch::{self, MenuAction};
use crate::menu;
use crate::reconcile;
use crate::storage::{self, Prefs};
use crate::tab_data::{ClosedTab, FallbackList, INTERNAL_PREFIX};

/// Which feature set the platform supports, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Platform {
    /// Sessions, windows and menus APIs are available.
    Full,
    /// No sessions API (Android). Closed tabs are tracked manually and no
    /// menus are built.
    Reduced,
}

#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub sessions: bool,
    pub windows: bool,
    pub menus: bool,
}

impl Capabilities {
    fn probe() -> Self {
        Capabilities {
            sessions: bridge::hasSessions(),
            windows: bridge::hasWindows(),
            menus: bridge::hasMenus(),
        }
    }

    pub fn platform(&self) -> Platform {
        if self.sessions {
            Platform::Full
        } else {
            Platform::Reduced
        }
    }
}

/// One entry of the raw session history: either a closed tab or a closed
/// window, stamped with its close time.
#[derive(Debug, Deserialize)]
struct SessionEntry {
    #[serde(default)]
    tab: Option<ClosedTab>,
    #[serde(default)]
    window: Option<SessionWindow>,
    #[serde(rename = "lastModified", default)]
    last_modified: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SessionWindow {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct BrowserWindow {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct RestoredSession {
    #[serde(default)]
    tab: Option<RestoredTab>,
}

#[derive(Debug, Deserialize)]
struct RestoredTab {
    #[serde(rename = "windowId", default)]
    window_id: Option<i32>,
}

/// Flatten session entries into closed-tab records, stamping each tab with
/// the entry's close time.
fn closed_tabs_from_sessions(entries: Vec<SessionEntry>) -> Vec<ClosedTab> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let mut tab = entry.tab?;
            tab.close_time = entry.last_modified;
            Some(tab)
        })
        .collect()
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Log a platform error. The raw value also goes to the browser console so
/// the raw JS error object stays inspectable.
fn log_js_error(context: &str, error: &JsValue) {
    warn!("{} failed: {:?}", context, error);
    console::error_2(&JsValue::from_str(context), error);
}

fn json_map(value: JsValue, context: &str) -> Map<String, Value> {
    match serde_wasm_bindgen::from_value(value) {
        Ok(map) => map,
        Err(e) => {
            warn!("{} returned an unexpected shape: {}", context, e);
            Map::new()
        }
    }
}

/// Read the effective preferences. An unreadable managed store is logged
/// and ignored; the rest of the overlay happens in `storage::resolve`.
pub(crate) async fn load_prefs() -> Prefs {
    let stored = match bridge::storageLocalGet().await {
        Ok(value) => json_map(value, "storage.local.get"),
        Err(e) => {
            log_js_error("storage.local.get", &e);
            Map::new()
        }
    };
    let managed = match bridge::storageManagedGet().await {
        Ok(value) => json_map(value, "storage.managed.get"),
        Err(e) => {
            // Browsers without a managed-storage manifest reject the call;
            // that is the normal case, not worth a log entry.
            let message = e
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
                .unwrap_or_default();
            if message != "Managed storage manifest not found" {
                log_js_error("storage.managed.get", &e);
            }
            Map::new()
        }
    };
    storage::resolve(stored, managed)
}

/// Owns all mutable extension state for the process lifetime. Constructed
/// once at startup and handed to the event listeners via `Rc`.
pub struct Background {
    caps: Capabilities,
    fallback: RefCell<FallbackList>,
    /// Last known URL per open tab, feeding the fallback list on close.
    tab_urls: RefCell<HashMap<i32, String>>,
    /// Menu rebuild generation. A rebuild that loses this race abandons
    /// its remaining side effects.
    menu_generation: Cell<u64>,
}

impl Background {
    pub fn new(caps: Capabilities) -> Rc<Self> {
        Rc::new(Background {
            caps,
            fallback: RefCell::new(FallbackList::new()),
            tab_urls: RefCell::new(HashMap::new()),
            menu_generation: Cell::new(0),
        })
    }

    async fn native_sessions(&self) -> Vec<SessionEntry> {
        if !self.caps.sessions {
            return Vec::new();
        }
        match bridge::sessionsGetRecentlyClosed().await {
            Ok(value) => match serde_wasm_bindgen::from_value(value) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("sessions.getRecentlyClosed returned an unexpected shape: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                log_js_error("sessions.getRecentlyClosed", &e);
                Vec::new()
            }
        }
    }

    async fn current_window_id(&self) -> Option<i32> {
        if !self.caps.windows {
            return None;
        }
        match bridge::windowsGetCurrent().await {
            Ok(value) => match serde_wasm_bindgen::from_value::<BrowserWindow>(value) {
                Ok(window) => Some(window.id),
                Err(e) => {
                    warn!("windows.getCurrent returned an unexpected shape: {}", e);
                    None
                }
            },
            Err(e) => {
                log_js_error("windows.getCurrent", &e);
                None
            }
        }
    }

    /// Ordered view over both closed-tab sources: session history first,
    /// then the fallback list, window-filtered on request, stripped of
    /// untitled entries and cut down to `max`. The result goes stale as
    /// soon as another tab closes, so callers fetch it per operation.
    pub async fn recently_closed(&self, max: Option<usize>, only_current: bool) -> Vec<ClosedTab> {
        let native = closed_tabs_from_sessions(self.native_sessions().await);
        let mut tabs = reconcile::merge(native, self.fallback.borrow().snapshot());

        if only_current {
            if let Some(window_id) = self.current_window_id().await {
                tabs = reconcile::only_window(tabs, window_id);
            }
        }

        reconcile::truncate(reconcile::drop_untitled(tabs), max)
    }

    /// Restore one closed tab. Fallback entries reopen as a fresh tab in
    /// the current window; session entries go through the session manager,
    /// which may restore into another window that then gets focused.
    pub async fn restore(&self, session_id: &str) {
        if session_id.starts_with(INTERNAL_PREFIX) {
            let taken = self.fallback.borrow_mut().take(session_id);
            // A miss means a double click raced the first removal.
            let Some(tab) = taken else { return };
            if let Err(e) = bridge::tabsCreate(&tab.url).await {
                log_js_error("tabs.create", &e);
            }
            return;
        }

        match bridge::sessionsRestore(session_id).await {
            Ok(value) => self.focus_restored_window(value).await,
            Err(e) => log_js_error("sessions.restore", &e),
        }
    }

    async fn focus_restored_window(&self, restored: JsValue) {
        let session: RestoredSession = match serde_wasm_bindgen::from_value(restored) {
            Ok(session) => session,
            Err(e) => {
                warn!("sessions.restore returned an unexpected shape: {}", e);
                return;
            }
        };
        let Some(window_id) = session.tab.and_then(|tab| tab.window_id) else {
            return;
        };
        if let Some(current) = self.current_window_id().await {
            if current != window_id {
                if let Err(e) = bridge::windowsFocus(window_id).await {
                    log_js_error("windows.update", &e);
                }
            }
        }
    }

    /// Restore the most recent tab, plus the run of tabs closed in quick
    /// succession with it when grouped restore is enabled.
    pub async fn quick_restore(&self) {
        let prefs = load_prefs().await;
        let tabs = self.recently_closed(None, prefs.only_current).await;
        let Some(head) = tabs.first() else { return };

        self.restore(&head.session_id).await;

        if prefs.restore_group {
            let window_ms = f64::from(prefs.group_time) * 1000.0;
            let extra = reconcile::grouped_run(&tabs, window_ms);
            for tab in tabs.iter().skip(1).take(extra) {
                self.restore(&tab.session_id).await;
            }
        }
    }

    /// Empty the fallback list and forget every session-history entry,
    /// optionally limited to the current window. The forget requests are
    /// launched together and jointly awaited; one failing does not cancel
    /// the others.
    pub async fn clear_list(&self, only_current: bool) {
        self.fallback.borrow_mut().clear();

        if !self.caps.sessions {
            return;
        }

        let mut tabs = closed_tabs_from_sessions(self.native_sessions().await);
        if only_current {
            if let Some(window_id) = self.current_window_id().await {
                tabs = reconcile::only_window(tabs, window_id);
            }
        }

        let forgets = tabs.iter().filter_map(|tab| {
            let window_id = tab.window_id?;
            Some(bridge::sessionsForgetTab(window_id, &tab.session_id))
        });
        for result in join_all(forgets).await {
            if let Err(e) = result {
                log_js_error("sessions.forgetClosedTab", &e);
            }
        }
    }

    /// One-time startup migration, gated on the sessions API being present.
    /// Old session entries get duplicated ids after a browser restart
    /// (https://bugzil.la/1538119), so every HTTP(S) entry moves into the
    /// fallback list under a fresh id and the whole session history is
    /// purged. Forgetting windows as well as tabs resets the browser's
    /// internal session counter; that is observed collaborator behavior we
    /// rely on but cannot verify here.
    pub async fn migrate_session_history(&self) {
        let sessions = self.native_sessions().await;

        {
            let mut fallback = self.fallback.borrow_mut();
            for entry in &sessions {
                if let Some(tab) = &entry.tab {
                    if is_http_url(&tab.url) {
                        fallback.adopt(tab.title.clone(), tab.fav_icon_url.clone(), tab.url.clone());
                    }
                }
            }
        }

        let forgets = sessions.iter().map(|entry| async move {
            if let Some(tab) = &entry.tab {
                if let Some(window_id) = tab.window_id {
                    return bridge::sessionsForgetTab(window_id, &tab.session_id).await;
                }
                Ok(JsValue::UNDEFINED)
            } else if let Some(window) = &entry.window {
                bridge::sessionsForgetWindow(&window.session_id).await
            } else {
                Ok(JsValue::UNDEFINED)
            }
        });
        for result in join_all(forgets).await {
            if let Err(e) = result {
                log_js_error("sessions.forget", &e);
            }
        }

        info!(
            "migrated {} session entries into the fallback list",
            self.fallback.borrow().len()
        );
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.menu_generation.get() != generation
    }

    /// Rebuild all menu trees from scratch. Guarded by a generation token:
    /// a rebuild superseded while suspended commits nothing further, so the
    /// live menu only ever reflects the most recently started rebuild.
    pub async fn rebuild_menus(&self) {
        if !self.caps.menus {
            return;
        }

        let generation = self.menu_generation.get() + 1;
        self.menu_generation.set(generation);

        if let Err(e) = bridge::menusRemoveAll().await {
            log_js_error("menus.removeAll", &e);
        }
        if self.is_stale(generation) {
            return;
        }

        let prefs = load_prefs().await;
        if self.is_stale(generation) {
            return;
        }

        let tabs = self
            .recently_closed(Some(prefs.show_number as usize), prefs.only_current)
            .await;
        if self.is_stale(generation) {
            return;
        }

        let limit = bridge::menuTopLevelLimit() as usize;
        for item in menu::project(&tabs, &prefs, limit) {
            let props = match serde_wasm_bindgen::to_value(&item) {
                Ok(props) => props,
                Err(e) => {
                    warn!("could not serialize menu item {}: {}", item.id, e);
                    continue;
                }
            };
            if let Err(e) = bridge::menusCreate(props).await {
                log_js_error("menus.create", &e);
            }
            if self.is_stale(generation) {
                return;
            }
        }

        if let Err(e) = bridge::menusRefresh().await {
            log_js_error("menus.refresh", &e);
        }
    }

    async fn menu_clicked(&self, id: &str) {
        match dispatch::parse_menu_id(id) {
            Some(MenuAction::QuickRestore) => self.quick_restore().await,
            Some(MenuAction::ClearList) => {
                let prefs = load_prefs().await;
                self.clear_list(prefs.only_current).await;
            }
            Some(MenuAction::Restore(session_id)) => self.restore(&session_id).await,
            None => warn!("click on unhandled menu id \"{}\"", id),
        }
    }

    /// Tab-updated notification (reduced platform): remember the tab's
    /// latest URL so it can be promoted on close.
    pub fn note_tab_url(&self, tab_id: i32, url: String) {
        self.tab_urls.borrow_mut().insert(tab_id, url);
    }

    /// Tab-removed notification (reduced platform): promote the cached URL
    /// into the fallback list.
    pub fn track_closed_tab(&self, tab_id: i32) {
        if let Some(url) = self.tab_urls.borrow_mut().remove(&tab_id) {
            self.fallback.borrow_mut().record(url);
        }
    }
}

fn register_rebuild_listener(bg: &Rc<Background>, register: fn(&js_sys::Function)) {
    let bg = Rc::clone(bg);
    let closure = Closure::<dyn FnMut()>::new(move || {
        let bg = Rc::clone(&bg);
        spawn_local(async move {
            bg.rebuild_menus().await;
        });
    });
    register(closure.as_ref().unchecked_ref());
    // Listeners live for the whole process
    closure.forget();
}

fn register_full_platform(bg: &Rc<Background>) {
    register_rebuild_listener(bg, bridge::onSessionsChanged);
    register_rebuild_listener(bg, bridge::onWindowFocusChanged);
    register_rebuild_listener(bg, bridge::onMenuShown);

    {
        let bg = Rc::clone(bg);
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |info: JsValue| {
            let id = js_sys::Reflect::get(&info, &JsValue::from_str("menuItemId"))
                .ok()
                .and_then(|v| v.as_string());
            let Some(id) = id else {
                warn!("menu click without a string menuItemId");
                return;
            };
            let bg = Rc::clone(&bg);
            spawn_local(async move {
                bg.menu_clicked(&id).await;
            });
        });
        bridge::onMenuClicked(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn register_reduced_platform(bg: &Rc<Background>) {
    {
        let bg = Rc::clone(bg);
        let closure = Closure::<dyn FnMut(i32, JsValue)>::new(move |tab_id: i32, url: JsValue| {
            if let Some(url) = url.as_string() {
                bg.note_tab_url(tab_id, url);
            }
        });
        bridge::onTabUpdated(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    {
        let bg = Rc::clone(bg);
        let closure = Closure::<dyn FnMut(i32)>::new(move |tab_id: i32| {
            bg.track_closed_tab(tab_id);
        });
        bridge::onTabRemoved(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn register_toolbar(bg: &Rc<Background>) {
    let bg = Rc::clone(bg);
    let closure = Closure::<dyn FnMut()>::new(move || {
        let bg = Rc::clone(&bg);
        spawn_local(async move {
            bg.quick_restore().await;
        });
    });
    bridge::onToolbarClicked(closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Probe the platform, wire up all listeners and run the startup work.
pub async fn boot() {
    let caps = Capabilities::probe();
    let bg = Background::new(caps);
    info!("starting on {:?} platform", caps.platform());

    register_toolbar(&bg);
    match caps.platform() {
        Platform::Full => {
            register_full_platform(&bg);
            bg.migrate_session_history().await;
            bg.rebuild_menus().await;
        }
        Platform::Reduced => register_reduced_platform(&bg),
    }
}
