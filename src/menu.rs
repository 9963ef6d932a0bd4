/// Projection of a closed-tab list into context-menu trees

use crate::storage::Prefs;
use crate::tab_data::ClosedTab;
use serde::Serialize;

/// Flat page-context entry restoring the most recent tab.
pub const QUICK_RESTORE_ID: &str = "quickrestore";
/// Clicked ids ending in this suffix clear the closed-tab list.
pub const CLEAR_LIST_SUFFIX: &str = ":clearlist";

/// Id prefix for entries in the page/tab context submenu.
pub const CONTEXT_TREE: &str = "menu";
/// Id prefix for entries in the toolbar-button menu.
pub const TOOLBAR_TREE: &str = "icon";

/// Structural nodes. No colon, so they can never parse as a restore action.
pub const CONTEXT_ROOT_ID: &str = "menu-root";
pub const CONTEXT_SEPARATOR_ID: &str = "menu-separator";
pub const OVERFLOW_ID: &str = "icon-more";

const EXTENSION_LABEL: &str = "Undo Close Tab";
const QUICK_RESTORE_LABEL: &str = "Restore last closed tab";
const CLEAR_LIST_LABEL: &str = "Clear list of closed tabs";
const OVERFLOW_LABEL: &str = "More entries";
const PLACEHOLDER_ICON: &str = "icons/tab-placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuContext {
    Page,
    Tab,
    BrowserAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Normal,
    Separator,
}

/// One menu entry to create. Entries are emitted parents-before-children
/// and the whole set is rebuilt from scratch on every projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub contexts: Vec<MenuContext>,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "iconUrl", skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: MenuKind,
}

impl MenuItem {
    fn normal(id: String, title: String, contexts: Vec<MenuContext>) -> Self {
        MenuItem {
            id,
            title: Some(title),
            contexts,
            parent_id: None,
            icon_url: None,
            kind: MenuKind::Normal,
        }
    }

    fn child_of(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }
}

/// Double ampersands so tab titles cannot inject menu access keys.
pub fn escape_label(title: &str) -> String {
    title.replace('&', "&&")
}

/// Build the full set of menu entries for the given tabs and preferences.
/// `top_level_limit` is the platform's cap on top-level toolbar entries.
pub fn project(tabs: &[ClosedTab], prefs: &Prefs, top_level_limit: usize) -> Vec<MenuItem> {
    let mut items = Vec::new();
    if tabs.is_empty() {
        return items;
    }

    context_submenu(&mut items, tabs, prefs);

    if prefs.show_page_menuitem {
        items.push(MenuItem::normal(
            QUICK_RESTORE_ID.to_string(),
            QUICK_RESTORE_LABEL.to_string(),
            vec![MenuContext::Page],
        ));
    }

    toolbar_menu(&mut items, tabs, prefs, top_level_limit);
    items
}

fn tab_item(tab: &ClosedTab, tree: &str, contexts: Vec<MenuContext>) -> MenuItem {
    let title = escape_label(tab.usable_title().unwrap_or(&tab.url));
    let mut item = MenuItem::normal(format!("{}:{}", tree, tab.session_id), title, contexts);
    item.icon_url = Some(
        tab.fav_icon_url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_ICON.to_string()),
    );
    item
}

fn context_submenu(items: &mut Vec<MenuItem>, tabs: &[ClosedTab], prefs: &Prefs) {
    let mut contexts = Vec::new();
    if prefs.show_tab_menu {
        contexts.push(MenuContext::Tab);
    }
    if prefs.show_page_menu {
        contexts.push(MenuContext::Page);
    }
    if contexts.is_empty() {
        return;
    }

    items.push(MenuItem::normal(
        CONTEXT_ROOT_ID.to_string(),
        EXTENSION_LABEL.to_string(),
        contexts.clone(),
    ));

    for tab in tabs {
        items.push(tab_item(tab, CONTEXT_TREE, contexts.clone()).child_of(CONTEXT_ROOT_ID));
    }

    if prefs.show_clear_list {
        items.push(MenuItem {
            id: CONTEXT_SEPARATOR_ID.to_string(),
            title: None,
            contexts: contexts.clone(),
            parent_id: Some(CONTEXT_ROOT_ID.to_string()),
            icon_url: None,
            kind: MenuKind::Separator,
        });
        items.push(
            MenuItem::normal(
                format!("{}{}", CONTEXT_TREE, CLEAR_LIST_SUFFIX),
                CLEAR_LIST_LABEL.to_string(),
                contexts,
            )
            .child_of(CONTEXT_ROOT_ID),
        );
    }
}

fn toolbar_menu(items: &mut Vec<MenuItem>, tabs: &[ClosedTab], prefs: &Prefs, top_level_limit: usize) {
    let contexts = vec![MenuContext::BrowserAction];

    // One top-level slot stays reserved for the clear-list entry.
    let capacity = if prefs.show_clear_list {
        top_level_limit.saturating_sub(1)
    } else {
        top_level_limit
    };

    if tabs.len() <= capacity {
        for tab in tabs {
            items.push(tab_item(tab, TOOLBAR_TREE, contexts.clone()));
        }
    } else {
        // The overflow node itself takes a slot, so one fewer tab fits.
        let top_level = capacity.saturating_sub(1);
        for tab in &tabs[..top_level] {
            items.push(tab_item(tab, TOOLBAR_TREE, contexts.clone()));
        }
        items.push(MenuItem::normal(
            OVERFLOW_ID.to_string(),
            OVERFLOW_LABEL.to_string(),
            contexts.clone(),
        ));
        for tab in &tabs[top_level..] {
            items.push(tab_item(tab, TOOLBAR_TREE, contexts.clone()).child_of(OVERFLOW_ID));
        }
    }

    if prefs.show_clear_list {
        items.push(MenuItem::normal(
            format!("{}{}", TOOLBAR_TREE, CLEAR_LIST_SUFFIX),
            CLEAR_LIST_LABEL.to_string(),
            contexts,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tab(session_id: &str, title: &str) -> ClosedTab {
        ClosedTab {
            session_id: session_id.to_string(),
            title: Some(title.to_string()),
            url: format!("https://example.com/{}", session_id),
            fav_icon_url: None,
            window_id: None,
            close_time: None,
        }
    }

    fn create_test_tabs(n: usize) -> Vec<ClosedTab> {
        (0..n)
            .map(|i| create_test_tab(&i.to_string(), &format!("Tab {}", i)))
            .collect()
    }

    fn toolbar_top_level(items: &[MenuItem]) -> Vec<&MenuItem> {
        items
            .iter()
            .filter(|i| i.contexts.contains(&MenuContext::BrowserAction) && i.parent_id.is_none())
            .collect()
    }

    #[test]
    fn test_empty_tab_list_projects_nothing() {
        let prefs = Prefs {
            show_tab_menu: true,
            show_clear_list: true,
            ..Prefs::default()
        };
        assert!(project(&[], &prefs, 6).is_empty());
    }

    #[test]
    fn test_toolbar_menu_fits_within_limit() {
        let tabs = create_test_tabs(4);
        let items = project(&tabs, &Prefs::default(), 6);

        let top = toolbar_top_level(&items);
        assert_eq!(top.len(), 4);
        assert!(items.iter().all(|i| i.id != OVERFLOW_ID));
        assert_eq!(top[0].id, "icon:0");
        assert_eq!(top[3].id, "icon:3");
    }

    #[test]
    fn test_toolbar_menu_overflows_into_submenu() {
        let tabs = create_test_tabs(10);
        let items = project(&tabs, &Prefs::default(), 6);

        let top = toolbar_top_level(&items);
        assert_eq!(top.len(), 6);
        assert_eq!(top[5].id, OVERFLOW_ID);

        let nested: Vec<&MenuItem> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(OVERFLOW_ID))
            .collect();
        assert_eq!(nested.len(), 5);
        assert_eq!(nested[0].id, "icon:5");
        assert_eq!(nested[4].id, "icon:9");
    }

    #[test]
    fn test_clear_list_reserves_a_top_level_slot() {
        let prefs = Prefs {
            show_clear_list: true,
            ..Prefs::default()
        };
        let tabs = create_test_tabs(10);
        let items = project(&tabs, &prefs, 6);

        let top = toolbar_top_level(&items);
        assert_eq!(top.len(), 6);
        assert_eq!(top[0].id, "icon:0");
        assert_eq!(top[3].id, "icon:3");
        assert_eq!(top[4].id, OVERFLOW_ID);
        // Clear list is last and never nested
        assert_eq!(top[5].id, "icon:clearlist");

        let nested: Vec<&MenuItem> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(OVERFLOW_ID))
            .collect();
        assert_eq!(nested.len(), 6);
        assert_eq!(nested[0].id, "icon:4");
    }

    #[test]
    fn test_exact_fit_needs_no_overflow_node() {
        let tabs = create_test_tabs(6);
        let items = project(&tabs, &Prefs::default(), 6);

        assert_eq!(toolbar_top_level(&items).len(), 6);
        assert!(items.iter().all(|i| i.id != OVERFLOW_ID));
    }

    #[test]
    fn test_context_submenu_contexts_follow_prefs() {
        let prefs = Prefs {
            show_tab_menu: true,
            show_page_menu: true,
            ..Prefs::default()
        };
        let tabs = create_test_tabs(2);
        let items = project(&tabs, &prefs, 6);

        let root = items.iter().find(|i| i.id == CONTEXT_ROOT_ID).unwrap();
        assert_eq!(root.contexts, vec![MenuContext::Tab, MenuContext::Page]);
        assert_eq!(root.title.as_deref(), Some("Undo Close Tab"));

        let children: Vec<&MenuItem> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(CONTEXT_ROOT_ID))
            .collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, "menu:0");
    }

    #[test]
    fn test_context_submenu_absent_when_disabled() {
        let tabs = create_test_tabs(2);
        let items = project(&tabs, &Prefs::default(), 6);
        assert!(items.iter().all(|i| i.id != CONTEXT_ROOT_ID));
    }

    #[test]
    fn test_context_submenu_clear_entry_after_separator() {
        let prefs = Prefs {
            show_page_menu: true,
            show_clear_list: true,
            ..Prefs::default()
        };
        let tabs = create_test_tabs(1);
        let items = project(&tabs, &prefs, 6);

        let children: Vec<&MenuItem> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(CONTEXT_ROOT_ID))
            .collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].kind, MenuKind::Separator);
        assert_eq!(children[2].id, "menu:clearlist");
    }

    #[test]
    fn test_page_menuitem_is_a_flat_entry() {
        let prefs = Prefs {
            show_page_menuitem: true,
            ..Prefs::default()
        };
        let tabs = create_test_tabs(3);
        let items = project(&tabs, &prefs, 6);

        let quick = items.iter().find(|i| i.id == QUICK_RESTORE_ID).unwrap();
        assert_eq!(quick.contexts, vec![MenuContext::Page]);
        assert!(quick.parent_id.is_none());
        assert!(items.iter().all(|i| i.id != CONTEXT_ROOT_ID));
    }

    #[test]
    fn test_labels_escape_ampersands() {
        let tabs = vec![create_test_tab("1", "Fish & Chips & Co")];
        let items = project(&tabs, &Prefs::default(), 6);

        assert_eq!(items[0].title.as_deref(), Some("Fish && Chips && Co"));
    }

    #[test]
    fn test_favicon_falls_back_to_placeholder() {
        let mut tabs = create_test_tabs(2);
        tabs[0].fav_icon_url = Some("https://example.com/icon.png".to_string());
        let items = project(&tabs, &Prefs::default(), 6);

        assert_eq!(items[0].icon_url.as_deref(), Some("https://example.com/icon.png"));
        assert_eq!(items[1].icon_url.as_deref(), Some(PLACEHOLDER_ICON));
    }

    #[test]
    fn test_top_level_never_exceeds_limit() {
        for n in 0..20 {
            for clear in [false, true] {
                let prefs = Prefs {
                    show_clear_list: clear,
                    ..Prefs::default()
                };
                let items = project(&create_test_tabs(n), &prefs, 6);
                assert!(toolbar_top_level(&items).len() <= 6, "n={} clear={}", n, clear);
            }
        }
    }
}
