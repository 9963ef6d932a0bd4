/// Resolution of clicked menu ids back into restore/clear actions

use crate::menu::{CLEAR_LIST_SUFFIX, QUICK_RESTORE_ID};

/// What a menu click asks for. Parsed fresh per click, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Restore the most recent tab, plus its close group when enabled.
    QuickRestore,
    /// Forget all tracked closed tabs.
    ClearList,
    /// Restore one specific tab by session id.
    Restore(String),
}

/// Parse a clicked menu item id. Priority order: the reserved quick-restore
/// id, then the clear-list suffix, then "tree:sessionId" entries. Structural
/// ids (submenu roots, separators) carry no colon and yield `None`.
pub fn parse_menu_id(id: &str) -> Option<MenuAction> {
    if id == QUICK_RESTORE_ID {
        return Some(MenuAction::QuickRestore);
    }
    if id.ends_with(CLEAR_LIST_SUFFIX) {
        return Some(MenuAction::ClearList);
    }
    let (_, session_id) = id.split_once(':')?;
    if session_id.is_empty() {
        return None;
    }
    Some(MenuAction::Restore(session_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{self, CONTEXT_ROOT_ID, CONTEXT_SEPARATOR_ID, OVERFLOW_ID};
    use crate::storage::Prefs;
    use crate::tab_data::ClosedTab;

    #[test]
    fn test_quick_restore_id() {
        assert_eq!(parse_menu_id("quickrestore"), Some(MenuAction::QuickRestore));
    }

    #[test]
    fn test_clear_list_suffix_from_both_trees() {
        assert_eq!(parse_menu_id("menu:clearlist"), Some(MenuAction::ClearList));
        assert_eq!(parse_menu_id("icon:clearlist"), Some(MenuAction::ClearList));
    }

    #[test]
    fn test_session_id_is_stripped_of_tree_prefix() {
        assert_eq!(
            parse_menu_id("icon:42"),
            Some(MenuAction::Restore("42".to_string()))
        );
        assert_eq!(
            parse_menu_id("menu:UCTINT3"),
            Some(MenuAction::Restore("UCTINT3".to_string()))
        );
    }

    #[test]
    fn test_session_ids_containing_colons_survive() {
        assert_eq!(
            parse_menu_id("icon:panel-3:4"),
            Some(MenuAction::Restore("panel-3:4".to_string()))
        );
    }

    #[test]
    fn test_structural_ids_are_ignored() {
        assert_eq!(parse_menu_id(CONTEXT_ROOT_ID), None);
        assert_eq!(parse_menu_id(CONTEXT_SEPARATOR_ID), None);
        assert_eq!(parse_menu_id(OVERFLOW_ID), None);
        assert_eq!(parse_menu_id(""), None);
        assert_eq!(parse_menu_id("icon:"), None);
    }

    #[test]
    fn test_every_projected_entry_round_trips() {
        let tabs: Vec<ClosedTab> = (0..8)
            .map(|i| ClosedTab {
                session_id: format!("sid-{}", i),
                title: Some(format!("Tab {}", i)),
                url: format!("https://example.com/{}", i),
                fav_icon_url: None,
                window_id: None,
                close_time: None,
            })
            .collect();
        let prefs = Prefs {
            show_tab_menu: true,
            show_page_menuitem: true,
            show_clear_list: true,
            ..Prefs::default()
        };

        for item in menu::project(&tabs, &prefs, 6) {
            let action = parse_menu_id(&item.id);
            match item.id.as_str() {
                CONTEXT_ROOT_ID | CONTEXT_SEPARATOR_ID | OVERFLOW_ID => {
                    assert_eq!(action, None, "id {}", item.id)
                }
                "quickrestore" => assert_eq!(action, Some(MenuAction::QuickRestore)),
                id if id.ends_with(":clearlist") => {
                    assert_eq!(action, Some(MenuAction::ClearList))
                }
                id => {
                    let expected = id.split_once(':').unwrap().1.to_string();
                    assert_eq!(action, Some(MenuAction::Restore(expected)));
                }
            }
        }
    }
}
