/// Data structures for closed-tab records and the in-memory fallback list
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Reserved prefix marking session ids minted by us. The browser session
/// manager never produces ids with this prefix, so the two namespaces
/// cannot collide.
pub const INTERNAL_PREFIX: &str = "UCTINT";

/// Maximum number of entries kept in the fallback list.
pub const FALLBACK_CAPACITY: usize = 25;

/// A recently closed tab, from either the browser session history or the
/// fallback list. Field names map onto the WebExtension session shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTab {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(rename = "favIconUrl", default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(rename = "windowId", default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i32>,
    #[serde(rename = "closeTime", default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<f64>,
}

impl ClosedTab {
    /// Whether this record came from the fallback list.
    pub fn is_internal(&self) -> bool {
        self.session_id.starts_with(INTERNAL_PREFIX)
    }

    /// Title usable as a menu label. Entries without one are filtered out
    /// because the session history occasionally surfaces malformed entries.
    pub fn usable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// Bounded in-memory substitute for the browser's closed-tab history.
/// Most recently closed entries sit at the front. Ids are minted from a
/// counter that is monotonic for the process lifetime.
#[derive(Debug, Default)]
pub struct FallbackList {
    entries: VecDeque<ClosedTab>,
    counter: u64,
}

impl FallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", INTERNAL_PREFIX, self.counter)
    }

    /// Push a freshly closed tab to the front, evicting from the tail
    /// beyond capacity. The URL doubles as the label because tab-close
    /// notifications carry no title.
    pub fn record(&mut self, url: String) {
        let tab = ClosedTab {
            session_id: self.mint_id(),
            title: Some(url.clone()),
            url,
            fav_icon_url: None,
            window_id: None,
            close_time: None,
        };
        self.entries.push_front(tab);
        self.entries.truncate(FALLBACK_CAPACITY);
    }

    /// Append an entry taken over from the browser session history during
    /// the startup migration. Appending keeps the source order, which is
    /// already most-recent-first.
    pub fn adopt(&mut self, title: Option<String>, fav_icon_url: Option<String>, url: String) {
        let tab = ClosedTab {
            session_id: self.mint_id(),
            title,
            url,
            fav_icon_url,
            window_id: None,
            close_time: None,
        };
        self.entries.push_back(tab);
        self.entries.truncate(FALLBACK_CAPACITY);
    }

    /// Remove and return the entry with the given id. Returns `None` when
    /// no entry matches, e.g. when a double click raced the first removal.
    pub fn take(&mut self, session_id: &str) -> Option<ClosedTab> {
        let index = self
            .entries
            .iter()
            .position(|tab| tab.session_id == session_id)?;
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<ClosedTab> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_mints_prefixed_monotonic_ids() {
        let mut list = FallbackList::new();
        list.record("https://example.com/a".to_string());
        list.record("https://example.com/b".to_string());

        let tabs = list.snapshot();
        assert_eq!(tabs[0].session_id, "UCTINT2");
        assert_eq!(tabs[1].session_id, "UCTINT1");
        assert!(tabs.iter().all(|t| t.is_internal()));
    }

    #[test]
    fn test_record_puts_newest_first_and_uses_url_as_title() {
        let mut list = FallbackList::new();
        list.record("https://example.com/old".to_string());
        list.record("https://example.com/new".to_string());

        let tabs = list.snapshot();
        assert_eq!(tabs[0].url, "https://example.com/new");
        assert_eq!(tabs[0].usable_title(), Some("https://example.com/new"));
    }

    #[test]
    fn test_record_evicts_beyond_capacity() {
        let mut list = FallbackList::new();
        for i in 0..30 {
            list.record(format!("https://example.com/{}", i));
        }

        assert_eq!(list.len(), FALLBACK_CAPACITY);
        // The oldest entries fell off the tail
        let tabs = list.snapshot();
        assert_eq!(tabs[0].url, "https://example.com/29");
        assert_eq!(tabs[24].url, "https://example.com/5");
    }

    #[test]
    fn test_adopt_keeps_source_order() {
        let mut list = FallbackList::new();
        list.adopt(Some("First".to_string()), None, "https://a.example".to_string());
        list.adopt(Some("Second".to_string()), None, "https://b.example".to_string());

        let tabs = list.snapshot();
        assert_eq!(tabs[0].title.as_deref(), Some("First"));
        assert_eq!(tabs[1].title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_take_removes_exactly_one_entry() {
        let mut list = FallbackList::new();
        list.record("https://example.com/a".to_string());
        list.record("https://example.com/b".to_string());

        let taken = list.take("UCTINT1");

        assert_eq!(taken.unwrap().url, "https://example.com/a");
        assert_eq!(list.len(), 1);
        assert_eq!(list.snapshot()[0].session_id, "UCTINT2");
    }

    #[test]
    fn test_take_missing_id_is_a_noop() {
        let mut list = FallbackList::new();
        list.record("https://example.com/a".to_string());

        assert!(list.take("UCTINT99").is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_counter_survives_clear() {
        let mut list = FallbackList::new();
        list.record("https://example.com/a".to_string());
        list.clear();
        assert!(list.is_empty());

        list.record("https://example.com/b".to_string());
        assert_eq!(list.snapshot()[0].session_id, "UCTINT2");
    }

    #[test]
    fn test_usable_title_rejects_empty() {
        let tab = ClosedTab {
            session_id: "42".to_string(),
            title: Some(String::new()),
            url: "https://example.com".to_string(),
            fav_icon_url: None,
            window_id: None,
            close_time: None,
        };
        assert!(tab.usable_title().is_none());
    }
}
