/// Merging of the two closed-tab sources into one ordered view

use crate::tab_data::ClosedTab;

/// Concatenate the browser session history with the fallback list. The
/// session history comes first: it is the more current source, and fallback
/// entries carry no ordering information relative to it.
pub fn merge(native: Vec<ClosedTab>, fallback: Vec<ClosedTab>) -> Vec<ClosedTab> {
    let mut tabs = native;
    tabs.extend(fallback);
    tabs
}

/// Keep entries belonging to the given window. Entries without a window id
/// (fallback entries are window-agnostic) always pass.
pub fn only_window(tabs: Vec<ClosedTab>, window_id: i32) -> Vec<ClosedTab> {
    tabs.into_iter()
        .filter(|tab| tab.window_id.is_none() || tab.window_id == Some(window_id))
        .collect()
}

/// Drop entries without a usable title. The session history occasionally
/// surfaces a malformed entry without one; the trigger is unknown, so this
/// stays a plain filter.
pub fn drop_untitled(tabs: Vec<ClosedTab>) -> Vec<ClosedTab> {
    tabs.into_iter()
        .filter(|tab| tab.usable_title().is_some())
        .collect()
}

/// Prefix take.
pub fn truncate(mut tabs: Vec<ClosedTab>, max: Option<usize>) -> Vec<ClosedTab> {
    if let Some(max) = max {
        tabs.truncate(max);
    }
    tabs
}

/// How many entries after the head belong to the contiguous run of tabs
/// closed in quick succession. The list is most-recent-first; an entry joins
/// the run when it has a close time and the gap to the previous entry's
/// close time is below `window_ms`. The run ends at the first entry lacking
/// a close time or exceeding the window.
pub fn grouped_run(tabs: &[ClosedTab], window_ms: f64) -> usize {
    let mut count = 0;
    let Some(mut previous) = tabs.first().and_then(|tab| tab.close_time) else {
        return 0;
    };

    for tab in &tabs[1..] {
        let Some(close_time) = tab.close_time else {
            break;
        };
        if previous - close_time >= window_ms {
            break;
        }
        previous = close_time;
        count += 1;
    }
    count
}
