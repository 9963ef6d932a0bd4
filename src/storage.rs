/// Central place for preference defaults and the managed-policy overlay
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Effective preferences controlling menu rendering and restore behavior.
/// Key names match what the options page stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(rename = "showNumber")]
    pub show_number: u32,
    #[serde(rename = "showTabMenu")]
    pub show_tab_menu: bool,
    #[serde(rename = "showPageMenu")]
    pub show_page_menu: bool,
    #[serde(rename = "showPageMenuitem")]
    pub show_page_menuitem: bool,
    #[serde(rename = "onlyCurrent")]
    pub only_current: bool,
    #[serde(rename = "showClearList")]
    pub show_clear_list: bool,
    #[serde(rename = "restoreGroup")]
    pub restore_group: bool,
    /// Grouping window for grouped restore, in seconds.
    #[serde(rename = "groupTime")]
    pub group_time: u32,
}

impl Default for Prefs {
    fn default() -> Self {
        Prefs {
            show_number: 25,
            show_tab_menu: false,
            show_page_menu: false,
            show_page_menuitem: false,
            only_current: false,
            show_clear_list: false,
            restore_group: false,
            group_time: 5,
        }
    }
}

fn default_map() -> Map<String, Value> {
    match serde_json::to_value(Prefs::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve the effective preferences: shipped defaults, overlaid with stored
/// user values, overlaid with administratively managed values. Managed
/// values win over user values but may never change a key's type.
pub fn resolve(stored: Map<String, Value>, managed: Map<String, Value>) -> Prefs {
    let defaults = default_map();
    let mut values = defaults.clone();

    overlay_stored(&mut values, &defaults, stored);
    overlay_managed(&mut values, &defaults, managed);

    match serde_json::from_value(Value::Object(values)) {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!("Preference values out of range, falling back to defaults: {}", e);
            Prefs::default()
        }
    }
}

fn overlay_stored(values: &mut Map<String, Value>, defaults: &Map<String, Value>, stored: Map<String, Value>) {
    for (name, value) in stored {
        let Some(default) = defaults.get(&name) else {
            continue;
        };
        if json_type(&value) != json_type(default) {
            warn!(
                "Ignoring stored preference \"{}\" of type {} (expected {})",
                name,
                json_type(&value),
                json_type(default)
            );
            continue;
        }
        values.insert(name, value);
    }
}

/// Apply managed-policy values per key. A managed value is skipped, with a
/// diagnostic, when it targets an unknown key, changes the key's type,
/// empties a non-empty default array, or mixes element types into an array.
/// Skipping one key never affects the others.
pub fn overlay_managed(
    values: &mut Map<String, Value>,
    defaults: &Map<String, Value>,
    managed: Map<String, Value>,
) {
    for (name, value) in managed {
        let Some(default) = defaults.get(&name) else {
            continue;
        };

        if json_type(&value) != json_type(default) {
            warn!(
                "Managed value for \"{}\" is of type {} but should be of type {}",
                name,
                json_type(&value),
                json_type(default)
            );
            continue;
        }

        if let (Value::Array(items), Value::Array(default_items)) = (&value, default) {
            if items.is_empty() && !default_items.is_empty() {
                warn!(
                    "Managed value for \"{}\" rejected: managed values may not empty arrays",
                    name
                );
                continue;
            }
            if let Some(first) = default_items.first() {
                let item_type = json_type(first);
                if let Some(odd) = items.iter().find(|item| json_type(item) != item_type) {
                    warn!(
                        "Managed value for \"{}\" rejected: item of type {} should be of type {}",
                        name,
                        json_type(odd),
                        item_type
                    );
                    continue;
                }
            }
        }

        values.insert(name, value);
    }
}
