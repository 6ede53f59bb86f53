//! Server-side settings bundle and the post-sync load target.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::credentials::Identity;

/// User settings as returned by the server.
///
/// Only the fields the session reasons about are typed; everything else is
/// kept verbatim for the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// The player has chosen whether to see region-specific effects.
    #[serde(default, rename = "hasperregioneffectsset")]
    pub per_region_effects_set: bool,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl UserSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// A boolean setting, `None` if absent or not a boolean.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }
}

/// Which screen the UI asked for when it opened the loading screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadTarget {
    #[default]
    Default,
    CustomizeOwn,
    /// Another player's cosmetics. `None` when the UI lost track of who.
    ViewOther(Option<Identity>),
    Tutorial,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_unknown_fields() {
        let settings: UserSettings = serde_json::from_str(
            r#"{"hasperregioneffectsset": true, "dohats": false, "iconsettings": 5}"#,
        )
        .unwrap();
        assert!(settings.per_region_effects_set);
        assert_eq!(settings.flag("dohats"), Some(false));
        assert_eq!(settings.get("iconsettings"), Some(&Value::from(5)));
        assert_eq!(settings.flag("iconsettings"), None);
    }

    #[test]
    fn test_missing_region_flag_defaults_false() {
        let settings: UserSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.per_region_effects_set);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(serde_json::from_str::<UserSettings>("[1, 2]").is_err());
    }
}
