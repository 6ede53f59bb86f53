//! First-login default settings.
//!
//! A modpack or server operator can ship a `default-settings.json` next to
//! the client. When the server reports that this login created the account,
//! the declared fields are pushed in a single settings update.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};

/// File name looked up in the config directory.
pub const DEFAULTS_FILE: &str = "default-settings.json";

/// How a cape is shown on a given server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapeDisplay {
    /// Replace the server's own cape.
    Replace,
    Hide,
    Show,
}

/// Default settings bundle applied on first login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DefaultSettingsConfig {
    /// True only when the bundle came from a file.
    #[serde(skip)]
    pub was_loaded: bool,
    pub hats: Option<bool>,
    pub shoulder_buddies: Option<bool>,
    pub back_blings: Option<bool>,
    pub lore: Option<bool>,
    pub online_activity: Option<bool>,
    pub icon_settings: Option<i64>,
    /// Default cape id; empty means none.
    pub cape_id: String,
    pub cape_server_settings: BTreeMap<String, CapeDisplay>,
}

impl DefaultSettingsConfig {
    /// Load the bundle from `path`.
    ///
    /// A missing file gives the unloaded default. A file that exists but
    /// cannot be read or parsed is a configuration error.
    pub fn load(path: &Path) -> SessionResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No default settings file");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| SessionError::Configuration {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let mut config = Self::from_json(&text).map_err(|e| SessionError::Configuration {
            message: format!("invalid {}: {}", path.display(), e),
        })?;
        config.was_loaded = true;
        info!(path = %path.display(), "Loaded default settings");
        Ok(config)
    }

    /// Parse a bundle from JSON. The result is not marked as loaded.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Body of the batched settings update: only declared fields, under
    /// their wire names.
    pub fn to_update_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let flags = [
            ("dohats", self.hats),
            ("doshoulderbuddies", self.shoulder_buddies),
            ("dobackblings", self.back_blings),
            ("dolore", self.lore),
            ("doonlineactivity", self.online_activity),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::Bool(value));
            }
        }
        if let Some(icons) = self.icon_settings {
            map.insert("iconsettings".to_string(), Value::from(icons));
        }
        map
    }

    /// Default cape to assign, if one is declared.
    pub fn default_cape(&self) -> Option<&str> {
        let id = self.cape_id.trim();
        (!id.is_empty()).then_some(id)
    }
}
