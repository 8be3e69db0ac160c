//! Configuration management
//!
//! Settings live in settings.json in the data directory:
//! ```json
//! {
//!   "tracking": {
//!     "defaultOwner": "alice",
//!     "decimals": 6,
//!     "rejectNegativeAmounts": false
//!   }
//! }
//! ```
//! Keys this crate doesn't manage are kept as they are when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::domain::{check_decimals, AmountPolicy, Owner, DEFAULT_DECIMALS};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    tracking: TrackingSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decimals: Option<u32>,
    #[serde(default)]
    reject_negative_amounts: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Shadowbook configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Owner used when a command doesn't name one
    pub default_owner: Option<Owner>,
    /// Display precision for formatted balances
    pub decimals: u32,
    pub reject_negative_amounts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_owner: None,
            decimals: DEFAULT_DECIMALS,
            reject_negative_amounts: false,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

fn read_settings(settings_path: &Path) -> Result<SettingsFile> {
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    // Never treated as empty: save() would overwrite the user's file
    serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Invalid {}: {}", settings_path.display(), e)).into())
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment overrides (for CI/testing and embedding):
    /// - SHADOWBOOK_OWNER replaces the default owner
    /// - SHADOWBOOK_REJECT_NEGATIVE toggles negative amount rejection
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(&data_dir.join("settings.json"))?;

        let default_owner = std::env::var("SHADOWBOOK_OWNER")
            .ok()
            .filter(|s| !s.is_empty())
            .or(raw.tracking.default_owner)
            .map(Owner::new);

        let reject_negative_amounts = std::env::var("SHADOWBOOK_REJECT_NEGATIVE")
            .ok()
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(raw.tracking.reject_negative_amounts);

        Ok(Self {
            default_owner,
            decimals: check_decimals(raw.tracking.decimals.unwrap_or(DEFAULT_DECIMALS))?,
            reject_negative_amounts,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");
        let mut settings = read_settings(&settings_path)?;

        settings.tracking.default_owner = self.default_owner.as_ref().map(|o| o.as_str().to_string());
        settings.tracking.decimals = Some(self.decimals);
        settings.tracking.reject_negative_amounts = self.reject_negative_amounts;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    pub fn set_default_owner(&mut self, owner: Owner) {
        self.default_owner = Some(owner);
    }

    pub fn amount_policy(&self) -> AmountPolicy {
        AmountPolicy::from_flag(self.reject_negative_amounts)
    }
}
