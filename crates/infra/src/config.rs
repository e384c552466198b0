//! Configuration loading and representation.
//!
//! Everything comes from environment variables; unset or unparsable values
//! fall back to defaults with a warning.

use std::path::PathBuf;

use maintstock_core::SystemClock;
use maintstock_inventory::LedgerSettings;

pub const ENV_DATA_DIR: &str = "MAINTSTOCK_DATA_DIR";
pub const ENV_ITEMS_KEY: &str = "MAINTSTOCK_ITEMS_KEY";
pub const ENV_MOVEMENTS_KEY: &str = "MAINTSTOCK_MOVEMENTS_KEY";
pub const ENV_LOCATION: &str = "MAINTSTOCK_LOCATION";
pub const ENV_UTC_OFFSET_MINUTES: &str = "MAINTSTOCK_UTC_OFFSET_MINUTES";
pub const ENV_SEED_SAMPLE: &str = "MAINTSTOCK_SEED_SAMPLE";

/// Keys the two ledger collections are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub items: String,
    pub movements: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            items: "inventory_items_v5".to_string(),
            movements: "inventory_movements_v5".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub keys: StorageKeys,
    pub ledger: LedgerSettings,
    /// Offset (minutes east of UTC) used to decide what "today" is.
    pub utc_offset_minutes: i32,
    /// Populate an empty store with sample toolboxes on first load.
    pub seed_sample: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            keys: StorageKeys::default(),
            ledger: LedgerSettings::default(),
            utc_offset_minutes: 0,
            seed_sample: true,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match non_blank(ENV_DATA_DIR) {
            Some(dir) => config.data_dir = PathBuf::from(dir),
            None => tracing::warn!(
                "{ENV_DATA_DIR} not set; using {}",
                config.data_dir.display()
            ),
        }
        if let Some(key) = non_blank(ENV_ITEMS_KEY) {
            config.keys.items = key;
        }
        if let Some(key) = non_blank(ENV_MOVEMENTS_KEY) {
            config.keys.movements = key;
        }
        if let Some(location) = non_blank(ENV_LOCATION) {
            config.ledger.location = location;
        }
        if let Some(raw) = non_blank(ENV_UTC_OFFSET_MINUTES) {
            match raw.trim().parse::<i32>() {
                Ok(minutes) if SystemClock::with_offset_minutes(minutes).is_some() => {
                    config.utc_offset_minutes = minutes;
                }
                _ => tracing::warn!("{ENV_UTC_OFFSET_MINUTES}={raw:?} is not a valid offset; using UTC"),
            }
        }
        if let Some(raw) = non_blank(ENV_SEED_SAMPLE) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.seed_sample = true,
                "0" | "false" | "no" => config.seed_sample = false,
                _ => tracing::warn!("{ENV_SEED_SAMPLE}={raw:?} is not a boolean; keeping default"),
            }
        }

        config
    }

    pub fn clock(&self) -> SystemClock {
        SystemClock::with_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = StorageConfig::from_lookup(lookup(&[]));
        assert_eq!(config, StorageConfig::default());
        assert_eq!(config.keys.items, "inventory_items_v5");
    }

    #[test]
    fn variables_override_defaults() {
        let config = StorageConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/var/lib/maintstock"),
            (ENV_ITEMS_KEY, "items_v6"),
            (ENV_LOCATION, "Annex"),
            (ENV_UTC_OFFSET_MINUTES, "120"),
            (ENV_SEED_SAMPLE, "no"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/maintstock"));
        assert_eq!(config.keys.items, "items_v6");
        assert_eq!(config.keys.movements, "inventory_movements_v5");
        assert_eq!(config.ledger.location, "Annex");
        assert_eq!(config.utc_offset_minutes, 120);
        assert!(!config.seed_sample);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = StorageConfig::from_lookup(lookup(&[
            (ENV_UTC_OFFSET_MINUTES, "9000"),
            (ENV_SEED_SAMPLE, "maybe"),
        ]));
        assert_eq!(config.utc_offset_minutes, 0);
        assert!(config.seed_sample);
    }
}
