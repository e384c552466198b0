//! Ledger persistence over a [`KeyValueStore`].
//!
//! The item and movement collections are stored as two UTF-8 JSON arrays
//! under two keys. Lifecycle: construct → load → mutate → persist.
//!
//! A persist stages both arrays under `<key>.staged`, then writes the
//! journal key (the commit point), then copies the staged values over the
//! live keys. A load that finds the journal finishes that copy first, so
//! storage always reads back as either the old pair or the new pair.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use maintstock_core::{Clock, DomainError};
use maintstock_inventory::{Item, LedgerSettings, LedgerStore, Movement};

use crate::config::StorageKeys;
use crate::kv_store::{KeyValueStore, StorageError};
use crate::seed::seed_sample;

/// Default storage quota the usage figure is reported against (5 MiB).
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

const STAGED_SUFFIX: &str = ".staged";
const JOURNAL_SUFFIX: &str = ".journal";
const JOURNAL_COMMITTED: &str = "committed";

fn staged_key(key: &str) -> String {
    format!("{key}{STAGED_SUFFIX}")
}

fn to_json<T: Serialize>(key: &str, values: &[T]) -> Result<String, PersistenceError> {
    serde_json::to_string(values).map_err(|source| PersistenceError::Serialize {
        key: key.to_string(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to (de)serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored ledger rejected: {0}")]
    Domain(#[from] DomainError),
}

/// Bytes held by the store against its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub quota_bytes: u64,
}

impl StorageUsage {
    pub fn used_mib(&self) -> f64 {
        self.used_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn percentage(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.quota_bytes as f64 * 100.0
    }
}

impl core::fmt::Display for StorageUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:.2}MB used ({:.1}% of quota)",
            self.used_mib(),
            self.percentage()
        )
    }
}

#[derive(Debug)]
pub struct LedgerRepository<S>
where
    S: KeyValueStore,
{
    store: S,
    keys: StorageKeys,
    quota_bytes: u64,
}

impl<S> LedgerRepository<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S, keys: StorageKeys) -> Self {
        Self {
            store,
            keys,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, PersistenceError> {
        let Some(text) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| PersistenceError::Serialize {
                key: key.to_string(),
                source,
            })
    }

    fn journal_key(&self) -> String {
        format!("{}{JOURNAL_SUFFIX}", self.keys.items)
    }

    fn collection_keys(&self) -> [&str; 2] {
        [self.keys.items.as_str(), self.keys.movements.as_str()]
    }

    fn discard_staged(&self) {
        for key in self.collection_keys() {
            if let Err(err) = self.store.remove(&staged_key(key)) {
                tracing::warn!(key, error = %err, "failed to drop staged value");
            }
        }
    }

    /// Finish a persist whose journal was written but whose live keys may
    /// not all have been replaced.
    fn recover(&self) -> Result<(), PersistenceError> {
        if self.store.get(&self.journal_key())?.is_none() {
            return Ok(());
        }
        tracing::info!("completing interrupted persist");
        self.apply_staged()
    }

    fn apply_staged(&self) -> Result<(), PersistenceError> {
        for key in self.collection_keys() {
            if let Some(text) = self.store.get(&staged_key(key))? {
                self.store.set(key, &text)?;
            }
        }
        self.store.remove(&self.journal_key())?;
        self.discard_staged();
        Ok(())
    }

    /// Whether either collection key holds a value.
    pub fn has_data(&self) -> Result<bool, PersistenceError> {
        Ok(self.store.get(&self.keys.items)?.is_some()
            || self.store.get(&self.keys.movements)?.is_some())
    }

    /// Replace `ledger`'s contents with what is stored.
    ///
    /// Returns `false` (leaving the ledger alone) when nothing is stored. A
    /// missing collection next to a present one is read as empty.
    pub fn load_into(&self, ledger: &mut LedgerStore) -> Result<bool, PersistenceError> {
        self.recover()?;
        let items: Option<Vec<Item>> = self.read(&self.keys.items)?;
        let movements: Option<Vec<Movement>> = self.read(&self.keys.movements)?;
        if items.is_none() && movements.is_none() {
            tracing::debug!("no stored ledger found");
            return Ok(false);
        }

        ledger.restore(items.unwrap_or_default(), movements.unwrap_or_default())?;
        tracing::info!(
            items = ledger.items().len(),
            movements = ledger.movements().len(),
            "ledger loaded"
        );
        Ok(true)
    }

    /// Build a ledger from storage, seeding sample data on a first run.
    pub fn open(
        &self,
        clock: Arc<dyn Clock>,
        settings: LedgerSettings,
        seed_when_empty: bool,
    ) -> Result<LedgerStore, PersistenceError> {
        let mut ledger = LedgerStore::new(clock, settings);
        if !self.load_into(&mut ledger)? && seed_when_empty {
            seed_sample(&mut ledger)?;
            self.persist(&ledger)?;
        }
        Ok(ledger)
    }

    /// Write both collections as one unit.
    ///
    /// A failure before the journal is written leaves the previous pair in
    /// place; a failure after it is completed by the next load.
    pub fn persist(&self, ledger: &LedgerStore) -> Result<(), PersistenceError> {
        self.recover()?;
        let staged = [
            (&self.keys.items, to_json(&self.keys.items, ledger.items())?),
            (&self.keys.movements, to_json(&self.keys.movements, ledger.movements())?),
        ];
        for (key, text) in &staged {
            if let Err(err) = self.store.set(&staged_key(key), text) {
                self.discard_staged();
                return Err(err.into());
            }
        }

        self.store.set(&self.journal_key(), JOURNAL_COMMITTED)?;
        self.apply_staged()?;
        tracing::debug!(
            items = ledger.items().len(),
            movements = ledger.movements().len(),
            "ledger persisted"
        );
        Ok(())
    }

    /// Drop both collections from storage.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.store.remove(&self.journal_key())?;
        self.discard_staged();
        for key in self.collection_keys() {
            self.store.remove(key)?;
        }
        Ok(())
    }

    /// Bytes used by every key and value in the underlying store.
    pub fn usage(&self) -> Result<StorageUsage, PersistenceError> {
        let mut used_bytes = 0u64;
        for key in self.store.keys()? {
            let value_len = self.store.get(&key)?.map(|v| v.len()).unwrap_or(0);
            used_bytes += (key.len() + value_len) as u64;
        }
        Ok(StorageUsage {
            used_bytes,
            quota_bytes: self.quota_bytes,
        })
    }
}
