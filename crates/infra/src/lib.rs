//! Infrastructure layer: key-value persistence, configuration, seed data.

pub mod config;
pub mod kv_store;
pub mod repository;
pub mod seed;

pub use config::{StorageConfig, StorageKeys};
pub use kv_store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageError};
pub use repository::{DEFAULT_QUOTA_BYTES, LedgerRepository, PersistenceError, StorageUsage};
pub use seed::seed_sample;
