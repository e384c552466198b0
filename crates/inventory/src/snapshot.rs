//! Export snapshots and import documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use maintstock_core::{DomainError, DomainResult};

use crate::item::Item;
use crate::ledger::LedgerStore;
use crate::movement::Movement;

/// Full export of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub movements: Vec<Movement>,
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub location: String,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested file name for this export, e.g. `inventory_2025-06-01_10-00-00.json`.
    pub fn file_name(&self) -> String {
        export_file_name(self.export_date)
    }
}

pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("inventory_{}.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// The two collections an import needs.
///
/// Accepts any JSON object with `items` and `movements` arrays; the legacy
/// `moviments` spelling is read as well. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDocument {
    pub items: Vec<Item>,
    pub movements: Vec<Movement>,
}

impl ImportDocument {
    pub fn from_json(text: &str) -> DomainResult<Self> {
        let value: JsonValue = serde_json::from_str(text)
            .map_err(|e| DomainError::format(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: JsonValue) -> DomainResult<Self> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| DomainError::format("import document must be a JSON object"))?;

        let items = obj
            .remove("items")
            .ok_or_else(|| DomainError::format("missing `items` field"))?;
        let movements = obj
            .remove("movements")
            .or_else(|| obj.remove("moviments"))
            .ok_or_else(|| DomainError::format("missing `movements` field"))?;

        let items: Vec<Item> = serde_json::from_value(items)
            .map_err(|e| DomainError::format(format!("invalid items: {e}")))?;
        let movements: Vec<Movement> = serde_json::from_value(movements)
            .map_err(|e| DomainError::format(format!("invalid movements: {e}")))?;

        Ok(Self { items, movements })
    }
}

impl From<Snapshot> for ImportDocument {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            items: snapshot.items,
            movements: snapshot.movements,
        }
    }
}

impl LedgerStore {
    /// Export both collections plus the export metadata.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items().to_vec(),
            movements: self.movements().to_vec(),
            export_date: self.clock().now(),
            version: self.settings().version.clone(),
            location: self.settings().location.clone(),
        }
    }

    /// Replace the ledger with an imported document (see [`LedgerStore::restore`]).
    pub fn restore_document(&mut self, document: ImportDocument) -> DomainResult<()> {
        self.restore(document.items, document.movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use maintstock_core::FixedClock;
    use serde_json::json;

    use crate::item::{Category, ItemDraft};
    use crate::ledger::LedgerSettings;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn populated_ledger() -> LedgerStore {
        let mut ledger =
            LedgerStore::new(Arc::new(FixedClock::new(test_time())), LedgerSettings::default());
        let id = ledger
            .create_item(ItemDraft {
                code: "MT-002".to_string(),
                name: "Complete toolbox".to_string(),
                category: Category::Tools,
                quantity: 0,
                ..ItemDraft::default()
            })
            .unwrap()
            .id_typed();
        ledger.add_tool(id, "Hammer", 3, "Alice").unwrap();
        ledger
    }

    #[test]
    fn snapshot_carries_collections_and_metadata() {
        let ledger = populated_ledger();
        let snapshot = ledger.snapshot();

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.movements.len(), 2);
        assert_eq!(snapshot.version, "v5");
        assert_eq!(snapshot.location, "Misericordia Building");
        assert_eq!(snapshot.file_name(), "inventory_2025-06-01_10-00-00.json");

        let json: JsonValue = serde_json::from_str(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["exportDate"], "2025-06-01T10:00:00Z");
        assert_eq!(json["items"][0]["tools"][0]["name"], "Hammer");
    }

    #[test]
    fn exported_snapshot_restores_into_a_fresh_ledger() {
        let source = populated_ledger();
        let text = source.snapshot().to_json_pretty().unwrap();

        let mut target =
            LedgerStore::new(Arc::new(FixedClock::new(test_time())), LedgerSettings::default());
        target
            .restore_document(ImportDocument::from_json(&text).unwrap())
            .unwrap();

        assert_eq!(target.items(), source.items());
        assert_eq!(target.movements(), source.movements());
    }

    #[test]
    fn legacy_moviments_field_is_accepted() {
        let doc = ImportDocument::from_value(json!({ "items": [], "moviments": [] })).unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.movements.is_empty());
    }

    #[test]
    fn missing_fields_are_format_errors() {
        let err = ImportDocument::from_value(json!({ "movements": [] })).unwrap_err();
        assert_eq!(err, DomainError::format("missing `items` field"));

        let err = ImportDocument::from_value(json!({ "items": [] })).unwrap_err();
        assert_eq!(err, DomainError::format("missing `movements` field"));

        let err = ImportDocument::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, DomainError::Format(_)));

        let err = ImportDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DomainError::Format(msg) if msg.starts_with("invalid JSON")));
    }
}
