//! Ledger store: the single owner of items and movements.
//!
//! Quantity changes go through the reconciler methods (see `reconciler.rs`);
//! this module holds the collections, item lifecycle, and read-side views.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use maintstock_core::{
    Clock, DomainError, DomainResult, ItemId, MovementId, SystemClock, repeated_ids,
};

use crate::item::{Category, Filter, Item, ItemDraft, ItemPatch, ItemStatus};
use crate::movement::{Movement, MovementKind, MovementScope};

/// Metadata stamped on exported snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub location: String,
    pub version: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            location: "Misericordia Building".to_string(),
            version: "v5".to_string(),
        }
    }
}

/// A way in which a pair of collections breaks the ledger invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Discrepancy {
    #[error("item {item_id} has quantity {quantity} but its movements sum to {movement_total}")]
    QuantityMismatch {
        item_id: ItemId,
        quantity: i64,
        movement_total: i64,
    },

    #[error("item {item_id} has negative quantity {quantity}")]
    NegativeQuantity { item_id: ItemId, quantity: i64 },

    #[error("movement {movement_id} references unknown item {item_id}")]
    OrphanMovement {
        movement_id: MovementId,
        item_id: ItemId,
    },

    #[error("item {item_id} lists tool '{tool_name}' with {available} available")]
    EmptyTool {
        item_id: ItemId,
        tool_name: String,
        available: i64,
    },

    #[error("item {item_id} is not in the Tools category but carries a tool list")]
    UnexpectedToolList { item_id: ItemId },

    #[error("item {item_id} holds {tool_units} tool units but has quantity {quantity}")]
    ToolsExceedQuantity {
        item_id: ItemId,
        tool_units: i64,
        quantity: i64,
    },

    #[error("item {item_id} is in the Tools category but has no tool list")]
    MissingToolList { item_id: ItemId },

    #[error("movement {movement_id} ({kind}) has a zero delta")]
    ZeroDeltaMovement {
        movement_id: MovementId,
        kind: MovementKind,
    },

    #[error("item id {0} appears more than once")]
    DuplicateItem(ItemId),

    #[error("movement id {0} appears more than once")]
    DuplicateMovement(MovementId),
}

/// Check a pair of collections against the ledger invariants.
pub fn audit_collections(items: &[Item], movements: &[Movement]) -> Vec<Discrepancy> {
    let mut found = Vec::new();

    found.extend(repeated_ids(items).into_iter().map(Discrepancy::DuplicateItem));
    found.extend(
        repeated_ids(movements)
            .into_iter()
            .map(Discrepancy::DuplicateMovement),
    );

    let mut totals: HashMap<ItemId, i64> = items.iter().map(|it| (it.id, 0)).collect();
    for m in movements {
        if m.delta == 0 && m.kind != MovementKind::Creation {
            found.push(Discrepancy::ZeroDeltaMovement {
                movement_id: m.id,
                kind: m.kind,
            });
        }
        match totals.get_mut(&m.item_id) {
            Some(total) => *total = total.saturating_add(m.delta),
            None => found.push(Discrepancy::OrphanMovement {
                movement_id: m.id,
                item_id: m.item_id,
            }),
        }
    }

    for item in items {
        if item.quantity < 0 {
            found.push(Discrepancy::NegativeQuantity {
                item_id: item.id,
                quantity: item.quantity,
            });
        }

        let movement_total = totals.get(&item.id).copied().unwrap_or(0);
        if movement_total != item.quantity {
            found.push(Discrepancy::QuantityMismatch {
                item_id: item.id,
                quantity: item.quantity,
                movement_total,
            });
        }

        match &item.tools {
            Some(_) if !item.category.holds_tools() => {
                found.push(Discrepancy::UnexpectedToolList { item_id: item.id });
            }
            Some(tools) => {
                let tool_units = item.tool_units();
                if tool_units > item.quantity {
                    found.push(Discrepancy::ToolsExceedQuantity {
                        item_id: item.id,
                        tool_units,
                        quantity: item.quantity,
                    });
                }
                for tool in tools.iter().filter(|t| t.available <= 0) {
                    found.push(Discrepancy::EmptyTool {
                        item_id: item.id,
                        tool_name: tool.name.clone(),
                        available: tool.available,
                    });
                }
            }
            None if item.category.holds_tools() => {
                found.push(Discrepancy::MissingToolList { item_id: item.id });
            }
            None => {}
        }
    }

    found
}

pub(crate) fn require_text(value: &str, field: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// In-memory inventory ledger.
///
/// Owns the canonical item and movement collections. Every mutation either
/// completes fully or returns an error having changed nothing.
#[derive(Debug)]
pub struct LedgerStore {
    items: Vec<Item>,
    movements: Vec<Movement>,
    next_movement_id: MovementId,
    clock: Arc<dyn Clock>,
    settings: LedgerSettings,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::utc()), LedgerSettings::default())
    }
}

impl LedgerStore {
    pub fn new(clock: Arc<dyn Clock>, settings: LedgerSettings) -> Self {
        Self {
            items: Vec::new(),
            movements: Vec::new(),
            next_movement_id: MovementId::new(1),
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Calendar date "now", under the clock's offset.
    pub fn today(&self) -> NaiveDate {
        self.clock.date_of(self.clock.now())
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All movements in recording order.
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn index_of(&self, id: ItemId) -> DomainResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or(DomainError::ItemNotFound(id))
    }

    pub(crate) fn item_at_mut(&mut self, idx: usize) -> &mut Item {
        &mut self.items[idx]
    }

    pub(crate) fn item_at(&self, idx: usize) -> &Item {
        &self.items[idx]
    }

    /// Append a movement. Callers update the item quantity in the same step.
    pub(crate) fn record(
        &mut self,
        item_id: ItemId,
        kind: MovementKind,
        scope: MovementScope,
        delta: i64,
        reason: String,
        actor: String,
        at: DateTime<Utc>,
    ) -> Movement {
        let movement = Movement {
            id: self.next_movement_id,
            item_id,
            kind,
            scope,
            delta,
            reason,
            actor,
            timestamp: at,
        };
        self.next_movement_id = self.next_movement_id.next();
        self.movements.push(movement.clone());
        movement
    }

    /// Create an item together with its Creation movement.
    pub fn create_item(&mut self, draft: ItemDraft) -> DomainResult<Item> {
        let now = self.clock.now();
        let today = self.clock.date_of(now);

        let code = draft.code.trim();
        let name = draft.name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(DomainError::validation("code and name are required"));
        }
        if let Some(date) = draft.review_date {
            if date < today {
                return Err(DomainError::validation(format!(
                    "review date {date} is before today ({today})"
                )));
            }
        }
        let actor = match draft.created_by.trim() {
            "" => "Administrator",
            actor => actor,
        }
        .to_string();

        let quantity = draft.quantity.max(0);
        let item = Item {
            id: ItemId::new(),
            code: code.to_string(),
            name: name.to_string(),
            category: draft.category,
            location: draft.location,
            quantity,
            status: draft.status,
            review_date: draft.review_date,
            notes: draft.notes,
            tools: draft.category.holds_tools().then(Vec::new),
        };

        self.items.push(item.clone());
        let movement = self.record(
            item.id,
            MovementKind::Creation,
            MovementScope::Item,
            quantity,
            "Item created".to_string(),
            actor,
            now,
        );

        tracing::info!(
            item_id = %item.id,
            code = %item.code,
            quantity,
            movement_id = %movement.id,
            "item created"
        );
        Ok(item)
    }

    /// Remove an item and every movement recorded against it.
    pub fn delete_item(&mut self, id: ItemId) -> DomainResult<Item> {
        let idx = self.index_of(id)?;
        let removed = self.items.remove(idx);

        let before = self.movements.len();
        self.movements.retain(|m| m.item_id != id);

        tracing::info!(
            item_id = %id,
            movements_removed = before - self.movements.len(),
            "item deleted"
        );
        Ok(removed)
    }

    /// Apply descriptive edits. Quantity and category are not reachable here.
    pub fn update_item_fields(&mut self, id: ItemId, patch: ItemPatch) -> DomainResult<Item> {
        let idx = self.index_of(id)?;

        if let Some(code) = &patch.code {
            require_text(code, "code")?;
        }
        if let Some(name) = &patch.name {
            require_text(name, "name")?;
        }
        if let Some(Some(date)) = patch.review_date {
            let today = self.today();
            if date < today {
                return Err(DomainError::validation(format!(
                    "review date {date} is before today ({today})"
                )));
            }
        }

        let item = &mut self.items[idx];
        if let Some(code) = patch.code {
            item.code = code.trim().to_string();
        }
        if let Some(name) = patch.name {
            item.name = name.trim().to_string();
        }
        if let Some(location) = patch.location {
            item.location = location;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(review_date) = patch.review_date {
            item.review_date = review_date;
        }
        if let Some(notes) = patch.notes {
            item.notes = notes;
        }

        tracing::debug!(item_id = %id, "item fields updated");
        Ok(item.clone())
    }

    /// Items matching a free-text query plus category and status filters.
    ///
    /// The query is trimmed and matched case-insensitively against name, code
    /// and location. Order follows the underlying collection.
    pub fn list_filtered(
        &self,
        query: &str,
        category: Filter<Category>,
        status: Filter<ItemStatus>,
    ) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|it| it.matches_query(&needle))
            .filter(|it| category.matches(&it.category))
            .filter(|it| status.matches(&it.status))
            .collect()
    }

    /// Movements of one item, most recent first.
    ///
    /// Equal timestamps keep recording order (earlier-recorded first).
    pub fn movements_for(&self, item_id: ItemId) -> Vec<&Movement> {
        let mut history: Vec<&Movement> = self
            .movements
            .iter()
            .filter(|m| m.item_id == item_id)
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        history
    }

    pub fn movement_count(&self, item_id: ItemId) -> usize {
        self.movements.iter().filter(|m| m.item_id == item_id).count()
    }

    /// Whether `item` is due for review within 30 days of `as_of`.
    pub fn needs_review_soon(item: &Item, as_of: NaiveDate) -> bool {
        item.needs_review_soon(as_of)
    }

    pub fn items_due_for_review(&self, as_of: NaiveDate) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|it| it.needs_review_soon(as_of))
            .collect()
    }

    /// Invariant check over the current collections. Empty means consistent.
    pub fn audit(&self) -> Vec<Discrepancy> {
        audit_collections(&self.items, &self.movements)
    }

    /// Replace both collections wholesale.
    ///
    /// Collections that fail [`audit_collections`] are rejected with
    /// [`DomainError::Format`] and the current state is kept.
    pub fn restore(&mut self, items: Vec<Item>, movements: Vec<Movement>) -> DomainResult<()> {
        let discrepancies = audit_collections(&items, &movements);
        if let Some(first) = discrepancies.first() {
            tracing::warn!(
                count = discrepancies.len(),
                first = %first,
                "rejected inconsistent ledger data"
            );
            return Err(DomainError::format(format!(
                "{first} ({} problem(s) in total)",
                discrepancies.len()
            )));
        }

        self.next_movement_id = movements
            .iter()
            .map(|m| m.id)
            .max()
            .map(|id| id.next())
            .unwrap_or(MovementId::new(1));
        self.items = items;
        self.movements = movements;

        tracing::info!(
            items = self.items.len(),
            movements = self.movements.len(),
            "ledger restored"
        );
        Ok(())
    }
}
