//! Inventory ledger for a maintenance department.
//!
//! This crate contains the business rules for items, their movement history
//! and toolbox sub-inventories, implemented purely as deterministic domain
//! logic (no IO, no storage).

pub mod item;
pub mod ledger;
pub mod movement;
pub mod reconciler;
pub mod snapshot;

pub use item::{
    Category, Filter, Item, ItemDraft, ItemPatch, ItemStatus, REVIEW_HORIZON_DAYS, Tool,
    coerce_quantity,
};
pub use ledger::{Discrepancy, LedgerSettings, LedgerStore, audit_collections};
pub use movement::{Movement, MovementKind, MovementScope, StandardReason};
pub use reconciler::{MovementRequest, PendingMovement};
pub use snapshot::{ImportDocument, Snapshot, export_file_name};
