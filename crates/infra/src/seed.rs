//! Sample data for a first run.
//!
//! Built through the normal ledger operations, so the seeded items come with
//! the movements that explain their quantities.

use maintstock_core::DomainResult;
use maintstock_inventory::{Category, ItemDraft, ItemStatus, LedgerStore};

const SEED_ACTOR: &str = "Administrator";

/// Add the two sample toolboxes to `ledger`.
pub fn seed_sample(ledger: &mut LedgerStore) -> DomainResult<()> {
    let today = ledger.today();

    let ladders = ledger.create_item(ItemDraft {
        code: "MT-001".to_string(),
        name: "Ladders".to_string(),
        category: Category::Tools,
        location: "Ground floor store (45m²) - large tools area".to_string(),
        quantity: 0,
        status: ItemStatus::GoodCondition,
        review_date: Some(today + chrono::Duration::days(90)),
        notes: "General ladder inventory. Dedicated space: 8m²".to_string(),
        created_by: SEED_ACTOR.to_string(),
    })?;
    for (tool, count) in [
        ("Telescopic ladder 3.8m HAILO ProfiLot", 1),
        ("Single ladder 2m", 2),
        ("Double ladder 1.5m aluminium ZARGES", 1),
    ] {
        ledger.add_tool(ladders.id_typed(), tool, count, SEED_ACTOR)?;
    }

    let toolbox = ledger.create_item(ItemDraft {
        code: "MT-002".to_string(),
        name: "Complete toolbox".to_string(),
        category: Category::Tools,
        location: "Ground floor store".to_string(),
        quantity: 0,
        status: ItemStatus::NeedsReview,
        review_date: Some(today + chrono::Duration::days(20)),
        notes: "Allen keys missing".to_string(),
        created_by: SEED_ACTOR.to_string(),
    })?;
    ledger.add_tool(toolbox.id_typed(), "Hammer", 3, SEED_ACTOR)?;

    tracing::info!(items = ledger.items().len(), "sample inventory seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_ledger_is_consistent() {
        let mut ledger = LedgerStore::default();
        seed_sample(&mut ledger).unwrap();

        assert_eq!(ledger.items().len(), 2);
        assert!(ledger.audit().is_empty());

        let ladders = &ledger.items()[0];
        assert_eq!(ladders.quantity(), 4);
        assert_eq!(ladders.tools().map(<[_]>::len), Some(3));

        let due = ledger.items_due_for_review(ledger.today());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].code(), "MT-002");
    }
}
