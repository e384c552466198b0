//! Records with identity.

use std::collections::HashSet;
use std::hash::Hash;

/// A record that keeps its identity across state changes.
///
/// Items and movements are entities: two records with equal fields but
/// different ids are different records.
pub trait Entity {
    type Id: Copy + Eq + Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}

/// Ids that occur more than once in `records`, in order of their second
/// occurrence.
pub fn repeated_ids<E: Entity>(records: &[E]) -> Vec<E::Id> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| *r.id())
        .filter(|id| !seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(u32);

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.0
        }
    }

    #[test]
    fn repeated_ids_reports_each_extra_occurrence() {
        let rows = [Row(1), Row(2), Row(1), Row(3), Row(1)];
        assert_eq!(repeated_ids(&rows), vec![1, 1]);
        assert!(repeated_ids::<Row>(&[]).is_empty());
    }
}
