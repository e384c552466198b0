//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own. A `Tool` inside a toolbox is
/// one: it only exists as part of its parent item and two tools with the same
/// name and count are interchangeable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
