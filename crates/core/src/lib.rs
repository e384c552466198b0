//! `maintstock-core`: identifiers, errors, time and the entity traits shared
//! by the inventory crates. No I/O.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{Entity, repeated_ids};
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, MovementId};
pub use value_object::ValueObject;
