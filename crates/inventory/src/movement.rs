use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maintstock_core::{Entity, ItemId, MovementId};

/// Reasons offered to users when recording a movement by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardReason {
    Restock,
    MaintenanceUse,
    Correction,
    Other,
}

impl StandardReason {
    pub const ALL: [StandardReason; 4] = [
        StandardReason::Restock,
        StandardReason::MaintenanceUse,
        StandardReason::Correction,
        StandardReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StandardReason::Restock => "Restock",
            StandardReason::MaintenanceUse => "Maintenance use",
            StandardReason::Correction => "Correction",
            StandardReason::Other => "Other",
        }
    }
}

impl core::fmt::Display for StandardReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of stock change a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Paired with item creation; the delta is the initial quantity.
    Creation,
    Inbound,
    Outbound,
    /// Tools taken out of a toolbox.
    Withdrawal,
}

impl MovementKind {
    /// Outbound and Withdrawal remove stock; their requested delta is a magnitude.
    pub fn is_removal(&self) -> bool {
        matches!(self, MovementKind::Outbound | MovementKind::Withdrawal)
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            MovementKind::Creation => "Creation",
            MovementKind::Inbound => "Inbound",
            MovementKind::Outbound => "Outbound",
            MovementKind::Withdrawal => "Withdrawal",
        };
        f.write_str(s)
    }
}

/// Whether a movement touched the item as a whole or one tool inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MovementScope {
    #[default]
    Item,
    Tool {
        #[serde(rename = "toolName")]
        tool_name: String,
    },
}

impl MovementScope {
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool {
            tool_name: name.into(),
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            MovementScope::Item => None,
            MovementScope::Tool { tool_name } => Some(tool_name),
        }
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, MovementScope::Tool { .. })
    }
}

/// Immutable record of one quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub(crate) id: MovementId,
    pub(crate) item_id: ItemId,
    pub(crate) kind: MovementKind,
    #[serde(default)]
    pub(crate) scope: MovementScope,
    pub(crate) delta: i64,
    pub(crate) reason: String,
    pub(crate) actor: String,
    pub(crate) timestamp: DateTime<Utc>,
}

impl Movement {
    pub fn id_typed(&self) -> MovementId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn scope(&self) -> &MovementScope {
        &self.scope
    }

    /// Signed change applied to the item quantity.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Movement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {} ({:+}) {} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.kind,
            self.delta,
            self.reason,
            self.actor,
            self.id
        )
    }
}
