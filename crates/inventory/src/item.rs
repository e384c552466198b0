use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use maintstock_core::{DomainError, Entity, ItemId, ValueObject};

/// Days ahead of a review date at which an item is flagged for review.
pub const REVIEW_HORIZON_DAYS: i64 = 30;

/// Lowercase and drop separators so `"Good condition"`, `"good-condition"`
/// and `"GoodCondition"` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Inventory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Tools,
    Electrical,
    Plumbing,
    Painting,
    Gardening,
    Cleaning,
    Safety,
    Hvac,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Tools,
        Category::Electrical,
        Category::Plumbing,
        Category::Painting,
        Category::Gardening,
        Category::Cleaning,
        Category::Safety,
        Category::Hvac,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tools => "Tools",
            Category::Electrical => "Electrical",
            Category::Plumbing => "Plumbing",
            Category::Painting => "Painting",
            Category::Gardening => "Gardening",
            Category::Cleaning => "Cleaning",
            Category::Safety => "Safety",
            Category::Hvac => "HVAC",
            Category::Other => "Other",
        }
    }

    /// Only toolbox items carry a nested tool list.
    pub fn holds_tools(&self) -> bool {
        matches!(self, Category::Tools)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Category::ALL
            .into_iter()
            .find(|c| normalize(c.as_str()) == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s}")))
    }
}

/// Physical condition of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    GoodCondition,
    NeedsReview,
    NeedsRepair,
    OutOfService,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::GoodCondition,
        ItemStatus::NeedsReview,
        ItemStatus::NeedsRepair,
        ItemStatus::OutOfService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::GoodCondition => "Good condition",
            ItemStatus::NeedsReview => "Needs review",
            ItemStatus::NeedsRepair => "Needs repair",
            ItemStatus::OutOfService => "Out of service",
        }
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        ItemStatus::ALL
            .into_iter()
            .find(|st| normalize(st.as_str()) == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown status: {s}")))
    }
}

/// A list filter: either everything, or one exact value.
///
/// Parses the sentinel `"all"` (any case) as [`Filter::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

impl<T> FromStr for Filter<T>
where
    T: FromStr<Err = DomainError>,
{
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        s.parse().map(Filter::Only)
    }
}

/// One kind of tool inside a toolbox item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    /// Units on hand. A tool is dropped from its toolbox when this hits zero.
    pub available: i64,
}

impl ValueObject for Tool {}

/// An inventory entry.
///
/// Fields are private: quantity only moves through the ledger so that it
/// always matches the item's movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) category: Category,
    #[serde(default)]
    pub(crate) location: String,
    pub(crate) quantity: i64,
    #[serde(default)]
    pub(crate) status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) review_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tools: Option<Vec<Tool>>,
}

impl Item {
    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn review_date(&self) -> Option<NaiveDate> {
        self.review_date
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Tool list; `None` for anything outside the Tools category.
    pub fn tools(&self) -> Option<&[Tool]> {
        self.tools.as_deref()
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.as_ref()?.iter().find(|t| t.name == name)
    }

    /// Units held in the tool list (0 without one).
    pub fn tool_units(&self) -> i64 {
        self.tools
            .iter()
            .flatten()
            .fold(0i64, |acc, t| acc.saturating_add(t.available))
    }

    /// Whether the review date falls within [`REVIEW_HORIZON_DAYS`] of `as_of`.
    ///
    /// Overdue dates count as due.
    pub fn needs_review_soon(&self, as_of: NaiveDate) -> bool {
        match self.review_date {
            Some(date) => (date - as_of).num_days() <= REVIEW_HORIZON_DAYS,
            None => false,
        }
    }

    /// Case-insensitive substring match on name, code or location.
    ///
    /// `needle` must already be lowercased; an empty needle matches everything.
    pub(crate) fn matches_query(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.code.to_lowercase().contains(needle)
            || self.location.to_lowercase().contains(needle)
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub code: String,
    pub name: String,
    pub category: Category,
    pub location: String,
    /// Initial quantity; negative values are clamped to zero.
    pub quantity: i64,
    pub status: ItemStatus,
    pub review_date: Option<NaiveDate>,
    pub notes: String,
    /// Recorded as the actor of the creation movement.
    pub created_by: String,
}

impl Default for ItemDraft {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            category: Category::Tools,
            location: String::new(),
            quantity: 1,
            status: ItemStatus::GoodCondition,
            review_date: None,
            notes: String::new(),
            created_by: "Administrator".to_string(),
        }
    }
}

/// Field edits that do not touch quantity.
///
/// `None` leaves a field unchanged. `review_date: Some(None)` clears the date.
/// Category is not patchable: it decides whether a tool list exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<ItemStatus>,
    pub review_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

/// Parse a user-typed quantity, mapping anything unusable to zero.
pub fn coerce_quantity(raw: &str) -> i64 {
    raw.trim().parse::<i64>().map(|q| q.max(0)).unwrap_or(0)
}
