//! Command parsing and execution for the `maintstock` binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};

use maintstock_core::ItemId;
use maintstock_infra::{KeyValueStore, LedgerRepository};
use maintstock_inventory::{
    Category, Filter, ImportDocument, ItemStatus, LedgerStore, MovementKind, MovementRequest,
};

#[derive(Debug, Parser)]
#[command(
    name = "maintstock",
    about = "Maintenance stock ledger: items, tools and their movements",
    version,
    after_help = "<ITEM> is an item id or an item code."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    In,
    Out,
}

impl From<Direction> for MovementKind {
    fn from(value: Direction) -> Self {
        match value {
            Direction::In => MovementKind::Inbound,
            Direction::Out => MovementKind::Outbound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List items matching a text query, category and status
    List {
        /// Matched against name, code and location
        #[arg(default_value = "")]
        query: String,

        /// Category name, or `all`
        #[arg(default_value = "all")]
        category: Filter<Category>,

        /// Status name, or `all`
        #[arg(default_value = "all")]
        status: Filter<ItemStatus>,
    },

    /// Movements of an item, newest first
    History { item: String },

    /// Items due for review within 30 days
    Review,

    /// Record an inbound or outbound movement
    Move {
        item: String,
        #[arg(value_enum)]
        direction: Direction,
        amount: i64,
        reason: String,
        actor: String,
    },

    /// Set an absolute quantity
    Set {
        item: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        reason: String,
        actor: String,
    },

    /// Add units of a tool to a toolbox
    AddTool {
        item: String,
        tool: String,
        count: i64,
        actor: String,
    },

    /// Withdraw units of a tool from a toolbox
    Withdraw {
        item: String,
        tool: String,
        count: i64,
        reason: String,
        actor: String,
    },

    /// Delete an item and its movements
    Delete { item: String },

    /// Print a JSON export to stdout
    Export,

    /// Replace all data with an export file
    Import { path: PathBuf },

    /// Show storage usage
    Usage,
}

/// Result of running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The ledger changed and should be persisted.
    pub mutated: bool,
}

impl Outcome {
    const READ: Outcome = Outcome { mutated: false };
    const WRITE: Outcome = Outcome { mutated: true };
}

/// Find an item by id, falling back to a case-insensitive code match.
fn resolve_item(ledger: &LedgerStore, key: &str) -> anyhow::Result<ItemId> {
    if let Ok(id) = key.parse::<ItemId>() {
        if ledger.item(id).is_some() {
            return Ok(id);
        }
    }
    ledger
        .items()
        .iter()
        .find(|it| it.code().eq_ignore_ascii_case(key.trim()))
        .map(|it| it.id_typed())
        .ok_or_else(|| anyhow!("no item with id or code {key:?}"))
}

pub fn run<S, W>(
    command: Command,
    ledger: &mut LedgerStore,
    repo: &LedgerRepository<S>,
    out: &mut W,
) -> anyhow::Result<Outcome>
where
    S: KeyValueStore,
    W: Write,
{
    match command {
        Command::List {
            query,
            category,
            status,
        } => {
            let today = ledger.today();
            for item in ledger.list_filtered(&query, category, status) {
                let flag = if item.needs_review_soon(today) { "!" } else { " " };
                writeln!(
                    out,
                    "{flag} {:<8} {:<30} {:<11} {:>5}  {:<15} {}  {}",
                    item.code(),
                    item.name(),
                    item.category().as_str(),
                    item.quantity(),
                    item.status().as_str(),
                    item.location(),
                    item.id_typed()
                )?;
                for tool in item.tools().unwrap_or_default() {
                    writeln!(out, "    - {} x{}", tool.name, tool.available)?;
                }
            }
            Ok(Outcome::READ)
        }
        Command::History { item } => {
            let id = resolve_item(ledger, &item)?;
            for movement in ledger.movements_for(id) {
                writeln!(out, "{movement}")?;
            }
            Ok(Outcome::READ)
        }
        Command::Review => {
            let today = ledger.today();
            for item in ledger.items_due_for_review(today) {
                let date = item
                    .review_date()
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                writeln!(out, "{date}  {}  {}", item.code(), item.name())?;
            }
            Ok(Outcome::READ)
        }
        Command::Move {
            item,
            direction,
            amount,
            reason,
            actor,
        } => {
            let item_id = resolve_item(ledger, &item)?;
            let recorded = ledger.apply_movement(MovementRequest {
                item_id,
                kind: direction.into(),
                delta: amount,
                reason,
                actor,
            })?;
            report_movement(ledger, item_id, recorded.is_some(), out)
        }
        Command::Set {
            item,
            quantity,
            reason,
            actor,
        } => {
            let item_id = resolve_item(ledger, &item)?;
            let recorded = match ledger.plan_quantity_change(item_id, quantity)? {
                Some(pending) => ledger.commit_pending(pending, reason, actor)?.is_some(),
                None => false,
            };
            report_movement(ledger, item_id, recorded, out)
        }
        Command::AddTool {
            item,
            tool,
            count,
            actor,
        } => {
            let item_id = resolve_item(ledger, &item)?;
            ledger.add_tool(item_id, &tool, count, &actor)?;
            report_movement(ledger, item_id, true, out)
        }
        Command::Withdraw {
            item,
            tool,
            count,
            reason,
            actor,
        } => {
            let item_id = resolve_item(ledger, &item)?;
            ledger.withdraw_tool(item_id, &tool, count, &reason, &actor)?;
            report_movement(ledger, item_id, true, out)
        }
        Command::Delete { item } => {
            let item_id = resolve_item(ledger, &item)?;
            let removed = ledger.delete_item(item_id)?;
            writeln!(out, "deleted {} {}", removed.code(), removed.name())?;
            Ok(Outcome::WRITE)
        }
        Command::Export => {
            let snapshot = ledger.snapshot();
            writeln!(out, "{}", snapshot.to_json_pretty()?)?;
            tracing::info!(file_name = %snapshot.file_name(), "export written to stdout");
            Ok(Outcome::READ)
        }
        Command::Import { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let document = ImportDocument::from_json(&text)?;
            ledger.restore_document(document)?;
            writeln!(
                out,
                "imported {} items and {} movements",
                ledger.items().len(),
                ledger.movements().len()
            )?;
            Ok(Outcome::WRITE)
        }
        Command::Usage => {
            writeln!(out, "{}", repo.usage()?)?;
            Ok(Outcome::READ)
        }
    }
}

fn report_movement<W: Write>(
    ledger: &LedgerStore,
    item_id: ItemId,
    recorded: bool,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    let quantity = ledger.item(item_id).map(|it| it.quantity()).unwrap_or(0);
    if recorded {
        writeln!(out, "quantity now {quantity}")?;
        Ok(Outcome::WRITE)
    } else {
        writeln!(out, "no change (quantity {quantity})")?;
        Ok(Outcome::READ)
    }
}
