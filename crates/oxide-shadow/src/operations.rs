//! Shadow maintenance operations.
//!
//! Each operation is one statement against the schema. Operations carry
//! everything a [`ShadowDialect`](crate::dialect::ShadowDialect) needs to
//! render them, so planning and rendering stay independent.

use std::fmt;

use serde::Serialize;

use crate::descriptor::ShadowTarget;
use crate::schema::{Column, ColumnModel};

/// The row event a shadow trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEvent {
    /// `AFTER INSERT`.
    Insert,
    /// `AFTER UPDATE`.
    Update,
}

impl TriggerEvent {
    /// Both events, in the order triggers are installed.
    pub const ALL: [Self; 2] = [Self::Insert, Self::Update];

    /// Lowercase name used in trigger names (`users_insert`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }

    /// SQL keyword used in the trigger timing clause.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
        }
    }

    /// Returns the trigger name for a base table.
    ///
    /// Drop-and-recreate depends on this name being reconstructed exactly.
    #[must_use]
    pub fn trigger_name(&self, base_name: &str) -> String {
        format!("{base_name}_{}", self.as_str())
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The clause kind of an `ALTER TABLE` batch.
///
/// Kinds are never mixed within one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlterKind {
    /// `ADD COLUMN name type`.
    Add,
    /// `DROP COLUMN name`.
    Drop,
    /// `MODIFY COLUMN name type`.
    Modify,
}

impl AlterKind {
    /// The order in which alter batches are issued for one table.
    pub const ORDER: [Self; 3] = [Self::Add, Self::Drop, Self::Modify];
}

impl fmt::Display for AlterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Drop => "drop",
            Self::Modify => "modify",
        })
    }
}

/// A single statement-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ShadowOperation {
    /// Create a shadow table mirroring the base table's columns.
    CreateTable {
        /// Shadow table name.
        table: String,
        /// Columns, in base table order.
        columns: Vec<Column>,
    },
    /// Alter a shadow table with clauses of a single kind.
    AlterTable {
        /// Shadow table name.
        table: String,
        /// Clause kind.
        kind: AlterKind,
        /// Affected columns.
        columns: Vec<Column>,
    },
    /// Drop a shadow trigger if it exists.
    DropTrigger {
        /// Base table the trigger is attached to.
        table: String,
        /// Trigger event.
        event: TriggerEvent,
    },
    /// Create a trigger copying each new row into the shadow table.
    CreateTrigger {
        /// Base table the trigger is attached to.
        table: String,
        /// Shadow table receiving the rows.
        shadow: String,
        /// Trigger event.
        event: TriggerEvent,
        /// Column names copied, in base table order.
        columns: Vec<String>,
    },
}

impl ShadowOperation {
    /// Creates the shadow table for an eligible table.
    #[must_use]
    pub fn create_table(target: &ShadowTarget<'_>) -> Self {
        Self::CreateTable {
            table: target.shadow_name.to_string(),
            columns: target.columns.as_slice().to_vec(),
        }
    }

    /// Alters a shadow table. Returns `None` when there is nothing to alter.
    #[must_use]
    pub fn alter_table(shadow_name: &str, columns: &ColumnModel, kind: AlterKind) -> Option<Self> {
        if columns.is_empty() {
            return None;
        }
        Some(Self::AlterTable {
            table: shadow_name.to_string(),
            kind,
            columns: columns.as_slice().to_vec(),
        })
    }

    /// Drops a trigger on a base table.
    #[must_use]
    pub fn drop_trigger(base_name: &str, event: TriggerEvent) -> Self {
        Self::DropTrigger {
            table: base_name.to_string(),
            event,
        }
    }

    /// Creates a trigger on an eligible table.
    #[must_use]
    pub fn create_trigger(target: &ShadowTarget<'_>, event: TriggerEvent) -> Self {
        Self::CreateTrigger {
            table: target.base_name.to_string(),
            shadow: target.shadow_name.to_string(),
            event,
            columns: target.columns.names().map(str::to_string).collect(),
        }
    }

    /// Drop-then-create for both triggers, so installation is idempotent
    /// even when an earlier partial run left triggers behind.
    #[must_use]
    pub fn regenerate_triggers(target: &ShadowTarget<'_>) -> Vec<Self> {
        TriggerEvent::ALL
            .iter()
            .flat_map(|&event| {
                [
                    Self::drop_trigger(target.base_name, event),
                    Self::create_trigger(target, event),
                ]
            })
            .collect()
    }

    /// Returns a short description of the operation.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable { table, columns } => {
                format!("Create table {table} with {} column(s)", columns.len())
            }
            Self::AlterTable {
                table,
                kind,
                columns,
            } => format!("Alter table {table}: {kind} {} column(s)", columns.len()),
            Self::DropTrigger { table, event } => {
                format!("Drop trigger {}", event.trigger_name(table))
            }
            Self::CreateTrigger { table, event, .. } => {
                format!("Create trigger {}", event.trigger_name(table))
            }
        }
    }
}
