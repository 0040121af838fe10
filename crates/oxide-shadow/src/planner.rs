//! Per-table convergence decisions.
//!
//! Planning is pure: it looks at the registry snapshot and decides, for each
//! table, whether its shadow must be created, updated, or left alone, and
//! which operations that takes. Nothing is rendered or executed here.

use crate::descriptor::{TableDescriptor, TableRegistry};
use crate::diff::{diff_columns, ColumnDiff};
use crate::operations::{AlterKind, ShadowOperation};

/// What convergence does with one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    /// A base table without `id` and `updated_at`.
    NotEligible,
    /// A shadow table whose base table is eligible. Maintained through its
    /// base table.
    Shadow,
    /// A shadow table with no eligible base table. Left untouched.
    OrphanedShadow,
    /// The shadow table is missing and will be created with its triggers.
    Create,
    /// The shadow table diverged from its base table.
    Update(ColumnDiff),
    /// The shadow table matches its base table.
    Unchanged,
}

/// The decision and operations for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    /// The physical table this plan was made for.
    pub table: String,
    /// The shadow table name, for eligible tables.
    pub shadow: Option<String>,
    /// The decision.
    pub action: TableAction,
    /// Operations to issue, in order.
    pub operations: Vec<ShadowOperation>,
}

impl TablePlan {
    fn without_operations(table: &TableDescriptor, action: TableAction) -> Self {
        Self {
            table: table.table_name().to_string(),
            shadow: table.shadow_name().map(str::to_string),
            action,
            operations: Vec::new(),
        }
    }

    /// Returns true if the triggers are dropped and recreated.
    #[must_use]
    pub fn regenerates_triggers(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, ShadowOperation::CreateTrigger { .. }))
    }
}

/// Plans every table of the registry, in registry order.
#[must_use]
pub fn plan_schema(registry: &TableRegistry) -> Vec<TablePlan> {
    registry
        .iter()
        .map(|table| plan_table(table, registry))
        .collect()
}

/// Plans one table against the registry snapshot.
#[must_use]
pub fn plan_table(table: &TableDescriptor, registry: &TableRegistry) -> TablePlan {
    let Some(target) = table.shadow_target() else {
        let action = if !table.is_shadow() {
            TableAction::NotEligible
        } else if has_eligible_base(table, registry) {
            TableAction::Shadow
        } else {
            TableAction::OrphanedShadow
        };
        return TablePlan::without_operations(table, action);
    };

    let Some(shadow) = registry.shadow_of(table) else {
        let mut operations = vec![ShadowOperation::create_table(&target)];
        operations.extend(ShadowOperation::regenerate_triggers(&target));
        return TablePlan {
            table: table.table_name().to_string(),
            shadow: Some(target.shadow_name.to_string()),
            action: TableAction::Create,
            operations,
        };
    };

    let diff = diff_columns(table.columns(), shadow.columns());
    if diff.is_unchanged() {
        return TablePlan::without_operations(table, TableAction::Unchanged);
    }

    // Add before drop so columns referenced by the current triggers are not
    // removed before new ones exist.
    let mut operations: Vec<ShadowOperation> = AlterKind::ORDER
        .iter()
        .filter_map(|&kind| {
            let columns = match kind {
                AlterKind::Add => &diff.added,
                AlterKind::Drop => &diff.removed,
                AlterKind::Modify => &diff.modified,
            };
            ShadowOperation::alter_table(target.shadow_name, columns, kind)
        })
        .collect();

    if diff.changes_column_set() {
        operations.extend(ShadowOperation::regenerate_triggers(&target));
    }

    TablePlan {
        table: table.table_name().to_string(),
        shadow: Some(target.shadow_name.to_string()),
        action: TableAction::Update(diff),
        operations,
    }
}

fn has_eligible_base(shadow: &TableDescriptor, registry: &TableRegistry) -> bool {
    registry
        .get(shadow.base_name())
        .and_then(TableDescriptor::shadow_name)
        .is_some_and(|name| name == shadow.table_name())
}
