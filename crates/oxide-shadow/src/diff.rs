//! Column diff between a base table and its shadow.
//!
//! The base table is authoritative. Types are compared as exact strings, so
//! `varchar(255)` and `VARCHAR(255)` count as different types. Names are
//! matched the way [`ColumnModel`] looks them up, so a column renamed only in
//! case is the same column.

use serde::Serialize;

use crate::schema::ColumnModel;

/// The divergence between a base table's columns and its shadow's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnDiff {
    /// Columns in the base table that the shadow lacks (base types).
    pub added: ColumnModel,
    /// Columns in the shadow that the base table no longer has (shadow types).
    pub removed: ColumnModel,
    /// Columns in both whose types differ (base types).
    pub modified: ColumnModel,
}

impl ColumnDiff {
    /// Returns true if the shadow already matches the base table.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Returns true if the column set changed, which makes the field lists
    /// baked into the triggers stale. Type-only changes do not.
    #[must_use]
    pub fn changes_column_set(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Compares `authoritative` (base) columns against `candidate` (shadow)
/// columns.
#[must_use]
pub fn diff_columns(authoritative: &ColumnModel, candidate: &ColumnModel) -> ColumnDiff {
    let mut diff = ColumnDiff::default();

    for column in authoritative {
        match candidate.get(&column.name) {
            None => diff.added.insert(column.clone()),
            Some(ty) if ty != column.sql_type => diff.modified.insert(column.clone()),
            Some(_) => {}
        }
    }

    diff.removed = candidate
        .iter()
        .filter(|c| !authoritative.contains(&c.name))
        .cloned()
        .collect::<ColumnModel>();

    diff
}
