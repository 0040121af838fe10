//! Table descriptors and the per-run table registry.
//!
//! A [`TableDescriptor`] knows about one table in the schema: whether it is a
//! shadow table, whether it can be shadowed, and what its columns are. The
//! [`TableRegistry`] holds a descriptor for every table, taken as a snapshot
//! before any statement is issued.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, ShadowError};
use crate::introspect::SchemaSource;
use crate::schema::{ColumnDescription, ColumnModel};

/// Column every shadowable table must have.
pub const ID_COLUMN: &str = "id";

/// Timestamp column every shadowable table must have.
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Default table name suffix that marks a shadow table.
pub const DEFAULT_SHADOW_SUFFIX: &str = "_shadow";

/// Maps base table names to shadow table names and back.
///
/// A table is a shadow table when its name is a non-empty base name followed
/// by the suffix. The suffix match ignores ASCII case.
#[derive(Debug, Clone)]
pub struct ShadowNaming {
    suffix: String,
    pattern: Regex,
}

impl ShadowNaming {
    /// Creates the naming rules for a suffix.
    pub fn new(suffix: impl Into<String>) -> Result<Self> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            return Err(ShadowError::Configuration(
                "shadow suffix must not be empty".to_string(),
            ));
        }
        if !suffix.is_ascii() {
            return Err(ShadowError::Configuration(format!(
                "shadow suffix must be ASCII: {suffix}"
            )));
        }
        // Unicode mode is off inside the group so only ASCII letters fold.
        let pattern = Regex::new(&format!("^(.+)(?i-u:{})$", regex::escape(&suffix)))
            .map_err(|e| ShadowError::Configuration(format!("invalid shadow suffix: {e}")))?;
        Ok(Self { suffix, pattern })
    }

    /// Returns the configured suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns true if the table name denotes a shadow table.
    #[must_use]
    pub fn is_shadow(&self, table_name: &str) -> bool {
        self.pattern.is_match(table_name)
    }

    /// Strips the suffix from a shadow table name.
    ///
    /// Returns `None` if the name is not a shadow table name.
    #[must_use]
    pub fn strip_suffix<'a>(&self, table_name: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(table_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Appends the suffix to a base table name.
    #[must_use]
    pub fn add_suffix(&self, base_name: &str) -> String {
        format!("{base_name}{}", self.suffix)
    }
}

/// The names and columns needed to render DDL for an eligible table.
#[derive(Debug, Clone, Copy)]
pub struct ShadowTarget<'a> {
    /// The base table being mirrored.
    pub base_name: &'a str,
    /// The shadow table receiving rows.
    pub shadow_name: &'a str,
    /// The base table's columns.
    pub columns: &'a ColumnModel,
}

/// One physical table as it was when inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    table_name: String,
    base_name: String,
    shadow_name: Option<String>,
    is_shadow: bool,
    has_id: bool,
    has_updated_at: bool,
    columns: ColumnModel,
}

impl TableDescriptor {
    /// Builds a descriptor from the rows of a table description.
    pub fn from_description(
        table_name: impl Into<String>,
        rows: impl IntoIterator<Item = ColumnDescription>,
        naming: &ShadowNaming,
    ) -> Self {
        let table_name = table_name.into();
        let stripped = naming.strip_suffix(&table_name).map(str::to_string);
        let is_shadow = stripped.is_some();

        let mut has_id = false;
        let mut has_updated_at = false;
        let mut columns = ColumnModel::new();
        for row in rows {
            // Shadows are never shadowed themselves, so eligibility is only
            // tracked for base tables.
            if !is_shadow {
                match row.field.as_str() {
                    ID_COLUMN => has_id = true,
                    UPDATED_AT_COLUMN => has_updated_at = true,
                    _ => {}
                }
            }
            columns.insert(row.to_column());
        }

        let base_name = stripped.unwrap_or_else(|| table_name.clone());
        let shadow_name = (has_id && has_updated_at).then(|| naming.add_suffix(&base_name));

        Self {
            table_name,
            base_name,
            shadow_name,
            is_shadow,
            has_id,
            has_updated_at,
            columns,
        }
    }

    /// Describes a table through the schema source.
    pub async fn describe<S: SchemaSource>(
        source: &S,
        table_name: &str,
        naming: &ShadowNaming,
    ) -> Result<Self> {
        let rows = source.describe(table_name).await?;
        let descriptor = Self::from_description(table_name, rows, naming);
        debug!(
            table = %table_name,
            columns = descriptor.column_count(),
            is_shadow = descriptor.is_shadow(),
            has_id = descriptor.has_id(),
            has_updated_at = descriptor.has_updated_at(),
            "Described table"
        );
        Ok(descriptor)
    }

    /// The physical table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The name with the shadow suffix stripped (the table name itself for
    /// base tables).
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The shadow table name. Present only for eligible tables.
    #[must_use]
    pub fn shadow_name(&self) -> Option<&str> {
        self.shadow_name.as_deref()
    }

    /// True if this table is itself a shadow table.
    #[must_use]
    pub fn is_shadow(&self) -> bool {
        self.is_shadow
    }

    /// True if this table can have a shadow.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.shadow_name.is_some()
    }

    /// True if a base table has an `id` column.
    #[must_use]
    pub fn has_id(&self) -> bool {
        self.has_id
    }

    /// True if a base table has an `updated_at` column.
    #[must_use]
    pub fn has_updated_at(&self) -> bool {
        self.has_updated_at
    }

    /// The table's columns.
    #[must_use]
    pub fn columns(&self) -> &ColumnModel {
        &self.columns
    }

    /// Number of columns reported for the table.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the rendering target, if the table is eligible.
    #[must_use]
    pub fn shadow_target(&self) -> Option<ShadowTarget<'_>> {
        self.shadow_name.as_deref().map(|shadow_name| ShadowTarget {
            base_name: &self.base_name,
            shadow_name,
            columns: &self.columns,
        })
    }
}

/// Every table of a schema, in listing order, with lookup by exact name.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<TableDescriptor>,
    index: HashMap<String, usize>,
}

impl TableRegistry {
    /// Creates a registry from descriptors.
    #[must_use]
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        let index = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.table_name.clone(), i))
            .collect();
        Self { tables, index }
    }

    /// Lists and describes every table through the schema source.
    ///
    /// Any failure aborts loading: a partial registry could pair base tables
    /// with the wrong shadows.
    pub async fn load<S: SchemaSource>(source: &S, naming: &ShadowNaming) -> Result<Self> {
        let names = source.list_tables().await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            tables.push(TableDescriptor::describe(source, name, naming).await?);
        }
        Ok(Self::new(tables))
    }

    /// Gets a table by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableDescriptor> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    /// Finds the existing shadow of an eligible table.
    #[must_use]
    pub fn shadow_of(&self, table: &TableDescriptor) -> Option<&TableDescriptor> {
        table.shadow_name().and_then(|name| self.get(name))
    }

    /// Iterates over all tables in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the schema has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
