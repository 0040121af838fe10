//! Run summary reported back to the caller.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, ShadowError};

/// A statement failure recorded for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableError {
    /// The table whose statement sequence was abandoned.
    pub table: String,
    /// The statement that failed.
    pub statement: String,
    /// SQLSTATE, if any.
    pub code: Option<String>,
    /// Server error number, if any.
    pub number: Option<u16>,
    /// Error message.
    pub message: String,
}

impl TableError {
    /// Extracts the table context from an execution error.
    ///
    /// Returns `None` for errors that are not tied to a statement.
    #[must_use]
    pub fn from_error(error: &ShadowError) -> Option<Self> {
        match error {
            ShadowError::Execution {
                table,
                statement,
                code,
                number,
                message,
            } => Some(Self {
                table: table.clone(),
                statement: statement.clone(),
                code: code.clone(),
                number: *number,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// Counts and statements of one convergence run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Schema that was converged.
    pub schema: String,
    /// Whether statements were only logged.
    pub dry_run: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Tables inspected.
    pub tables: usize,
    /// Shadow tables created.
    pub created: usize,
    /// Shadow tables updated.
    pub updated: usize,
    /// Columns added to existing shadow tables.
    pub columns_added: usize,
    /// Columns dropped from existing shadow tables.
    pub columns_dropped: usize,
    /// Column types modified in existing shadow tables.
    pub columns_modified: usize,
    /// Tables whose triggers were dropped and recreated.
    pub triggers_regenerated: usize,
    /// Tables that cannot be shadowed.
    pub skipped: usize,
    /// Shadow tables already matching their base table.
    pub unchanged: usize,
    /// Shadow tables maintained through an eligible base table.
    pub shadows: usize,
    /// Shadow tables without an eligible base table.
    pub orphaned_shadows: usize,
    /// Every statement rendered, in issue order.
    pub statements: Vec<String>,
    /// Tables whose statement sequence failed.
    pub errors: Vec<TableError>,
}

impl RunSummary {
    /// Starts a summary for a run.
    #[must_use]
    pub fn new(schema: impl Into<String>, dry_run: bool) -> Self {
        Self {
            schema: schema.into(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            tables: 0,
            created: 0,
            updated: 0,
            columns_added: 0,
            columns_dropped: 0,
            columns_modified: 0,
            triggers_regenerated: 0,
            skipped: 0,
            unchanged: 0,
            shadows: 0,
            orphaned_shadows: 0,
            statements: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Marks the run as finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Returns true if every table converged without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serializes the summary as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the summary as pretty JSON to a file.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
