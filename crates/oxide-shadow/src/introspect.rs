//! Database collaborator traits.
//!
//! The convergence engine only needs two things from a database: a way to
//! read table structure and a way to submit statement text. Driver modules
//! (see [`crate::mysql`]) implement these traits; tests substitute in-memory
//! fakes.

use crate::error::{Result, StatementError};
use crate::schema::ColumnDescription;

/// Reads the structure of the tables in one schema.
#[allow(async_fn_in_trait)]
pub trait SchemaSource {
    /// Returns the names of all tables in the schema.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Returns the ordered column descriptions of one table.
    ///
    /// Fails with [`ShadowError::SchemaQuery`](crate::error::ShadowError::SchemaQuery)
    /// when the table cannot be described.
    async fn describe(&self, table: &str) -> Result<Vec<ColumnDescription>>;
}

/// Submits DDL/DML statements. No result rows are consumed.
#[allow(async_fn_in_trait)]
pub trait StatementSink {
    /// Executes a single statement.
    async fn execute(&self, sql: &str) -> std::result::Result<(), StatementError>;
}
