//! Audit shadow tables for MySQL schemas.
//!
//! `oxide-shadow` keeps a `<table>_shadow` table next to every eligible base
//! table and installs `AFTER INSERT` / `AFTER UPDATE` triggers that copy each
//! written row into it. A table is eligible when it has both an `id` and an
//! `updated_at` column and is not itself a shadow table.
//!
//! Each run:
//! - Takes a snapshot of every table in the schema ([`TableRegistry`])
//! - Creates missing shadow tables together with their triggers
//! - Diffs existing shadows against their base tables and issues the minimal
//!   `ALTER TABLE` statements (add, then drop, then modify)
//! - Regenerates triggers when the column set changed
//!
//! Running again against an unchanged schema issues no statements.
//!
//! # Architecture
//!
//! - **Schema** - Columns and column models, with raw type strings
//! - **Descriptor** - Per-table naming and eligibility, plus the registry
//! - **Diff** - Added, removed and modified columns between base and shadow
//! - **Operations** / **Dialect** - Statement-level changes and their SQL
//! - **Planner** - The per-table create/update/skip decision
//! - **Executor** - Drives a run through the database collaborators
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_shadow::prelude::*;
//!
//! let db = MySqlDatabase::connect(options, "app").await?;
//! let executor = ShadowExecutor::new(db.clone(), db, ShadowConfig::new("app").dry_run(true))?;
//! let summary = executor.run().await?;
//! for sql in &summary.statements {
//!     println!("{sql};");
//! }
//! ```
//!
//! [`TableRegistry`]: descriptor::TableRegistry

pub mod config;
pub mod descriptor;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod mysql;
pub mod operations;
pub mod planner;
pub mod schema;
pub mod summary;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::ShadowConfig;
    pub use crate::descriptor::{
        ShadowNaming, ShadowTarget, TableDescriptor, TableRegistry, DEFAULT_SHADOW_SUFFIX,
    };
    pub use crate::dialect::{MySqlDialect, ShadowDialect};
    pub use crate::diff::{diff_columns, ColumnDiff};
    pub use crate::error::{Result, ShadowError, StatementError};
    pub use crate::executor::ShadowExecutor;
    pub use crate::introspect::{SchemaSource, StatementSink};
    pub use crate::mysql::MySqlDatabase;
    pub use crate::operations::{AlterKind, ShadowOperation, TriggerEvent};
    pub use crate::planner::{plan_schema, plan_table, TableAction, TablePlan};
    pub use crate::schema::{Column, ColumnDescription, ColumnModel};
    pub use crate::summary::{RunSummary, TableError};
}
