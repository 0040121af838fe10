//! Database dialect implementations.
//!
//! Each dialect knows how to render shadow operations as SQL text for its
//! database. Dialects never execute anything.

mod mysql;

pub use mysql::MySqlDialect;

use crate::operations::{AlterKind, ShadowOperation, TriggerEvent};
use crate::schema::Column;

/// Trait for database-specific SQL generation.
pub trait ShadowDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// `CREATE TABLE` for a shadow table.
    fn create_table_sql(&self, schema: &str, table: &str, columns: &[Column]) -> String;

    /// One `ALTER TABLE` batching every clause of a single kind.
    fn alter_table_sql(
        &self,
        schema: &str,
        table: &str,
        kind: AlterKind,
        columns: &[Column],
    ) -> String;

    /// `DROP TRIGGER` that succeeds when the trigger is absent.
    fn drop_trigger_sql(&self, schema: &str, base_table: &str, event: TriggerEvent) -> String;

    /// `CREATE TRIGGER` copying each new row into the shadow table.
    fn create_trigger_sql(
        &self,
        schema: &str,
        base_table: &str,
        shadow_table: &str,
        event: TriggerEvent,
        columns: &[String],
    ) -> String;

    /// Qualifies an object name with its schema.
    fn qualify(&self, schema: &str, name: &str) -> String {
        format!("{schema}.{name}")
    }

    /// Generates SQL for a shadow operation.
    fn generate_sql(&self, schema: &str, operation: &ShadowOperation) -> String {
        match operation {
            ShadowOperation::CreateTable { table, columns } => {
                self.create_table_sql(schema, table, columns)
            }
            ShadowOperation::AlterTable {
                table,
                kind,
                columns,
            } => self.alter_table_sql(schema, table, *kind, columns),
            ShadowOperation::DropTrigger { table, event } => {
                self.drop_trigger_sql(schema, table, *event)
            }
            ShadowOperation::CreateTrigger {
                table,
                shadow,
                event,
                columns,
            } => self.create_trigger_sql(schema, table, shadow, *event, columns),
        }
    }
}
