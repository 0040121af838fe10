//! MySQL dialect for shadow tables.
//!
//! Shadow columns carry only the name and the raw type reported by the
//! server. Identifiers are emitted as-is, qualified with the schema name.

use crate::operations::{AlterKind, TriggerEvent};
use crate::schema::Column;

use super::ShadowDialect;

/// MySQL shadow dialect.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one `ALTER TABLE` clause.
    fn alter_clause(&self, kind: AlterKind, column: &Column) -> String {
        match kind {
            AlterKind::Add => format!("ADD COLUMN {} {}", column.name, column.sql_type),
            AlterKind::Drop => format!("DROP COLUMN {}", column.name),
            AlterKind::Modify => format!("MODIFY COLUMN {} {}", column.name, column.sql_type),
        }
    }
}

impl ShadowDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn create_table_sql(&self, schema: &str, table: &str, columns: &[Column]) -> String {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect();
        format!(
            "CREATE TABLE {} ( {} )",
            self.qualify(schema, table),
            fields.join(", ")
        )
    }

    fn alter_table_sql(
        &self,
        schema: &str,
        table: &str,
        kind: AlterKind,
        columns: &[Column],
    ) -> String {
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| self.alter_clause(kind, c))
            .collect();
        format!(
            "ALTER TABLE {} {}",
            self.qualify(schema, table),
            clauses.join(", ")
        )
    }

    fn drop_trigger_sql(&self, schema: &str, base_table: &str, event: TriggerEvent) -> String {
        format!(
            "DROP TRIGGER IF EXISTS {}",
            self.qualify(schema, &event.trigger_name(base_table))
        )
    }

    fn create_trigger_sql(
        &self,
        schema: &str,
        base_table: &str,
        shadow_table: &str,
        event: TriggerEvent,
        columns: &[String],
    ) -> String {
        let new_values: Vec<String> = columns.iter().map(|c| format!("new.{c}")).collect();
        format!(
            "CREATE TRIGGER {} AFTER {} ON {} FOR EACH ROW INSERT INTO {} ( {} ) VALUES ( {} )",
            self.qualify(schema, &event.trigger_name(base_table)),
            event.keyword(),
            self.qualify(schema, base_table),
            self.qualify(schema, shadow_table),
            columns.join(", "),
            new_values.join(", ")
        )
    }
}
