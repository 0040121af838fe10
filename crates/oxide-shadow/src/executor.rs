//! Convergence executor.
//!
//! [`ShadowExecutor`] is the run context: it bundles the schema source, the
//! statement sink, the dialect and the resolved settings, and drives one
//! convergence run over a schema.

use tracing::{debug, error, info, warn};

use crate::config::ShadowConfig;
use crate::descriptor::{ShadowNaming, TableRegistry};
use crate::dialect::{MySqlDialect, ShadowDialect};
use crate::error::{Result, ShadowError};
use crate::introspect::{SchemaSource, StatementSink};
use crate::planner::{plan_schema, TableAction, TablePlan};
use crate::summary::{RunSummary, TableError};

/// Converges the shadow tables of one schema.
pub struct ShadowExecutor<S, X, D = MySqlDialect> {
    source: S,
    sink: X,
    dialect: D,
    config: ShadowConfig,
    naming: ShadowNaming,
}

impl<S: SchemaSource, X: StatementSink> ShadowExecutor<S, X, MySqlDialect> {
    /// Creates an executor using the MySQL dialect.
    ///
    /// Fails with a configuration error before any schema access if the
    /// settings are invalid.
    pub fn new(source: S, sink: X, config: ShadowConfig) -> Result<Self> {
        Self::with_dialect(source, sink, MySqlDialect::new(), config)
    }
}

impl<S: SchemaSource, X: StatementSink, D: ShadowDialect> ShadowExecutor<S, X, D> {
    /// Creates an executor with a specific dialect.
    pub fn with_dialect(source: S, sink: X, dialect: D, config: ShadowConfig) -> Result<Self> {
        config.validate()?;
        let naming = config.naming()?;
        Ok(Self {
            source,
            sink,
            dialect,
            config,
            naming,
        })
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns the statement sink.
    #[must_use]
    pub fn sink(&self) -> &X {
        &self.sink
    }

    /// Takes a snapshot of every table in the schema.
    pub async fn load_registry(&self) -> Result<TableRegistry> {
        TableRegistry::load(&self.source, &self.naming).await
    }

    /// Plans every table without submitting anything.
    pub async fn plan(&self) -> Result<Vec<TablePlan>> {
        let registry = self.load_registry().await?;
        Ok(plan_schema(&registry))
    }

    /// Renders the statements of a plan.
    #[must_use]
    pub fn sql_for(&self, plan: &TablePlan) -> Vec<String> {
        plan.operations
            .iter()
            .map(|op| self.dialect.generate_sql(&self.config.schema, op))
            .collect()
    }

    /// Runs convergence over the whole schema.
    ///
    /// A schema query failure aborts the run. A failed statement abandons the
    /// rest of that table's sequence and is recorded in the summary; the other
    /// tables are still processed.
    pub async fn run(&self) -> Result<RunSummary> {
        warn!(
            schema = %self.config.schema,
            dialect = self.dialect.name(),
            "Starting shadow table maintenance"
        );
        if self.config.dry_run {
            warn!("Running in test mode, no changes will be made");
        }

        let registry = self.load_registry().await?;
        let mut summary = RunSummary::new(&self.config.schema, self.config.dry_run);
        summary.tables = registry.len();

        for plan in plan_schema(&registry) {
            debug!(table = %plan.table, "Checking table");
            if !announce(&plan, &mut summary) {
                continue;
            }

            match self.apply(&plan, &mut summary).await {
                Ok(()) => record_success(&plan, &mut summary),
                Err(err) => {
                    error!(table = %plan.table, error = %err, "Abandoning remaining statements");
                    match TableError::from_error(&err) {
                        Some(table_error) => summary.errors.push(table_error),
                        None => return Err(err),
                    }
                }
            }
        }

        summary.finish();
        info!(
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Shadow table maintenance finished"
        );
        Ok(summary)
    }

    /// Renders and submits the statements of one table, in order.
    async fn apply(&self, plan: &TablePlan, summary: &mut RunSummary) -> Result<()> {
        for operation in &plan.operations {
            let sql = self.dialect.generate_sql(&self.config.schema, operation);
            info!(table = %plan.table, sql = %sql, "{}", operation.describe());
            summary.statements.push(sql.clone());

            if self.config.dry_run {
                continue;
            }
            self.sink
                .execute(&sql)
                .await
                .map_err(|e| ShadowError::execution(&plan.table, &sql, e))?;
        }
        Ok(())
    }
}

/// Logs the decision for a table and counts terminal states.
///
/// Returns true if the table has statements to apply.
fn announce(plan: &TablePlan, summary: &mut RunSummary) -> bool {
    let shadow = plan.shadow.as_deref().unwrap_or_default();
    match &plan.action {
        TableAction::NotEligible => {
            warn!(table = %plan.table, "Skipping table, it can not have a shadow");
            summary.skipped += 1;
            false
        }
        TableAction::Shadow => {
            info!(table = %plan.table, "Table is a shadow table");
            summary.shadows += 1;
            false
        }
        TableAction::OrphanedShadow => {
            warn!(table = %plan.table, "Shadow table has no eligible base table");
            summary.orphaned_shadows += 1;
            false
        }
        TableAction::Unchanged => {
            info!(table = %plan.table, shadow = %shadow, "Shadow table is up to date");
            summary.unchanged += 1;
            false
        }
        TableAction::Create => {
            warn!(table = %plan.table, shadow = %shadow, "Creating new shadow table");
            true
        }
        TableAction::Update(diff) => {
            warn!(
                table = %plan.table,
                shadow = %shadow,
                added = diff.added.len(),
                dropped = diff.removed.len(),
                modified = diff.modified.len(),
                "Shadow table needs an update"
            );
            if diff.changes_column_set() {
                info!(table = %plan.table, "Regenerating triggers");
            }
            true
        }
    }
}

fn record_success(plan: &TablePlan, summary: &mut RunSummary) {
    match &plan.action {
        TableAction::Create => summary.created += 1,
        TableAction::Update(diff) => {
            summary.updated += 1;
            summary.columns_added += diff.added.len();
            summary.columns_dropped += diff.removed.len();
            summary.columns_modified += diff.modified.len();
        }
        _ => return,
    }
    if plan.regenerates_triggers() {
        summary.triggers_regenerated += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::error::StatementError;
    use crate::schema::ColumnDescription;

    #[derive(Default)]
    struct StaticSchema {
        tables: Vec<(String, Vec<ColumnDescription>)>,
    }

    impl StaticSchema {
        fn table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
            let rows = columns
                .iter()
                .map(|(field, ty)| ColumnDescription::new(*field, *ty))
                .collect();
            self.tables.push((name.to_string(), rows));
            self
        }
    }

    impl SchemaSource for StaticSchema {
        async fn list_tables(&self) -> Result<Vec<String>> {
            Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
        }

        async fn describe(&self, table: &str) -> Result<Vec<ColumnDescription>> {
            self.tables
                .iter()
                .find(|(name, _)| name == table)
                .map(|(_, rows)| rows.clone())
                .ok_or_else(|| ShadowError::schema_query(table, "table does not exist"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        executed: Mutex<Vec<String>>,
        failures: HashMap<String, StatementError>,
    }

    impl RecordingSink {
        fn failing_on(prefix: &str) -> Self {
            let mut failures = HashMap::new();
            failures.insert(
                prefix.to_string(),
                StatementError::new(Some("42000".to_string()), "syntax error").with_number(1064),
            );
            Self {
                executed: Mutex::new(Vec::new()),
                failures,
            }
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    impl StatementSink for RecordingSink {
        async fn execute(&self, sql: &str) -> std::result::Result<(), StatementError> {
            self.executed.lock().unwrap().push(sql.to_string());
            match self.failures.iter().find(|(prefix, _)| sql.starts_with(*prefix)) {
                Some((_, err)) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    const USERS: &[(&str, &str)] = &[
        ("id", "int"),
        ("updated_at", "datetime"),
        ("name", "varchar(50)"),
    ];

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = ShadowExecutor::new(
            StaticSchema::default(),
            RecordingSink::default(),
            ShadowConfig::new(""),
        );
        assert!(matches!(result, Err(ShadowError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_run_creates_shadow() {
        let schema = StaticSchema::default().table("users", USERS);
        let executor =
            ShadowExecutor::new(schema, RecordingSink::default(), ShadowConfig::new("app"))
                .unwrap();

        let summary = executor.run().await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.triggers_regenerated, 1);
        assert_eq!(executor.sink().executed(), summary.statements);
        assert_eq!(summary.statements.len(), 5);
        assert!(summary.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let schema = StaticSchema::default().table("users", USERS);
        let executor = ShadowExecutor::new(
            schema,
            RecordingSink::default(),
            ShadowConfig::new("app").dry_run(true),
        )
        .unwrap();

        let summary = executor.run().await.unwrap();

        assert!(executor.sink().executed().is_empty());
        assert_eq!(summary.statements.len(), 5);
        assert!(summary.dry_run);
    }

    #[tokio::test]
    async fn test_failure_abandons_table_but_not_run() {
        let schema = StaticSchema::default()
            .table("accounts", USERS)
            .table("users", USERS);
        let sink = RecordingSink::failing_on("CREATE TABLE app.accounts_shadow");
        let executor = ShadowExecutor::new(schema, sink, ShadowConfig::new("app")).unwrap();

        let summary = executor.run().await.unwrap();

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].table, "accounts");
        assert_eq!(summary.errors[0].code.as_deref(), Some("42000"));
        assert_eq!(summary.errors[0].number, Some(1064));
        assert_eq!(summary.created, 1);
        assert!(!summary.is_success());

        let executed = executor.sink().executed();
        assert!(!executed
            .iter()
            .any(|sql| sql.contains("TRIGGER app.accounts_insert")));
        assert!(executed
            .iter()
            .any(|sql| sql.starts_with("CREATE TRIGGER app.users_update")));
    }

    #[tokio::test]
    async fn test_sql_for_matches_run() {
        let schema = StaticSchema::default().table("users", USERS);
        let executor = ShadowExecutor::new(
            schema,
            RecordingSink::default(),
            ShadowConfig::new("app").dry_run(true),
        )
        .unwrap();

        let plans = executor.plan().await.unwrap();
        let planned: Vec<String> = plans.iter().flat_map(|p| executor.sql_for(p)).collect();
        let summary = executor.run().await.unwrap();
        assert_eq!(planned, summary.statements);
    }
}
