#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use oxide_shadow::prelude::*;

pub const SCHEMA: &str = "app";

pub const USERS: &[(&str, &str)] = &[
    ("id", "int"),
    ("updated_at", "datetime"),
    ("name", "varchar(50)"),
];

/// An in-memory schema that applies the statements it receives.
///
/// Only understands the statement shapes the MySQL dialect renders, which is
/// enough to check that a run converges. Column names are matched without
/// regard to ASCII case, as MySQL does.
#[derive(Default)]
pub struct FakeDatabase {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    tables: Vec<(String, Vec<(String, String)>)>,
    triggers: BTreeSet<String>,
    executed: Vec<String>,
    fail_prefix: Option<String>,
    undescribable: Option<String>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: &[(&str, &str)]) -> Self {
        self.state.lock().unwrap().tables.push((
            name.to_string(),
            columns
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
        ));
        self
    }

    pub fn with_trigger(self, name: &str) -> Self {
        self.state.lock().unwrap().triggers.insert(name.to_string());
        self
    }

    /// Fails every statement starting with `prefix`.
    pub fn failing_on(self, prefix: &str) -> Self {
        self.state.lock().unwrap().fail_prefix = Some(prefix.to_string());
        self
    }

    /// Makes `describe` fail for one table, as if it was dropped mid-run.
    pub fn undescribable(self, table: &str) -> Self {
        self.state.lock().unwrap().undescribable = Some(table.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn clear_executed(&self) {
        self.state.lock().unwrap().executed.clear();
    }

    pub fn columns(&self, table: &str) -> Option<Vec<(String, String)>> {
        self.state
            .lock()
            .unwrap()
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.state.lock().unwrap().triggers.contains(name)
    }

    /// Replaces a table's columns, simulating an application migration.
    pub fn set_columns(&self, table: &str, columns: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .tables
            .iter_mut()
            .find(|(name, _)| name == table)
            .expect("table exists");
        entry.1 = columns
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
    }
}

impl SchemaSource for &FakeDatabase {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn describe(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let state = self.state.lock().unwrap();
        if state.undescribable.as_deref() == Some(table) {
            return Err(ShadowError::schema_query(table, "table does not exist"));
        }
        state
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| {
                columns
                    .iter()
                    .map(|(n, t)| ColumnDescription::new(n, t))
                    .collect()
            })
            .ok_or_else(|| ShadowError::schema_query(table, "table does not exist"))
    }
}

impl StatementSink for &FakeDatabase {
    async fn execute(&self, sql: &str) -> std::result::Result<(), StatementError> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());
        if let Some(prefix) = &state.fail_prefix {
            if sql.starts_with(prefix.as_str()) {
                return Err(StatementError::new(Some("42000".to_string()), "forced failure"));
            }
        }
        state.apply(sql)
    }
}

fn unqualify(name: &str) -> &str {
    name.split_once('.').map_or(name, |(_, n)| n)
}

fn error(message: impl Into<String>) -> StatementError {
    StatementError::new(Some("HY000".to_string()), message)
}

impl State {
    fn apply(&mut self, sql: &str) -> std::result::Result<(), StatementError> {
        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let (name, body) = rest.split_once(" ( ").ok_or_else(|| error(sql))?;
            let name = unqualify(name);
            if self.tables.iter().any(|(t, _)| t == name) {
                return Err(error(format!("Table '{name}' already exists")));
            }
            let body = body.strip_suffix(" )").ok_or_else(|| error(sql))?;
            let columns = body
                .split(", ")
                .map(|field| {
                    let (n, t) = field.split_once(' ').ok_or_else(|| error(field))?;
                    Ok((n.to_string(), t.to_string()))
                })
                .collect::<std::result::Result<Vec<_>, StatementError>>()?;
            self.tables.push((name.to_string(), columns));
            Ok(())
        } else if let Some(rest) = sql.strip_prefix("ALTER TABLE ") {
            let (name, clauses) = rest.split_once(' ').ok_or_else(|| error(sql))?;
            let name = unqualify(name);
            let columns = &mut self
                .tables
                .iter_mut()
                .find(|(t, _)| t == name)
                .ok_or_else(|| error(format!("Table '{name}' doesn't exist")))?
                .1;
            for clause in clauses.split(", ") {
                if let Some(def) = clause.strip_prefix("ADD COLUMN ") {
                    let (n, t) = def.split_once(' ').ok_or_else(|| error(clause))?;
                    if columns.iter().any(|(c, _)| c.eq_ignore_ascii_case(n)) {
                        return Err(error(format!("Duplicate column name '{n}'")));
                    }
                    columns.push((n.to_string(), t.to_string()));
                } else if let Some(n) = clause.strip_prefix("DROP COLUMN ") {
                    let before = columns.len();
                    columns.retain(|(c, _)| !c.eq_ignore_ascii_case(n));
                    if columns.len() == before {
                        return Err(error(format!("Can't DROP '{n}'")));
                    }
                } else if let Some(def) = clause.strip_prefix("MODIFY COLUMN ") {
                    let (n, t) = def.split_once(' ').ok_or_else(|| error(clause))?;
                    let column = columns
                        .iter_mut()
                        .find(|(c, _)| c.eq_ignore_ascii_case(n))
                        .ok_or_else(|| error(format!("Unknown column '{n}'")))?;
                    column.1 = t.to_string();
                } else {
                    return Err(error(clause));
                }
            }
            Ok(())
        } else if let Some(name) = sql.strip_prefix("DROP TRIGGER IF EXISTS ") {
            self.triggers.remove(unqualify(name));
            Ok(())
        } else if let Some(rest) = sql.strip_prefix("CREATE TRIGGER ") {
            let (name, _) = rest.split_once(' ').ok_or_else(|| error(sql))?;
            let name = unqualify(name);
            if !self.triggers.insert(name.to_string()) {
                return Err(error("Trigger already exists"));
            }
            Ok(())
        } else {
            Err(error(format!("unsupported statement: {sql}")))
        }
    }
}

pub fn config() -> ShadowConfig {
    ShadowConfig::new(SCHEMA)
}

pub fn executor(
    db: &FakeDatabase,
    config: ShadowConfig,
) -> ShadowExecutor<&FakeDatabase, &FakeDatabase> {
    ShadowExecutor::new(db, db, config).expect("valid config")
}
