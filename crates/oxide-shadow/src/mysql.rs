//! MySQL implementation of the database collaborators.
//!
//! Table structure is read from `information_schema` so that views are left
//! out and column metadata decodes as text on every server version.
//! Statements are sent over the text protocol since MySQL refuses
//! `CREATE TRIGGER` as a prepared statement.

use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};

use crate::error::{Result, ShadowError, StatementError};
use crate::introspect::{SchemaSource, StatementSink};
use crate::schema::ColumnDescription;

const LIST_TABLES_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
     ORDER BY TABLE_NAME";

const DESCRIBE_SQL: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
     CAST(IS_NULLABLE AS CHAR), CAST(COLUMN_DEFAULT AS CHAR), \
     CAST(COLUMN_KEY AS CHAR), CAST(EXTRA AS CHAR) \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

type DescribeRow = (String, String, String, Option<String>, String, String);

/// A MySQL schema reached through a connection pool.
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
    schema: String,
}

impl MySqlDatabase {
    /// Wraps an existing pool.
    pub fn new(pool: MySqlPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    /// Connects with a single connection, so every statement of a run is
    /// issued sequentially on the same session.
    pub async fn connect(options: MySqlConnectOptions, schema: impl Into<String>) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool, schema))
    }

    /// Returns the server version string.
    pub async fn server_version(&self) -> Result<String> {
        Ok(sqlx::query_scalar("SELECT VERSION()")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Returns the schema name.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(TABLE_EXISTS_SQL)
            .bind(self.schema.as_str())
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ShadowError::schema_query(table, e))?;
        Ok(count > 0)
    }
}

impl SchemaSource for MySqlDatabase {
    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(LIST_TABLES_SQL)
            .bind(self.schema.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ShadowError::schema_query(&self.schema, e))
    }

    async fn describe(&self, table: &str) -> Result<Vec<ColumnDescription>> {
        let rows: Vec<DescribeRow> = sqlx::query_as(DESCRIBE_SQL)
            .bind(self.schema.as_str())
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ShadowError::schema_query(table, e))?;

        // information_schema returns no rows rather than an error for a table
        // dropped since it was listed.
        if rows.is_empty() && !self.table_exists(table).await? {
            return Err(ShadowError::schema_query(
                format!("{}.{table}", self.schema),
                "table does not exist",
            ));
        }

        Ok(rows.into_iter().map(description_from_row).collect())
    }
}

impl StatementSink for MySqlDatabase {
    async fn execute(&self, sql: &str) -> std::result::Result<(), StatementError> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| statement_error(&e))
    }
}

fn description_from_row(row: DescribeRow) -> ColumnDescription {
    let (field, field_type, nullable, default, key, extra) = row;
    ColumnDescription {
        field,
        field_type,
        nullable: nullable.eq_ignore_ascii_case("YES"),
        default,
        key,
        extra,
    }
}

/// Keeps both the SQLSTATE and the MySQL error number of a failure.
fn statement_error(error: &sqlx::Error) -> StatementError {
    let Some(db) = error.as_database_error() else {
        return StatementError::new(None, error.to_string());
    };
    let statement_error = StatementError::new(db.code().map(|c| c.into_owned()), db.message());
    match db.try_downcast_ref::<MySqlDatabaseError>() {
        Some(mysql) => statement_error.with_number(mysql.number()),
        None => statement_error,
    }
}
