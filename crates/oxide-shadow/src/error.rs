//! Error types for shadow table maintenance.

/// Errors that can occur while converging shadow tables.
#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    /// The schema could not be listed or a table could not be described.
    ///
    /// This aborts the run: the table registry would be incomplete.
    #[error("Schema query failed for '{target}': {message}")]
    SchemaQuery {
        /// The schema or table that was being inspected.
        target: String,
        /// Underlying error message.
        message: String,
    },

    /// A DDL statement failed for one table.
    ///
    /// The remaining statements for that table are abandoned, other tables
    /// are still processed.
    #[error(
        "Statement failed on table '{table}' ({}): {message}\n  statement: {statement}",
        describe_code(code.as_deref(), *number)
    )]
    Execution {
        /// The base table whose statement sequence failed.
        table: String,
        /// The statement text that was submitted.
        statement: String,
        /// SQLSTATE, when the server reported one.
        code: Option<String>,
        /// Server error number, when the server reported one.
        number: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Required settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error outside of schema queries and statements (connecting).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (log or summary files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (run summary).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShadowError {
    /// Creates a schema query error for the given table or schema.
    pub fn schema_query(target: impl Into<String>, message: impl ToString) -> Self {
        Self::SchemaQuery {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Attaches table and statement context to a failed statement.
    pub fn execution(
        table: impl Into<String>,
        statement: impl Into<String>,
        source: StatementError,
    ) -> Self {
        Self::Execution {
            table: table.into(),
            statement: statement.into(),
            code: source.code,
            number: source.number,
            message: source.message,
        }
    }
}

fn describe_code(code: Option<&str>, number: Option<u16>) -> String {
    match (number, code) {
        (Some(number), Some(code)) => format!("error {number}, code {code}"),
        (Some(number), None) => format!("error {number}"),
        (None, Some(code)) => format!("code {code}"),
        (None, None) => "code none".to_string(),
    }
}

/// Failure reported by a [`StatementSink`](crate::introspect::StatementSink).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StatementError {
    /// SQLSTATE (e.g. `42S21` for a duplicate column in MySQL).
    pub code: Option<String>,
    /// Server-specific error number (e.g. `1060` for the same error).
    pub number: Option<u16>,
    /// Error message.
    pub message: String,
}

impl StatementError {
    /// Creates a statement error.
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            number: None,
            message: message.into(),
        }
    }

    /// Sets the server error number.
    #[must_use]
    pub fn with_number(mut self, number: u16) -> Self {
        self.number = Some(number);
        self
    }
}

/// Result type for shadow operations.
pub type Result<T> = std::result::Result<T, ShadowError>;
