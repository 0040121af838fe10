//! Column representation types.
//!
//! Column types are kept as the raw strings the database reports
//! (`varchar(255)`, `decimal(10,2)`, `int unsigned`, ...). They are never
//! parsed: two types are equal only when their text is identical.
//!
//! Column names follow MySQL identifier rules and are matched without regard
//! to ASCII case. The spelling the database reported is kept for rendering.

use std::collections::HashMap;

use serde::Serialize;

/// A single column: its name and raw database type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Raw type string, including size/precision annotations.
    pub sql_type: String,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// One row of a table description as reported by the database.
///
/// Only `field` and `field_type` are carried into the [`ColumnModel`]. Shadow
/// columns deliberately drop NULL constraints, defaults, keys and extra
/// attributes such as `auto_increment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column name.
    pub field: String,
    /// Raw type string.
    pub field_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value expression, if any.
    pub default: Option<String>,
    /// Index participation (`PRI`, `UNI`, `MUL` or empty).
    pub key: String,
    /// Other properties (`auto_increment`, `on update ...`).
    pub extra: String,
}

impl ColumnDescription {
    /// Creates a description with only a name and type set.
    #[must_use]
    pub fn new(field: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            field_type: field_type.into(),
            nullable: true,
            default: None,
            key: String::new(),
            extra: String::new(),
        }
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the key information.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the extra attributes.
    #[must_use]
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Returns the part of the description that a shadow table keeps.
    #[must_use]
    pub fn to_column(&self) -> Column {
        Column::new(&self.field, &self.field_type)
    }
}

/// A table's column-name-to-type mapping.
///
/// Insertion order is preserved for rendering (`CREATE TABLE` field order,
/// trigger field lists) but plays no part in equality. Lookups fold ASCII
/// case, so `Email` and `email` name the same column.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnModel {
    columns: Vec<Column>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ColumnModel {
    /// Creates an empty column model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column. A repeated name replaces the earlier column in place.
    pub fn insert(&mut self, column: Column) {
        let key = fold_name(&column.name);
        match self.index.get(&key) {
            Some(&position) => self.columns[position] = column,
            None => {
                self.index.insert(key, self.columns.len());
                self.columns.push(column);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.insert(Column::new(name, sql_type));
        self
    }

    /// Returns the named column, ignoring ASCII case.
    #[must_use]
    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.index
            .get(&fold_name(name))
            .map(|&position| &self.columns[position])
    }

    /// Returns the type of the named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.column_named(name).map(|c| c.sql_type.as_str())
    }

    /// Returns whether a column with this name exists, ignoring ASCII case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&fold_name(name))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over the columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Iterates over the column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the columns as a slice, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Column] {
        &self.columns
    }
}

fn fold_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl PartialEq for ColumnModel {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .columns
                .iter()
                .all(|c| other.get(&c.name) == Some(c.sql_type.as_str()))
    }
}

impl Eq for ColumnModel {}

impl FromIterator<Column> for ColumnModel {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut model = Self::new();
        for column in iter {
            model.insert(column);
        }
        model
    }
}

impl<'a> IntoIterator for &'a ColumnModel {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
