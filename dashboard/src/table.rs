//! Core table model shared by ingestion, the artifact and the viewer.
//!
//! A [`Table`] is an ordered list of named, uniformly typed columns aligned by
//! a shared row index. Every column holds nullable values; missing cells are
//! `None` regardless of the column type.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    Text,
    Datetime,
}

impl ColumnType {
    /// Type label reported by the summary API.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::Text => "object",
            ColumnType::Datetime => "datetime64[ns]",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnType::Int64 | ColumnType::Float64 => ColumnKind::Numeric,
            ColumnType::Text => ColumnKind::Categorical,
            ColumnType::Bool | ColumnType::Datetime => ColumnKind::Other,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classification used to split columns in the columns API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Other,
}

/// Column values. Datetimes are epoch milliseconds (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Datetime(Vec<Option<i64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Datetime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int64(_) => ColumnType::Int64,
            ColumnData::Float64(_) => ColumnType::Float64,
            ColumnData::Bool(_) => ColumnType::Bool,
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Datetime(_) => ColumnType::Datetime,
        }
    }

    /// Value at `row`. Out-of-range rows read as null.
    pub fn value(&self, row: usize) -> Value<'_> {
        match self {
            ColumnData::Int64(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Int),
            ColumnData::Float64(v) => {
                v.get(row).copied().flatten().map_or(Value::Null, Value::Float)
            }
            ColumnData::Bool(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Bool),
            ColumnData::Text(v) => v
                .get(row)
                .and_then(|s| s.as_deref())
                .map_or(Value::Null, Value::Text),
            ColumnData::Datetime(v) => {
                v.get(row).copied().flatten().map_or(Value::Null, Value::Datetime)
            }
        }
    }

    /// Non-null values as floats, for numeric columns only.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Int64(v) => Some(v.iter().flatten().map(|&i| i as f64).collect()),
            ColumnData::Float64(v) => Some(v.iter().flatten().copied().collect()),
            _ => None,
        }
    }

    /// Integer columns with gaps become float columns; NaN becomes null.
    fn normalized(self) -> Self {
        match self {
            ColumnData::Int64(v) if v.iter().any(Option::is_none) => {
                ColumnData::Float64(v.into_iter().map(|i| i.map(|i| i as f64)).collect())
            }
            ColumnData::Float64(v) => {
                ColumnData::Float64(v.into_iter().map(|f| f.filter(|f| !f.is_nan())).collect())
            }
            other => other,
        }
    }
}

/// Borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
    Datetime(i64),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Row-export encoding: datetimes as epoch millis, non-finite floats as null.
    pub fn to_json(&self) -> serde_json::Value {
        match *self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => i.into(),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => b.into(),
            Value::Text(s) => s.into(),
            Value::Datetime(ms) => ms.into(),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Datetime(ms) => write!(f, "{}", format_datetime_ms(*ms)),
        }
    }
}

/// ISO-8601 rendering of epoch milliseconds, without timezone suffix.
pub fn format_datetime_ms(ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        None => ms.to_string(),
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data: data.normalized(),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn kind(&self) -> ColumnKind {
        self.column_type().kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered named columns aligned by a row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub(crate) index: Vec<String>,
    pub(crate) columns: Vec<Column>,
}

impl Table {
    /// Table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table with the default `0..n` row index.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_index(range_index(rows), columns)
    }

    /// Build a table with an explicit row index.
    ///
    /// Duplicate column names are disambiguated as `name.1`, `name.2`, ...
    pub fn with_index(index: Vec<String>, columns: Vec<Column>) -> Result<Self, TableError> {
        let table = Self {
            index,
            columns: dedupe_names(columns),
        };
        table.validate()?;
        Ok(table)
    }

    /// Check the shape invariants: every column matches the index length and
    /// names are unique.
    pub fn validate(&self) -> Result<(), TableError> {
        let expected = self.index.len();
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected,
                    found: column.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.index.is_empty()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Default row index: `"0"`, `"1"`, ... `"n-1"`.
pub fn range_index(rows: usize) -> Vec<String> {
    (0..rows).map(|i| i.to_string()).collect()
}

fn dedupe_names(columns: Vec<Column>) -> Vec<Column> {
    let mut taken: HashSet<String> = HashSet::with_capacity(columns.len());
    columns
        .into_iter()
        .map(|mut column| {
            if taken.contains(&column.name) {
                let base = column.name.clone();
                let mut n = 1;
                while taken.contains(&format!("{}.{}", base, n)) {
                    n += 1;
                }
                column.name = format!("{}.{}", base, n);
            }
            taken.insert(column.name.clone());
            column
        })
        .collect()
}

/// Table shape errors.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("column {column:?} has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> ColumnData {
        ColumnData::Int64(values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_new_uses_range_index() {
        let table = Table::new(vec![Column::new("a", ints(&[1, 2, 3]))]).unwrap();
        assert_eq!(table.index(), &["0", "1", "2"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Table::new(vec![
            Column::new("a", ints(&[1, 2, 3])),
            Column::new("b", ints(&[1])),
        ]);
        assert!(matches!(
            result,
            Err(TableError::LengthMismatch { expected: 3, found: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_names_disambiguated() {
        let table = Table::new(vec![
            Column::new("a", ints(&[1])),
            Column::new("a", ints(&[2])),
            Column::new("a", ints(&[3])),
        ])
        .unwrap();
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["a", "a.1", "a.2"]);
    }

    #[test]
    fn test_int_with_nulls_becomes_float() {
        let column = Column::new("a", ColumnData::Int64(vec![Some(1), None]));
        assert_eq!(column.column_type(), ColumnType::Float64);
        assert_eq!(column.data.value(0), Value::Float(1.0));
        assert!(column.data.value(1).is_null());
    }

    #[test]
    fn test_nan_becomes_null() {
        let column = Column::new("a", ColumnData::Float64(vec![Some(f64::NAN), Some(1.5)]));
        assert!(column.data.value(0).is_null());
        assert_eq!(column.data.value(1), Value::Float(1.5));
    }

    #[test]
    fn test_kinds_and_labels() {
        assert_eq!(ColumnType::Int64.kind(), ColumnKind::Numeric);
        assert_eq!(ColumnType::Float64.kind(), ColumnKind::Numeric);
        assert_eq!(ColumnType::Text.kind(), ColumnKind::Categorical);
        assert_eq!(ColumnType::Bool.kind(), ColumnKind::Other);
        assert_eq!(ColumnType::Datetime.label(), "datetime64[ns]");
        assert_eq!(ColumnType::Text.label(), "object");
    }

    #[test]
    fn test_value_json_encoding() {
        assert_eq!(Value::Float(f64::INFINITY).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Datetime(1_000).to_json(), serde_json::json!(1000));
        assert_eq!(Value::Text("x").to_json(), serde_json::json!("x"));
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime_ms(0), "1970-01-01T00:00:00");
        assert_eq!(format_datetime_ms(1_500), "1970-01-01T00:00:01.500");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
        assert!(table.validate().is_ok());
    }
}
