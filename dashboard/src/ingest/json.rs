//! JSON reader.
//!
//! Accepted layouts:
//! - records: `[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]`
//! - column map: `{"a": {"0": 1, "1": 2}, "b": {"0": "x", "1": "y"}}` (inner
//!   keys become the row index)
//! - column lists: `{"a": [1, 2], "b": ["x", "y"]}`

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use super::{IngestError, InputFormat};
use crate::table::{range_index, Column, ColumnData, Table};

pub fn read_json(path: &Path) -> Result<Table, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| IngestError::parse(InputFormat::Json, e))?;
    table_from_json(value, InputFormat::Json)
}

/// Build a table from an already parsed JSON document.
pub(crate) fn table_from_json(value: Value, format: InputFormat) -> Result<Table, IngestError> {
    match value {
        Value::Array(records) => table_from_records(records, format),
        Value::Object(map) if map.values().all(Value::is_object) => {
            table_from_column_map(map)
        }
        Value::Object(map) if map.values().all(Value::is_array) => {
            table_from_column_lists(map)
        }
        Value::Object(_) => Err(IngestError::parse(
            format,
            "object values must be all objects or all arrays",
        )),
        _ => Err(IngestError::parse(
            format,
            "expected an array of records or an object of columns",
        )),
    }
}

fn table_from_records(records: Vec<Value>, format: InputFormat) -> Result<Table, IngestError> {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut cells: Vec<Vec<Value>> = Vec::new();
    let rows = records.len();

    for (row, record) in records.into_iter().enumerate() {
        let Value::Object(record) = record else {
            return Err(IngestError::parse(
                format,
                format!("record {} is not an object", row),
            ));
        };
        for (name, value) in record {
            let position = *positions.entry(name.clone()).or_insert_with(|| {
                names.push(name);
                cells.push(Vec::new());
                cells.len() - 1
            });
            let column = &mut cells[position];
            column.resize(row, Value::Null);
            column.push(value);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, mut values)| {
            values.resize(rows, Value::Null);
            Column::new(name, column_from_values(values))
        })
        .collect();

    Ok(Table::with_index(range_index(rows), columns)?)
}

fn table_from_column_map(map: Map<String, Value>) -> Result<Table, IngestError> {
    let mut index: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut by_column: Vec<(String, Map<String, Value>)> = Vec::with_capacity(map.len());

    for (name, inner) in map {
        let Value::Object(inner) = inner else {
            continue;
        };
        for key in inner.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), index.len());
                index.push(key.clone());
            }
        }
        by_column.push((name, inner));
    }

    let columns = by_column
        .into_iter()
        .map(|(name, mut inner)| {
            let values = index
                .iter()
                .map(|key| inner.remove(key).unwrap_or(Value::Null))
                .collect();
            Column::new(name, column_from_values(values))
        })
        .collect();

    Ok(Table::with_index(index, columns)?)
}

fn table_from_column_lists(map: Map<String, Value>) -> Result<Table, IngestError> {
    let columns = map
        .into_iter()
        .filter_map(|(name, values)| match values {
            Value::Array(values) => Some(Column::new(name, column_from_values(values))),
            _ => None,
        })
        .collect();

    Ok(Table::new(columns)?)
}

/// Infer a column type from JSON values.
///
/// All integers give `Int64`, any float gives `Float64`, all booleans give
/// `Bool`; strings, mixed and all-null columns are text.
pub(crate) fn column_from_values(values: Vec<Value>) -> ColumnData {
    let mut seen = false;
    let mut all_int = true;
    let mut all_number = true;
    let mut all_bool = true;

    for value in values.iter().filter(|v| !v.is_null()) {
        seen = true;
        match value {
            Value::Number(n) => {
                all_bool = false;
                if !n.is_i64() {
                    all_int = false;
                }
            }
            Value::Bool(_) => {
                all_int = false;
                all_number = false;
            }
            _ => {
                all_int = false;
                all_number = false;
                all_bool = false;
            }
        }
    }

    if !seen {
        return ColumnData::Text(vec![None; values.len()]);
    }
    if all_bool {
        return ColumnData::Bool(values.iter().map(Value::as_bool).collect());
    }
    if all_int {
        return ColumnData::Int64(values.iter().map(Value::as_i64).collect());
    }
    if all_number {
        return ColumnData::Float64(values.iter().map(Value::as_f64).collect());
    }
    ColumnData::Text(
        values
            .into_iter()
            .map(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
    )
}
