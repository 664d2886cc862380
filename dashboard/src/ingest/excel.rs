//! Spreadsheet reader (first worksheet, first row is the header).

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::{IngestError, InputFormat};
use crate::table::{Column, ColumnData, Table};

static EMPTY: Data = Data::Empty;

pub fn read_excel(path: &Path) -> Result<Table, IngestError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::parse(InputFormat::Excel, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::parse(InputFormat::Excel, "workbook has no worksheets"))?
        .map_err(|e| IngestError::parse(InputFormat::Excel, e))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let cells: Vec<&Data> = body.iter().map(|row| row.get(i).unwrap_or(&EMPTY)).collect();
            Column::new(header_name(cell, i), column_from_cells(&cells))
        })
        .collect();

    Ok(Table::new(columns)?)
}

fn header_name(cell: &Data, position: usize) -> String {
    match cell {
        Data::Empty => format!("Unnamed: {}", position),
        Data::String(s) if s.trim().is_empty() => format!("Unnamed: {}", position),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellClass {
    Int,
    Float,
    Bool,
    Datetime,
    Text,
}

fn classify(cell: &Data) -> Option<CellClass> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(_) => Some(CellClass::Int),
        // xlsx stores every number as a float; whole values are integers
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(CellClass::Int),
        Data::Float(_) => Some(CellClass::Float),
        Data::Bool(_) => Some(CellClass::Bool),
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(CellClass::Datetime),
        _ => Some(CellClass::Text),
    }
}

/// Pick the narrowest type that fits every non-empty cell.
fn column_from_cells(cells: &[&Data]) -> ColumnData {
    let mut class: Option<CellClass> = None;
    for cell in cells {
        let Some(next) = classify(cell) else { continue };
        class = Some(match (class, next) {
            (None, c) => c,
            (Some(a), b) if a == b => a,
            (Some(CellClass::Int), CellClass::Float) | (Some(CellClass::Float), CellClass::Int) => {
                CellClass::Float
            }
            _ => CellClass::Text,
        });
    }

    match class {
        Some(CellClass::Int) => ColumnData::Int64(cells.iter().map(|c| cell_as_i64(c)).collect()),
        Some(CellClass::Float) => {
            ColumnData::Float64(cells.iter().map(|c| cell_as_f64(c)).collect())
        }
        Some(CellClass::Bool) => ColumnData::Bool(
            cells
                .iter()
                .map(|c| match c {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect(),
        ),
        Some(CellClass::Datetime) => {
            ColumnData::Datetime(cells.iter().map(|c| cell_as_epoch_millis(c)).collect())
        }
        Some(CellClass::Text) | None => {
            ColumnData::Text(cells.iter().map(|c| cell_as_text(c)).collect())
        }
    }
}

fn cell_as_i64(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => Some(*f as i64),
        _ => None,
    }
}

fn cell_as_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn cell_as_epoch_millis(cell: &Data) -> Option<i64> {
    match cell {
        // honours the workbook's 1900 or 1904 date system
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.and_utc().timestamp_millis()),
        Data::DateTimeIso(s) => parse_iso_millis(s),
        _ => None,
    }
}

fn parse_iso_millis(s: &str) -> Option<i64> {
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn cell_as_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Bool(true) => Some("True".to_string()),
        Data::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}
