//! Comma-separated text reader.
//!
//! Input bytes are decoded as ISO-8859-1 (every byte maps to the code point of
//! the same value), so files exported by legacy spreadsheet tools never fail
//! on invalid UTF-8. Column types are inferred by arrow over the whole file.
//! Only integers, floats and booleans are typed; date-like text stays text.
//! Empty cells and the usual missing-value markers (`NA`, `N/A`, `null`,
//! `NaN`, `#N/A`, ...) read as null.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use regex::Regex;

use super::batches::table_from_batches;
use super::{IngestError, InputFormat};
use crate::table::Table;

/// Cells matching this whole-cell pattern are null.
const NULL_PATTERN: &str = concat!(
    r"^(|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN",
    r"|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$",
);

pub fn read_csv(path: &Path) -> Result<Table, IngestError> {
    let raw = std::fs::read(path)?;
    let text = decode_latin1(&raw);
    table_from_csv_text(&text)
}

pub(crate) fn table_from_csv_text(text: &str) -> Result<Table, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::parse(
            InputFormat::Csv,
            "no columns to parse from file",
        ));
    }

    let null_regex =
        Regex::new(NULL_PATTERN).map_err(|e| IngestError::parse(InputFormat::Csv, e))?;
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex);
    let (inferred, _) = format
        .infer_schema(Cursor::new(text.as_bytes()), None)
        .map_err(|e| IngestError::parse(InputFormat::Csv, e))?;
    let schema = Arc::new(temporal_as_text(&inferred));

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(Cursor::new(text.as_bytes()))
        .map_err(|e| IngestError::parse(InputFormat::Csv, e))?;
    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .map_err(|e| IngestError::parse(InputFormat::Csv, e))?;

    table_from_batches(&schema, &batches, InputFormat::Csv)
}

/// ISO-8859-1 decode: byte `b` becomes `char::from(b)`.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn temporal_as_text(schema: &Schema) -> Schema {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_)
            | DataType::Timestamp(_, _) => Field::new(f.name(), DataType::Utf8, true),
            _ => f.as_ref().clone(),
        })
        .collect();
    Schema::new(fields)
}
