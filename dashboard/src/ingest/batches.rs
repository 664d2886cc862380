//! Arrow record batches to [`Table`] conversion, shared by the CSV and parquet
//! readers.

use arrow::array::{new_empty_array, Array, ArrayRef, AsArray};
use arrow::compute::{cast, concat};
use arrow::datatypes::{
    DataType, Float64Type, Int64Type, SchemaRef, TimeUnit, TimestampMillisecondType,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use super::{IngestError, InputFormat};
use crate::table::{range_index, Column, ColumnData, Table};

/// Column name pandas uses when it stores a non-default index in parquet.
pub(crate) const PANDAS_INDEX_COLUMN: &str = "__index_level_0__";

/// Concatenate `batches` and convert every field of `schema` into a column.
///
/// A pandas index column, when present, becomes the row index instead of a
/// data column.
pub(crate) fn table_from_batches(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    format: InputFormat,
) -> Result<Table, IngestError> {
    let mut columns = Vec::with_capacity(schema.fields().len());
    let mut index = None;

    for (i, field) in schema.fields().iter().enumerate() {
        let array = concat_column(batches, i, field.data_type())
            .map_err(|e| IngestError::parse(format, e))?;
        let data = column_from_array(&array).map_err(|e| IngestError::parse(format, e))?;

        if field.name() == PANDAS_INDEX_COLUMN {
            index = Some(index_from_column(&data));
        } else {
            columns.push(Column::new(field.name().clone(), data));
        }
    }

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    let index = index.unwrap_or_else(|| range_index(rows));
    Ok(Table::with_index(index, columns)?)
}

fn concat_column(
    batches: &[RecordBatch],
    column: usize,
    data_type: &DataType,
) -> Result<ArrayRef, ArrowError> {
    if batches.is_empty() {
        return Ok(new_empty_array(data_type));
    }
    let arrays: Vec<&dyn Array> = batches.iter().map(|b| b.column(column).as_ref()).collect();
    concat(&arrays)
}

/// Map an arrow array onto the table's column types.
pub(crate) fn column_from_array(array: &ArrayRef) -> Result<ColumnData, ArrowError> {
    let data = match array.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let ints = cast(array, &DataType::Int64)?;
            ColumnData::Int64(ints.as_primitive::<Int64Type>().iter().collect())
        }
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => {
            let floats = cast(array, &DataType::Float64)?;
            ColumnData::Float64(floats.as_primitive::<Float64Type>().iter().collect())
        }
        DataType::Boolean => ColumnData::Bool(array.as_boolean().iter().collect()),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let millis = cast(array, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            ColumnData::Datetime(
                millis
                    .as_primitive::<TimestampMillisecondType>()
                    .iter()
                    .collect(),
            )
        }
        DataType::Null => ColumnData::Text(vec![None; array.len()]),
        _ => {
            let text = cast(array, &DataType::Utf8)?;
            ColumnData::Text(
                text.as_string::<i32>()
                    .iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            )
        }
    };
    Ok(data)
}

fn index_from_column(data: &ColumnData) -> Vec<String> {
    (0..data.len()).map(|row| data.value(row).to_string()).collect()
}
