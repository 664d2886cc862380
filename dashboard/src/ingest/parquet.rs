//! Parquet reader (all row groups, all columns).

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::batches::table_from_batches;
use super::{IngestError, InputFormat};
use crate::table::Table;

pub fn read_parquet(path: &Path) -> Result<Table, IngestError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| IngestError::parse(InputFormat::Parquet, e))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| IngestError::parse(InputFormat::Parquet, e))?;

    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .map_err(|e| IngestError::parse(InputFormat::Parquet, e))?;

    tracing::debug!(
        path = %path.display(),
        batches = batches.len(),
        fields = schema.fields().len(),
        "Read parquet input"
    );

    table_from_batches(&schema, &batches, InputFormat::Parquet)
}
