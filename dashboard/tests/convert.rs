//! Conversion round-trips: every supported input format is converted to an
//! artifact and loaded back through the viewer's table store.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tabular_dashboard::ingest::{convert, IngestError};
use tabular_dashboard::table::{ColumnType, Table};
use tabular_dashboard::viewer::TableStore;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Convert `input`, then load the artifact the way the viewer does.
fn round_trip(input: &Path, output: &Path) -> (Table, Arc<Table>) {
    let converted = convert(input, output).unwrap();
    let loaded = TableStore::new(output, false).load();
    (converted, loaded)
}

fn names(table: &Table) -> Vec<&str> {
    table.column_names().collect()
}

#[test]
fn test_csv_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("people.csv");
    std::fs::write(&input, "name,age,score\nAlice,30,88.5\nBob,25,92\nCarol,41,79.25\n").unwrap();

    let (converted, loaded) = round_trip(&input, &tmp.path().join("data.pkl"));

    assert_eq!(names(&loaded), vec!["name", "age", "score"]);
    assert_eq!(loaded.row_count(), 3);
    assert_eq!(*loaded, converted);
}

#[test]
fn test_xlsx_round_trip() {
    let tmp = TempDir::new().unwrap();
    let (_, loaded) = round_trip(&fixture("people.xlsx"), &tmp.path().join("data.pkl"));

    assert_eq!(names(&loaded), vec!["name", "age", "score"]);
    assert_eq!(loaded.row_count(), 3);
    assert_eq!(loaded.column("age").unwrap().column_type(), ColumnType::Int64);
    assert_eq!(loaded.column("score").unwrap().column_type(), ColumnType::Float64);
}

#[test]
fn test_json_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("people.json");
    std::fs::write(
        &input,
        r#"[{"name": "Alice", "age": 30}, {"name": "Bob", "age": 25}]"#,
    )
    .unwrap();

    let (_, loaded) = round_trip(&input, &tmp.path().join("data.pkl"));

    assert_eq!(names(&loaded), vec!["name", "age"]);
    assert_eq!(loaded.row_count(), 2);
}

#[test]
fn test_parquet_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("people.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("age", DataType::Int64, false),
        Field::new("score", DataType::Float64, true),
    ]));
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["Alice", "Bob"])),
        Arc::new(Int64Array::from(vec![30, 25])),
        Arc::new(Float64Array::from(vec![Some(88.5), None])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&input).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let (_, loaded) = round_trip(&input, &tmp.path().join("data.pkl"));

    assert_eq!(names(&loaded), vec!["name", "age", "score"]);
    assert_eq!(loaded.row_count(), 2);
    assert_eq!(loaded.column("age").unwrap().column_type(), ColumnType::Int64);
}

#[test]
fn test_script_literal_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("people.py");
    std::fs::write(
        &input,
        concat!(
            "import pandas as pd\n\n",
            "data = pd.DataFrame({\n    'name': ['Alice', 'Bob'],\n    'age': [30, 25],\n})\n",
        ),
    )
    .unwrap();

    let (_, loaded) = round_trip(&input, &tmp.path().join("data.pkl"));

    assert_eq!(names(&loaded), vec!["name", "age"]);
    assert_eq!(loaded.row_count(), 2);
}

#[test]
fn test_script_without_data_binding() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("empty.py");
    let output = tmp.path().join("data.pkl");
    std::fs::write(&input, "frame = {'a': [1]}\n").unwrap();

    let result = convert(&input, &output);

    assert!(matches!(result, Err(IngestError::MissingVariable)));
    assert!(!output.exists());
}

#[test]
fn test_unsupported_extension_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("notes.txt");
    let output = tmp.path().join("data.pkl");
    std::fs::write(&input, "hello").unwrap();

    let err = convert(&input, &output).unwrap_err();

    assert_eq!(err.to_string(), "Unsupported file format: .txt");
    assert!(!output.exists());
}

#[test]
fn test_missing_artifact_loads_empty() {
    let tmp = TempDir::new().unwrap();
    let table = TableStore::new(tmp.path().join("absent.pkl"), true).load();
    assert_eq!(table.row_count(), 0);
    assert_eq!(table.column_count(), 0);
}
