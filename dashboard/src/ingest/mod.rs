//! Offline ingestion: read an input file into a [`Table`] and write the
//! artifact consumed by the viewer.
//!
//! Dispatch is purely on the lower-cased file extension:
//!
//! | Extension | Reader |
//! |---|---|
//! | `.csv` | [`csv`] (Latin-1 text) |
//! | `.xlsx`, `.xls` | [`excel`] (first worksheet) |
//! | `.json` | [`json`] |
//! | `.parquet` | [`parquet`] |
//! | `.py` | [`literal`] (structured literal, never executed) |

pub mod csv;
pub mod excel;
pub mod json;
pub mod literal;
pub mod parquet;

mod batches;

use std::fmt;
use std::path::Path;

use crate::artifact::{ArtifactError, TableArtifact};
use crate::table::{Table, TableError};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Csv,
    Excel,
    Json,
    Parquet,
    Literal,
}

impl InputFormat {
    /// Pick the reader for `path` from its extension.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".csv" => Ok(InputFormat::Csv),
            ".xlsx" | ".xls" => Ok(InputFormat::Excel),
            ".json" => Ok(InputFormat::Json),
            ".parquet" => Ok(InputFormat::Parquet),
            ".py" => Ok(InputFormat::Literal),
            _ => Err(IngestError::UnsupportedFormat { extension }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Excel => "excel",
            InputFormat::Json => "json",
            InputFormat::Parquet => "parquet",
            InputFormat::Literal => "script",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read `path` into a table using the reader for its extension.
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    let format = InputFormat::from_path(path)?;
    tracing::debug!(path = %path.display(), format = %format, "Reading input file");

    match format {
        InputFormat::Csv => csv::read_csv(path),
        InputFormat::Excel => excel::read_excel(path),
        InputFormat::Json => json::read_json(path),
        InputFormat::Parquet => parquet::read_parquet(path),
        InputFormat::Literal => literal::read_literal(path),
    }
}

/// Read `input` and write it as the artifact at `output`.
///
/// Nothing is written unless the whole input was read successfully; an
/// existing artifact at `output` is replaced atomically.
pub fn convert(input: &Path, output: &Path) -> Result<Table, IngestError> {
    let table = read_table(input)?;
    let artifact = TableArtifact::new(table);
    artifact.write(output)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = artifact.table.row_count(),
        columns = artifact.table.column_count(),
        "Wrote table artifact"
    );

    Ok(artifact.table)
}

/// Ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("input file must bind a variable named 'data' to a table literal")]
    MissingVariable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {format} input: {message}")]
    Parse {
        format: InputFormat,
        message: String,
    },

    #[error("input does not form a table: {0}")]
    Table(#[from] TableError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl IngestError {
    pub(crate) fn parse(format: InputFormat, err: impl fmt::Display) -> Self {
        IngestError::Parse {
            format,
            message: err.to_string(),
        }
    }
}
