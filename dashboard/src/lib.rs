//! Tabular data dashboard.
//!
//! An offline converter normalizes a CSV, spreadsheet, JSON, parquet or
//! structured-literal file into a single table artifact. A small HTTP viewer
//! serves column metadata, row export, descriptive statistics and Plotly
//! chart descriptions over that artifact.
//!
//! ## Architecture
//!
//! 1. **Table model** (`table` module) - typed, nullable columns aligned by a
//!    shared row index.
//!
//! 2. **Artifact** (`artifact` module) - versioned bincode envelope around a
//!    table, written atomically via temp file + rename.
//!
//! 3. **Ingestion** (`ingest` module) - extension-dispatched readers and the
//!    `convert` entry point used by `dashboard-convert`.
//!
//! 4. **Viewer** (`viewer` module) - artifact-backed table store, query
//!    functions, chart builder and the axum server used by `dashboard-viewer`.
//!
//! ## Usage
//!
//! ```bash
//! dashboard-convert sales.csv --output data.pkl
//! dashboard-viewer --artifact data.pkl --port 5000
//! ```

pub mod artifact;
pub mod ingest;
pub mod logging;
pub mod table;
pub mod viewer;
