//! Convert a CSV, spreadsheet, JSON, parquet or `.py` literal file into the
//! table artifact read by `dashboard-viewer`.
//!
//! # Usage
//!
//! ```bash
//! dashboard-convert sales.csv
//! dashboard-convert report.xlsx -o out/report.pkl
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tabular_dashboard::artifact::DEFAULT_ARTIFACT;
use tabular_dashboard::ingest;
use tabular_dashboard::logging::{init_tracing, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "dashboard-convert")]
#[command(about = "Convert a data file into a dashboard table artifact")]
#[command(version)]
struct Args {
    /// Input file (.csv, .xlsx, .xls, .json, .parquet or .py)
    input_file: PathBuf,

    /// Output artifact path
    #[arg(short, long, default_value = DEFAULT_ARTIFACT)]
    output: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(LogFormat::Text, "info");

    match ingest::convert(&args.input_file, &args.output) {
        Ok(table) => {
            let names: Vec<&str> = table.column_names().collect();
            println!(
                "Successfully converted {} to {}",
                args.input_file.display(),
                args.output.display()
            );
            println!("Data shape: ({}, {})", table.row_count(), table.column_count());
            println!("Columns: {}", names.join(", "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error converting file: {}", e);
            ExitCode::FAILURE
        }
    }
}
