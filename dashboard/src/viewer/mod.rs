//! Dashboard viewer library module.
//!
//! # Architecture
//!
//! - `store` - artifact-backed table store with an mtime-validated cache
//! - `query` - columns, row export, summary and plot queries
//! - `stats` - descriptive statistics for numeric columns
//! - `chart` - Plotly figure construction
//! - `server` - HTTP server and API handlers

pub mod chart;
pub mod query;
pub mod server;
pub mod stats;
pub mod store;

pub use server::{router, run_server, ServerConfig};
pub use store::TableStore;
