//! CLI binary for the dashboard viewer.
//!
//! Serves the dashboard page and JSON API over the table artifact written by
//! `dashboard-convert`.
//!
//! # Usage
//!
//! ```bash
//! dashboard-viewer
//! dashboard-viewer --artifact out/sales.pkl --port 8080
//! RUST_LOG=debug dashboard-viewer --log-format json
//! ```

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tabular_dashboard::artifact::DEFAULT_ARTIFACT;
use tabular_dashboard::logging::{init_tracing, LogFormat};
use tabular_dashboard::viewer::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "dashboard-viewer")]
#[command(about = "Interactive tabular data dashboard")]
#[command(version)]
struct Args {
    /// Table artifact produced by dashboard-convert
    #[arg(long, env = "DASHBOARD_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
    artifact: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for web server
    #[arg(short, long, env = "DASHBOARD_PORT", default_value = "5000")]
    port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Directory searched for an index.html overriding the embedded page
    #[arg(long, default_value = "templates")]
    templates_dir: PathBuf,

    /// Re-read the artifact on every request
    #[arg(long)]
    no_cache: bool,

    /// Open the dashboard in a browser once the server starts
    #[arg(long)]
    open_browser: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format, "info");

    let config = ServerConfig {
        artifact: args.artifact,
        host: args.host,
        port: args.port,
        static_dir: args.static_dir,
        templates_dir: args.templates_dir,
        cache: !args.no_cache,
        open_browser: args.open_browser,
    };

    run_server(config).await
}
