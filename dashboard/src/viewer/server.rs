//! HTTP server and API handlers for the dashboard.
//!
//! Routes:
//! - `GET /` - dashboard page
//! - `GET /static/*` - static assets
//! - `GET /api/health` - liveness
//! - `GET /api/columns` - numeric and categorical column names plus row index
//! - `GET /api/data` - every row as an object
//! - `GET /api/plot` - Plotly figure for `type`, `x`, `y`, `color`
//! - `GET /api/summary` - shape, column types and numeric statistics

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::query::{self, ColumnsResponse, PlotParams, PlotResponse, SummaryResponse};
use super::store::TableStore;
use crate::artifact::DEFAULT_ARTIFACT;

/// Application state shared across handlers.
pub struct AppState {
    pub store: TableStore,
    pub templates_dir: PathBuf,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub artifact: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    /// Keep the decoded table until the artifact changes on disk.
    pub cache: bool,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            static_dir: PathBuf::from("static"),
            templates_dir: PathBuf::from("templates"),
            cache: true,
            open_browser: false,
        }
    }
}

/// Build the application router for `config`.
pub fn router(config: &ServerConfig) -> Router {
    let state = Arc::new(AppState {
        store: TableStore::new(&config.artifact, config.cache),
        templates_dir: config.templates_dir.clone(),
    });

    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/columns", get(columns_handler))
        .route("/api/data", get(data_handler))
        .route("/api/plot", get(plot_handler))
        .route("/api/summary", get(summary_handler))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let app = router(&config);
    let addr = SocketAddr::new(config.host, config.port);

    tracing::info!(
        addr = %addr,
        artifact = %config.artifact.display(),
        cache = config.cache,
        "Starting dashboard server"
    );

    if config.open_browser {
        let url = format!("http://127.0.0.1:{}", config.port);
        tracing::info!(url = %url, "Opening browser");
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

/// Default embedded HTML (fallback if no template is found).
const EMBEDDED_INDEX_HTML: &str = include_str!("static/index.html");

/// Serve the dashboard page.
///
/// A `index.html` in the templates directory wins over the embedded page.
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let external = state.templates_dir.join("index.html");
    if let Ok(content) = tokio::fs::read_to_string(&external).await {
        return Html(content);
    }
    Html(EMBEDDED_INDEX_HTML.to_string())
}

/// GET /api/health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// GET /api/columns
async fn columns_handler(State(state): State<Arc<AppState>>) -> Json<ColumnsResponse> {
    let table = state.store.load();
    Json(query::columns(&table))
}

/// GET /api/data
async fn data_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<serde_json::Map<String, serde_json::Value>>> {
    let table = state.store.load();
    Json(query::rows(&table))
}

/// GET /api/plot - always 200; a bad `y` yields `{"error": ...}`.
///
/// Parameters are taken as raw pairs so repeated keys never reject the
/// request.
async fn plot_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<PlotResponse> {
    let params = PlotParams::from_pairs(pairs);
    let table = state.store.load();
    Json(query::plot(&table, &params))
}

/// GET /api/summary
async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let table = state.store.load();
    Json(query::summary(&table))
}
