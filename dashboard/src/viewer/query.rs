//! Read-only queries answered by the API routes.

use serde::Serialize;
use serde_json::{Map, Value};

use super::chart::{build_chart, ChartError, ChartKind, ChartRequest, Figure};
use super::stats::describe;
use crate::table::{ColumnKind, Table};

/// GET /api/columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnsResponse {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub index: Vec<String>,
}

pub fn columns(table: &Table) -> ColumnsResponse {
    let names_of = |kind: ColumnKind| {
        table
            .columns()
            .iter()
            .filter(|c| c.kind() == kind)
            .map(|c| c.name.clone())
            .collect()
    };

    ColumnsResponse {
        numeric: names_of(ColumnKind::Numeric),
        categorical: names_of(ColumnKind::Categorical),
        index: table.index().to_vec(),
    }
}

/// GET /api/data - one object per row, keys in column order.
pub fn rows(table: &Table) -> Vec<Map<String, Value>> {
    (0..table.row_count())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.data.value(row).to_json()))
                .collect()
        })
        .collect()
}

/// GET /api/summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub rows: usize,
    pub columns: usize,
    /// Column name to type label, in column order.
    pub column_types: Map<String, Value>,
    /// Numeric column name to its statistics, in column order.
    pub numeric_summary: Map<String, Value>,
}

pub fn summary(table: &Table) -> SummaryResponse {
    let column_types = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), Value::from(c.column_type().label())))
        .collect();

    let numeric_summary = table
        .columns()
        .iter()
        .filter_map(|c| {
            c.data
                .numeric_values()
                .map(|values| (c.name.clone(), describe(&values).to_json()))
        })
        .collect();

    SummaryResponse {
        rows: table.row_count(),
        columns: table.column_count(),
        column_types,
        numeric_summary,
    }
}

/// Query parameters of GET /api/plot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlotParams {
    /// The `type` parameter.
    pub kind: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
}

impl PlotParams {
    /// Build from raw query pairs. The first value of a repeated key wins and
    /// unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "type" => &mut params.kind,
                "x" => &mut params.x,
                "y" => &mut params.y,
                "color" => &mut params.color,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }

    pub fn to_request(&self) -> ChartRequest {
        ChartRequest {
            kind: ChartKind::from_param(self.kind.as_deref()),
            x: self.x.clone(),
            y: self.y.clone(),
            color: self.color.clone(),
        }
    }
}

/// Body of GET /api/plot. Errors are reported in-band.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlotResponse {
    Chart(Figure),
    Error { error: String },
}

pub fn plot(table: &Table, params: &PlotParams) -> PlotResponse {
    match build_chart(table, &params.to_request()) {
        Ok(figure) => PlotResponse::Chart(figure),
        Err(e @ ChartError::ColumnNotFound { .. }) => {
            tracing::debug!(y = ?params.y, "Plot requested without a valid y column");
            PlotResponse::Error {
                error: e.to_string(),
            }
        }
    }
}
