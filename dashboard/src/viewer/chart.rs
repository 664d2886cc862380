//! Plotly figure construction.
//!
//! Builds the same trace layout Plotly Express produces for line, bar,
//! scatter and box charts, then applies the dashboard's fixed layout
//! (40px margins, transparent backgrounds, closest-point hover). The result
//! serializes straight into the `{data, layout}` object expected by
//! `Plotly.react`.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::table::{format_datetime_ms, Column, ColumnKind, Table, Value};

/// Default Plotly qualitative palette, assigned to groups in order.
pub const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Plasma, the default continuous colorscale.
const PLASMA: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];

const MARGIN: u32 = 40;
const TRANSPARENT: &str = "rgba(0,0,0,0)";
const INDEX_TITLE: &str = "index";

/// Chart kinds offered by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
    Box,
}

impl ChartKind {
    /// Parse the `type` query parameter. Absent or unknown values give `Line`.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("bar") => ChartKind::Bar,
            Some("scatter") => ChartKind::Scatter,
            Some("box") => ChartKind::Box,
            _ => ChartKind::Line,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Box => "box",
        }
    }
}

/// A chart to build: kind plus column selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Y column not found")]
    ColumnNotFound { column: Option<String> },
}

/// Cell value as sent to Plotly.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Epoch milliseconds, rendered as an ISO-8601 string.
    Datetime(i64),
}

impl From<Value<'_>> for PlotValue {
    fn from(value: Value<'_>) -> Self {
        match value {
            Value::Null => PlotValue::Null,
            Value::Int(i) => PlotValue::Int(i),
            Value::Float(f) => PlotValue::Float(f),
            Value::Bool(b) => PlotValue::Bool(b),
            Value::Text(s) => PlotValue::Text(s.to_string()),
            Value::Datetime(ms) => PlotValue::Datetime(ms),
        }
    }
}

impl Serialize for PlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlotValue::Null => serializer.serialize_none(),
            PlotValue::Int(i) => serializer.serialize_i64(*i),
            PlotValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            PlotValue::Float(_) => serializer.serialize_none(),
            PlotValue::Bool(b) => serializer.serialize_bool(*b),
            PlotValue::Text(s) => serializer.serialize_str(s),
            PlotValue::Datetime(ms) => serializer.serialize_str(&format_datetime_ms(*ms)),
        }
    }
}

/// Top-level figure: `{data, layout}`.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<PlotValue>>,
    pub y: Vec<PlotValue>,
    pub xaxis: &'static str,
    pub yaxis: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: MarkerColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coloraxis: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'static str>,
}

/// A single colour, or one value per point mapped through a color axis.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Solid(&'static str),
    Values(Vec<PlotValue>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: &'static str,
    pub dash: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub legend: Legend,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coloraxis: Option<ColorAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub anchor: &'static str,
    pub domain: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
}

impl Axis {
    fn new(anchor: &'static str, title: Option<&str>) -> Self {
        Self {
            anchor,
            domain: [0.0, 1.0],
            title: title.map(Title::new),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    pub tracegroupgap: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorAxis {
    pub colorbar: ColorBar,
    pub colorscale: Vec<(f64, &'static str)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

/// Rows of one trace.
struct Group {
    name: String,
    rows: Vec<usize>,
}

/// Build the figure for `request` over `table`, with the dashboard layout
/// applied.
///
/// Only `y` is required. An `x` or `color` selector that is empty or does not
/// name a column is ignored.
pub fn build_chart(table: &Table, request: &ChartRequest) -> Result<Figure, ChartError> {
    let y = request
        .y
        .as_deref()
        .filter(|name| !name.is_empty())
        .and_then(|name| table.column(name))
        .ok_or_else(|| ChartError::ColumnNotFound {
            column: request.y.clone(),
        })?;
    let x = selector(table, request.x.as_deref());
    let color = selector(table, request.color.as_deref());
    let kind = request.kind;

    let continuous = color.filter(|c| {
        c.kind() == ColumnKind::Numeric && matches!(kind, ChartKind::Scatter | ChartKind::Bar)
    });

    let data = match (color, continuous) {
        (_, Some(color)) => {
            let rows: Vec<usize> = (0..table.row_count()).collect();
            let mut trace = base_trace(kind, table, x, y, "", &rows, false);
            trace.marker = Some(Marker {
                color: MarkerColor::Values(values_at(color, &rows)),
                coloraxis: Some("coloraxis"),
                symbol: (kind == ChartKind::Scatter).then_some("circle"),
            });
            vec![trace]
        }
        (Some(color), None) => group_rows(color)
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let mut trace = base_trace(kind, table, x, y, &group.name, &group.rows, true);
                paint(&mut trace, kind, PALETTE[i % PALETTE.len()]);
                trace
            })
            .collect(),
        (None, None) => {
            let rows: Vec<usize> = (0..table.row_count()).collect();
            let mut trace = base_trace(kind, table, x, y, "", &rows, false);
            paint(&mut trace, kind, PALETTE[0]);
            vec![trace]
        }
    };

    let x_title = match (x, kind) {
        (Some(x), _) => Some(x.name.as_str()),
        (None, ChartKind::Box) => None,
        (None, _) => Some(INDEX_TITLE),
    };

    let mut figure = Figure {
        data,
        layout: Layout {
            xaxis: Axis::new("y", x_title),
            yaxis: Axis::new("x", Some(y.name.as_str())),
            legend: Legend {
                title: color
                    .filter(|_| continuous.is_none())
                    .map(|c| Title::new(&c.name)),
                tracegroupgap: 0,
            },
            margin: Margin::default(),
            barmode: (kind == ChartKind::Bar).then_some("relative"),
            boxmode: (kind == ChartKind::Box).then_some("group"),
            coloraxis: continuous.map(|c| ColorAxis {
                colorbar: ColorBar {
                    title: Title::new(&c.name),
                },
                colorscale: plasma(),
            }),
            paper_bgcolor: None,
            plot_bgcolor: None,
            hovermode: None,
        },
    };
    apply_dashboard_layout(&mut figure);

    tracing::debug!(
        kind = kind.as_str(),
        y = %y.name,
        traces = figure.data.len(),
        "Built chart"
    );

    Ok(figure)
}

/// Fixed layout applied to every chart.
pub fn apply_dashboard_layout(figure: &mut Figure) {
    let layout = &mut figure.layout;
    layout.margin = Margin {
        l: MARGIN,
        r: MARGIN,
        t: MARGIN,
        b: MARGIN,
    };
    layout.paper_bgcolor = Some(TRANSPARENT);
    layout.plot_bgcolor = Some(TRANSPARENT);
    layout.hovermode = Some("closest");
}

fn selector<'t>(table: &'t Table, name: Option<&str>) -> Option<&'t Column> {
    name.filter(|n| !n.is_empty()).and_then(|n| table.column(n))
}

fn base_trace(
    kind: ChartKind,
    table: &Table,
    x: Option<&Column>,
    y: &Column,
    name: &str,
    rows: &[usize],
    showlegend: bool,
) -> Trace {
    let x_values = match (x, kind) {
        (Some(x), _) => Some(values_at(x, rows)),
        (None, ChartKind::Box) => None,
        (None, _) => Some(index_values(table, rows)),
    };

    let (trace_type, mode) = match kind {
        ChartKind::Line => ("scatter", Some("lines")),
        ChartKind::Scatter => ("scatter", Some("markers")),
        ChartKind::Bar => ("bar", None),
        ChartKind::Box => ("box", None),
    };

    Trace {
        trace_type,
        mode,
        name: name.to_string(),
        legendgroup: name.to_string(),
        showlegend,
        x: x_values,
        y: values_at(y, rows),
        xaxis: "x",
        yaxis: "y",
        orientation: matches!(kind, ChartKind::Bar | ChartKind::Box).then_some("v"),
        marker: None,
        line: None,
    }
}

fn paint(trace: &mut Trace, kind: ChartKind, color: &'static str) {
    match kind {
        ChartKind::Line => {
            trace.line = Some(Line {
                color,
                dash: "solid",
            })
        }
        ChartKind::Scatter => {
            trace.marker = Some(Marker {
                color: MarkerColor::Solid(color),
                coloraxis: None,
                symbol: Some("circle"),
            })
        }
        ChartKind::Bar | ChartKind::Box => {
            trace.marker = Some(Marker {
                color: MarkerColor::Solid(color),
                coloraxis: None,
                symbol: None,
            })
        }
    }
}

/// Split rows by the display value of `column`, in order of first appearance.
/// Rows with a null color are left out.
fn group_rows(column: &Column) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in 0..column.len() {
        let value = column.data.value(row);
        if value.is_null() {
            continue;
        }
        let name = value.to_string();
        let position = match positions.get(&name) {
            Some(&p) => p,
            None => {
                positions.insert(name.clone(), groups.len());
                groups.push(Group {
                    name,
                    rows: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[position].rows.push(row);
    }
    groups
}

fn values_at(column: &Column, rows: &[usize]) -> Vec<PlotValue> {
    rows.iter()
        .map(|&row| PlotValue::from(column.data.value(row)))
        .collect()
}

/// Row index labels, as integers when they parse as such.
fn index_values(table: &Table, rows: &[usize]) -> Vec<PlotValue> {
    let index = table.index();
    rows.iter()
        .map(|&row| match index.get(row) {
            Some(label) => label
                .parse::<i64>()
                .map(PlotValue::Int)
                .unwrap_or_else(|_| PlotValue::Text(label.clone())),
            None => PlotValue::Null,
        })
        .collect()
}

fn plasma() -> Vec<(f64, &'static str)> {
    let last = (PLASMA.len() - 1) as f64;
    PLASMA
        .iter()
        .enumerate()
        .map(|(i, color)| (i as f64 / last, *color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;
    use serde_json::json;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("day", ColumnData::Int64(vec![Some(1), Some(2), Some(3), Some(4)])),
            Column::new(
                "sales",
                ColumnData::Float64(vec![Some(10.0), Some(f64::INFINITY), Some(7.5), Some(3.0)]),
            ),
            Column::new(
                "region",
                ColumnData::Text(vec![
                    Some("north".into()),
                    Some("south".into()),
                    Some("north".into()),
                    None,
                ]),
            ),
        ])
        .unwrap()
    }

    fn request(
        kind: ChartKind,
        x: Option<&str>,
        y: Option<&str>,
        color: Option<&str>,
    ) -> ChartRequest {
        ChartRequest {
            kind,
            x: x.map(String::from),
            y: y.map(String::from),
            color: color.map(String::from),
        }
    }

    fn to_json(figure: &Figure) -> serde_json::Value {
        serde_json::to_value(figure).unwrap()
    }

    #[test]
    fn test_kind_from_param() {
        assert_eq!(ChartKind::from_param(Some("bar")), ChartKind::Bar);
        assert_eq!(ChartKind::from_param(Some("scatter")), ChartKind::Scatter);
        assert_eq!(ChartKind::from_param(Some("box")), ChartKind::Box);
        assert_eq!(ChartKind::from_param(Some("line")), ChartKind::Line);
        assert_eq!(ChartKind::from_param(Some("pie")), ChartKind::Line);
        assert_eq!(ChartKind::from_param(None), ChartKind::Line);
    }

    #[test]
    fn test_missing_y() {
        let table = sample();
        let err = build_chart(&table, &request(ChartKind::Bar, None, None, None)).unwrap_err();
        assert_eq!(err.to_string(), "Y column not found");

        let result = build_chart(&table, &request(ChartKind::Bar, None, Some("nope"), None));
        assert!(matches!(result, Err(ChartError::ColumnNotFound { .. })));
    }

    #[test]
    fn test_line_chart_shape() {
        let figure =
            build_chart(&sample(), &request(ChartKind::Line, Some("day"), Some("sales"), None))
                .unwrap();
        let fig = to_json(&figure);

        assert_eq!(fig["data"].as_array().unwrap().len(), 1);
        let trace = &fig["data"][0];
        assert_eq!(trace["type"], "scatter");
        assert_eq!(trace["mode"], "lines");
        assert_eq!(trace["x"], json!([1, 2, 3, 4]));
        // infinity is not valid JSON
        assert_eq!(trace["y"], json!([10.0, null, 7.5, 3.0]));
        assert_eq!(trace["line"]["color"], PALETTE[0]);
        assert_eq!(fig["layout"]["xaxis"]["title"]["text"], "day");
        assert_eq!(fig["layout"]["yaxis"]["title"]["text"], "sales");
    }

    #[test]
    fn test_dashboard_layout_applied() {
        let scatter = request(ChartKind::Scatter, None, Some("sales"), None);
        let figure = build_chart(&sample(), &scatter).unwrap();
        let layout = to_json(&figure)["layout"].clone();

        assert_eq!(layout["margin"], json!({"l": 40, "r": 40, "t": 40, "b": 40}));
        assert_eq!(layout["paper_bgcolor"], "rgba(0,0,0,0)");
        assert_eq!(layout["plot_bgcolor"], "rgba(0,0,0,0)");
        assert_eq!(layout["hovermode"], "closest");
    }

    #[test]
    fn test_missing_x_uses_index() {
        let figure =
            build_chart(&sample(), &request(ChartKind::Bar, None, Some("sales"), None)).unwrap();
        let fig = to_json(&figure);

        assert_eq!(fig["data"][0]["x"], json!([0, 1, 2, 3]));
        assert_eq!(fig["layout"]["xaxis"]["title"]["text"], "index");
        assert_eq!(fig["layout"]["barmode"], "relative");
    }

    #[test]
    fn test_unknown_x_is_ignored() {
        let ghost = request(ChartKind::Line, Some("ghost"), Some("sales"), None);
        let index = request(ChartKind::Line, None, Some("sales"), None);
        let a = build_chart(&sample(), &ghost).unwrap();
        let b = build_chart(&sample(), &index).unwrap();
        assert_eq!(to_json(&a), to_json(&b));
    }

    #[test]
    fn test_box_without_x_omits_x() {
        let figure =
            build_chart(&sample(), &request(ChartKind::Box, None, Some("sales"), None)).unwrap();
        let fig = to_json(&figure);

        assert_eq!(fig["data"][0]["type"], "box");
        assert!(fig["data"][0].get("x").is_none());
        assert_eq!(fig["layout"]["boxmode"], "group");
        assert!(fig["layout"]["xaxis"].get("title").is_none());
    }

    #[test]
    fn test_categorical_color_splits_traces() {
        let figure = build_chart(
            &sample(),
            &request(ChartKind::Scatter, Some("day"), Some("sales"), Some("region")),
        )
        .unwrap();
        let fig = to_json(&figure);
        let traces = fig["data"].as_array().unwrap();

        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0]["name"], "north");
        assert_eq!(traces[0]["x"], json!([1, 3]));
        assert_eq!(traces[0]["marker"]["color"], PALETTE[0]);
        assert_eq!(traces[1]["name"], "south");
        assert_eq!(traces[1]["marker"]["color"], PALETTE[1]);
        assert_eq!(traces[1]["showlegend"], true);
        assert_eq!(fig["layout"]["legend"]["title"]["text"], "region");
    }

    #[test]
    fn test_numeric_color_on_scatter_is_continuous() {
        let figure = build_chart(
            &sample(),
            &request(ChartKind::Scatter, Some("day"), Some("sales"), Some("day")),
        )
        .unwrap();
        let fig = to_json(&figure);

        assert_eq!(fig["data"].as_array().unwrap().len(), 1);
        assert_eq!(fig["data"][0]["marker"]["color"], json!([1, 2, 3, 4]));
        assert_eq!(fig["data"][0]["marker"]["coloraxis"], "coloraxis");
        assert_eq!(fig["layout"]["coloraxis"]["colorbar"]["title"]["text"], "day");
        assert_eq!(fig["layout"]["coloraxis"]["colorscale"][0], json!([0.0, "#0d0887"]));
        assert!(fig["layout"]["legend"].get("title").is_none());
    }

    #[test]
    fn test_numeric_color_on_line_is_discrete() {
        let figure = build_chart(
            &sample(),
            &request(ChartKind::Line, Some("day"), Some("sales"), Some("day")),
        )
        .unwrap();
        assert_eq!(figure.data.len(), 4);
        assert_eq!(figure.data[3].name, "4");
    }

    #[test]
    fn test_datetime_values_render_iso() {
        let table = Table::new(vec![
            Column::new("ts", ColumnData::Datetime(vec![Some(0), Some(86_400_000)])),
            Column::new("v", ColumnData::Int64(vec![Some(1), Some(2)])),
        ])
        .unwrap();
        let figure =
            build_chart(&table, &request(ChartKind::Line, Some("ts"), Some("v"), None)).unwrap();

        assert_eq!(
            to_json(&figure)["data"][0]["x"],
            json!(["1970-01-01T00:00:00", "1970-01-02T00:00:00"])
        );
    }
}
