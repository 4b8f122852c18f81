//! Charts drawn with plain HTML and SVG primitives.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use super::escape_html;
use crate::error::{Error, Result};

/// Colours assigned to data points in order, cycling.
pub const PALETTE: [&str; 18] = [
    "#1976d2", "#dc004e", "#9c27b0", "#673ab7", "#3f51b5", "#2196f3", "#03a9f4", "#00bcd4",
    "#009688", "#4caf50", "#8bc34a", "#cddc39", "#ffeb3b", "#ffc107", "#ff9800", "#ff5722",
    "#795548", "#607d8b",
];

const LINE_COLOR: &str = "#1976d2";

/// `count` palette colours.
pub fn palette(count: usize) -> Vec<String> {
    PALETTE.iter().cycle().take(count).map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Scatter,
    ];

    /// Parses a chart type name; unknown names draw as bars.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "line" => ChartKind::Line,
            "pie" | "doughnut" => ChartKind::Pie,
            "scatter" => ChartKind::Scatter,
            _ => ChartKind::Bar,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
    pub border_color: String,
}

impl Dataset {
    fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        let colors = palette(data.len());
        Self {
            label: label.into(),
            data,
            colors,
            border_color: LINE_COLOR.to_string(),
        }
    }

    fn color(&self, index: usize) -> &str {
        self.colors
            .get(index)
            .or_else(|| self.colors.first())
            .map_or(LINE_COLOR, String::as_str)
    }
}

/// Chart data normalized to labels plus datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// `Number(v) || 0` as the agent's payloads expect.
fn js_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numbers(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|items| items.iter().map(js_number).collect())
        .unwrap_or_default()
}

fn labels(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().map(label_text).collect())
        .unwrap_or_default()
}

fn parse_dataset(value: &Value, index: usize) -> Dataset {
    let label = value
        .get("label")
        .map(label_text)
        .unwrap_or_else(|| format!("Dataset {}", index + 1));
    let mut dataset = Dataset::new(label, numbers(value.get("data").unwrap_or(&Value::Null)));
    match value.get("backgroundColor") {
        Some(Value::String(color)) => dataset.colors = vec![color.clone()],
        Some(Value::Array(colors)) if !colors.is_empty() => {
            dataset.colors = colors.iter().map(label_text).collect()
        }
        _ => {}
    }
    if let Some(Value::String(color)) = value.get("borderColor") {
        dataset.border_color = color.clone();
    }
    dataset
}

impl ChartData {
    /// Accepts any of the payload shapes the agent emits.
    ///
    /// - `{labels, datasets}`
    /// - `{chartData: <any accepted shape>}`
    /// - `{labels, values, label?}`
    /// - `[{<label key>: .., <value key>: ..}, ..]`
    /// - `{<label>: <number>, ..}`
    pub fn normalize(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_object(map),
            Value::Array(items) => Self::from_records(items),
            _ => Err(Error::render("chart", "expected an object or array")),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Result<Self> {
        let has = |key: &str| map.get(key).is_some_and(|v| !v.is_null());
        if has("labels") && has("datasets") {
            let datasets = map["datasets"]
                .as_array()
                .ok_or_else(|| Error::render("chart", "datasets must be an array"))?
                .iter()
                .enumerate()
                .map(|(i, d)| parse_dataset(d, i))
                .collect();
            return Ok(Self {
                labels: labels(&map["labels"]),
                datasets,
            });
        }
        if let Some(inner) = map.get("chartData").filter(|v| !v.is_null()) {
            return Self::normalize(inner);
        }
        if has("labels") && has("values") {
            let label = map
                .get("label")
                .filter(|v| !v.is_null())
                .map_or_else(|| "Dataset".to_string(), label_text);
            return Ok(Self {
                labels: labels(&map["labels"]),
                datasets: vec![Dataset::new(label, numbers(&map["values"]))],
            });
        }
        if map.is_empty() {
            return Err(Error::render("chart", "no data points"));
        }
        let labels = map.keys().cloned().collect();
        let values = map.values().map(js_number).collect();
        Ok(Self {
            labels,
            datasets: vec![Dataset::new("Values", values)],
        })
    }

    fn from_records(items: &[Value]) -> Result<Self> {
        let first = items
            .first()
            .and_then(Value::as_object)
            .ok_or_else(|| Error::render("chart", "expected an array of objects"))?;
        let mut keys = first.keys();
        let (Some(label_key), Some(value_key)) = (keys.next(), keys.next()) else {
            return Err(Error::render("chart", "records need a label and a value"));
        };
        let labels = items
            .iter()
            .map(|item| item.get(label_key).map_or_else(|| "undefined".to_string(), label_text))
            .collect();
        let values = items
            .iter()
            .map(|item| item.get(value_key).map_or(0.0, js_number))
            .collect();
        Ok(Self {
            labels,
            datasets: vec![Dataset::new(value_key.clone(), values)],
        })
    }

    /// `Label,<dataset labels..>` followed by one row per label.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.labels.len() + 1);
        let header = std::iter::once("Label".to_string())
            .chain(self.datasets.iter().map(|d| d.label.clone()))
            .collect::<Vec<_>>();
        lines.push(header.join(","));
        for (i, label) in self.labels.iter().enumerate() {
            let row = std::iter::once(label.clone())
                .chain(
                    self.datasets
                        .iter()
                        .map(|d| d.data.get(i).map(f64::to_string).unwrap_or_default()),
                )
                .collect::<Vec<_>>();
            lines.push(row.join(","));
        }
        lines.join("\n")
    }
}

/// A chart plus the user-selected chart type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    data: ChartData,
    kind: ChartKind,
}

impl ChartView {
    pub fn new(data: ChartData, kind: ChartKind) -> Self {
        Self { data, kind }
    }

    pub fn from_value(value: &Value, chart_type: &str) -> Result<Self> {
        Ok(Self::new(ChartData::normalize(value)?, ChartKind::from_name(chart_type)))
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ChartKind) {
        self.kind = kind;
    }

    pub fn to_csv(&self) -> String {
        self.data.to_csv()
    }

    pub fn render(&self) -> String {
        let body = match self.data.datasets.first() {
            None => r#"<p class="chart-empty">No data</p>"#.to_string(),
            Some(dataset) => match self.kind {
                ChartKind::Bar => self.render_bar(dataset),
                ChartKind::Line => self.render_line(dataset),
                ChartKind::Pie => self.render_pie(dataset),
                ChartKind::Scatter => self.render_scatter(dataset),
            },
        };
        format!(
            r#"<div class="famarex-chart" data-chart-type="{kind}" style="border: 1px solid #e0e0e0; border-radius: 4px;"><div class="chart-header" style="padding: 8px;">{points} data points</div><div class="chart-body" style="padding: 16px; min-height: 200px;">{body}</div><div class="chart-footer" style="padding: 4px 16px; background: #fafafa; color: #757575;">{datasets} dataset(s) • {points} labels</div></div>"#,
            kind = self.kind.name(),
            points = self.data.labels.len(),
            datasets = self.data.datasets.len(),
        )
    }

    fn scale(dataset: &Dataset) -> f64 {
        let max = dataset.data.iter().copied().fold(f64::MIN, f64::max);
        if max > 0.0 { max } else { 1.0 }
    }

    fn render_bar(&self, dataset: &Dataset) -> String {
        let max = Self::scale(dataset);
        let mut out = String::new();
        for (i, label) in self.data.labels.iter().enumerate() {
            let value = dataset.data.get(i).copied().unwrap_or(0.0);
            let pct = (value / max * 100.0).clamp(0.0, 100.0);
            let _ = write!(
                out,
                r#"<div class="chart-bar" style="margin-bottom: 8px;"><div style="display: flex; justify-content: space-between;"><span>{}</span><strong>{}</strong></div><div style="height: 20px; background: #eeeeee; border-radius: 4px; overflow: hidden;"><div style="width: {:.1}%; height: 100%; background: {};"></div></div></div>"#,
                escape_html(label),
                value,
                pct,
                escape_html(dataset.color(i)),
            );
        }
        out
    }

    fn points(dataset: &Dataset) -> Vec<(f64, f64)> {
        let max = Self::scale(dataset);
        let n = dataset.data.len();
        dataset
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = if n > 1 {
                    i as f64 / (n - 1) as f64 * 400.0
                } else {
                    200.0
                };
                (x, 200.0 - v / max * 180.0)
            })
            .collect()
    }

    fn grid() -> String {
        (0..5)
            .map(|i| {
                format!(
                    r##"<line x1="0" y1="{y}" x2="400" y2="{y}" stroke="#e0e0e0" stroke-width="1" />"##,
                    y = i * 40
                )
            })
            .collect()
    }

    fn axis_labels(&self) -> String {
        let labels: String = self
            .data
            .labels
            .iter()
            .map(|l| format!("<span>{}</span>", escape_html(l)))
            .collect();
        format!(r#"<div class="chart-labels" style="display: flex; justify-content: space-between; font-size: 0.75rem;">{labels}</div>"#)
    }

    fn render_line(&self, dataset: &Dataset) -> String {
        let points = Self::points(dataset);
        let color = escape_html(&dataset.border_color);
        let polyline = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        let mut svg = format!(
            r#"<svg width="100%" height="200" viewBox="0 0 400 200">{}<polyline points="{polyline}" fill="none" stroke="{color}" stroke-width="2" />"#,
            Self::grid()
        );
        for (x, y) in &points {
            let _ = write!(svg, r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{color}" />"#);
        }
        svg.push_str("</svg>");
        svg + &self.axis_labels()
    }

    fn render_scatter(&self, dataset: &Dataset) -> String {
        let mut svg = format!(
            r#"<svg width="100%" height="200" viewBox="0 0 400 200">{}"#,
            Self::grid()
        );
        for (i, (x, y)) in Self::points(dataset).iter().enumerate() {
            let _ = write!(
                svg,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="5" fill="{}" />"#,
                escape_html(dataset.color(i))
            );
        }
        svg.push_str("</svg>");
        svg + &self.axis_labels()
    }

    fn render_pie(&self, dataset: &Dataset) -> String {
        let total: f64 = dataset.data.iter().filter(|v| **v > 0.0).sum();
        let mut legend = String::new();
        let mut svg = String::from(r#"<svg width="200" height="200" viewBox="-100 -100 200 200">"#);
        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, label) in self.data.labels.iter().enumerate() {
            let value = dataset.data.get(i).copied().unwrap_or(0.0).max(0.0);
            let share = if total > 0.0 { value / total } else { 0.0 };
            let color = escape_html(dataset.color(i));
            let _ = write!(
                legend,
                r#"<span class="chart-legend" style="background: {color}; color: #fff; border-radius: 12px; padding: 2px 8px; margin: 2px; display: inline-block; font-weight: bold;">{}: {:.1}%</span>"#,
                escape_html(label),
                share * 100.0
            );
            if share <= 0.0 {
                continue;
            }
            if share >= 1.0 {
                let _ = write!(svg, r#"<circle cx="0" cy="0" r="90" fill="{color}" />"#);
                continue;
            }
            let sweep = share * std::f64::consts::TAU;
            let (x1, y1) = (90.0 * angle.cos(), 90.0 * angle.sin());
            let (x2, y2) = (90.0 * (angle + sweep).cos(), 90.0 * (angle + sweep).sin());
            let large = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let _ = write!(
                svg,
                r#"<path d="M 0 0 L {x1:.2} {y1:.2} A 90 90 0 {large} 1 {x2:.2} {y2:.2} Z" fill="{color}" />"#
            );
            angle += sweep;
        }
        svg.push_str("</svg>");
        format!(
            r#"<div class="chart-legend-row">{legend}</div><div style="text-align: center;">{svg}<p>Total: {total}</p></div>"#
        )
    }
}
