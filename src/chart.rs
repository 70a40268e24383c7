use crate::config::DisplayTz;
use crate::csv_export::format_time;
use crate::cumulative_price_change::SymbolSeries;
use crate::error::Result;
use crate::extremes::Extremes;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

/// Text label pinned to the last bar of a best or worst performer.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Annotation {
    pub label: String,
    pub x: String,
    pub y: f64,
    pub text: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChartPayload {
    pub title: String,
    pub generated_at: String,
    pub series: Vec<ChartSeries>,
    pub extremes: Vec<Annotation>,
}

/// `"ABC  -5.0%"`: label, two spaces, signed percentage with one decimal.
pub fn annotation_text(label: &str, return_pct: f64) -> String {
    format!("{}  {:+.1}%", label, return_pct * 100.0)
}

pub fn build_payload(
    title: &str,
    series: &[SymbolSeries],
    extremes: &Extremes<'_>,
    generated_at: DateTime<Utc>,
    tz: &DisplayTz,
) -> ChartPayload {
    let chart_series = series
        .iter()
        .map(|s| ChartSeries {
            name: s.label.clone(),
            x: s.points.iter().map(|p| format_time(p.timestamp, tz)).collect(),
            y: s.points.iter().map(|p| p.return_pct).collect(),
        })
        .collect();

    let annotations = extremes
        .iter()
        .filter_map(|s| {
            let last = s.points.last()?;
            Some(Annotation {
                label: s.label.clone(),
                x: format_time(last.timestamp, tz),
                y: last.return_pct,
                text: annotation_text(&s.label, last.return_pct),
            })
        })
        .collect();

    ChartPayload {
        title: title.to_string(),
        generated_at: format!("{} ({})", format_time(generated_at, tz), tz),
        series: chart_series,
        extremes: annotations,
    }
}

const HTML_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #0f1115; color: #d8dee9; }
  header { padding: 12px 20px; }
  header h1 { font-size: 18px; margin: 0 0 4px; }
  header p { font-size: 12px; margin: 0; color: #8a93a6; }
  #chart { width: 100vw; height: calc(100vh - 64px); }
</style>
</head>
<body>
<header>
  <h1>{{TITLE}}</h1>
  <p>Generated {{GENERATED}}</p>
</header>
<div id="chart"></div>
<script type="application/json" id="chart-data">{{PAYLOAD}}</script>
<script>
  const payload = JSON.parse(document.getElementById("chart-data").textContent);
  const traces = payload.series.map((s) => ({
    name: s.name,
    x: s.x,
    y: s.y,
    type: "scatter",
    mode: "lines",
    line: { width: 1.2 },
    hovertemplate: "%{x}<br>%{y:.2%}",
  }));
  const annotations = payload.extremes.map((a) => ({
    x: a.x,
    y: a.y,
    text: a.text,
    showarrow: false,
    xanchor: "left",
    font: { size: 11, color: a.y >= 0 ? "#4cd97b" : "#ff6b6b" },
  }));
  Plotly.newPlot("chart", traces, {
    paper_bgcolor: "#0f1115",
    plot_bgcolor: "#0f1115",
    font: { color: "#d8dee9" },
    yaxis: { tickformat: ".1%", zeroline: true, gridcolor: "#222733" },
    xaxis: { gridcolor: "#222733" },
    hovermode: "closest",
    annotations: annotations,
    margin: { l: 60, r: 120, t: 20, b: 40 },
  }, { responsive: true });
</script>
</body>
</html>
"##;

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone page with the payload embedded as JSON.
pub fn render_html(payload: &ChartPayload) -> Result<String> {
    // "</" inside the JSON would close the data script early.
    let json = serde_json::to_string(payload)?.replace("</", "<\\/");
    Ok(HTML_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&payload.title))
        .replace("{{GENERATED}}", &escape_html(&payload.generated_at))
        .replace("{{PAYLOAD}}", &json))
}
