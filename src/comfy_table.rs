use crate::analysis::RunReport;
use crate::config::DisplayTz;
use crate::csv_export::format_time;
use crate::cumulative_price_change::SymbolSeries;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

/// Dims smaller moves relative to the largest one in the table, never below 40%.
fn get_visibility_ratio(current_pct: f64, top_pct: f64) -> f64 {
    let ratio = 0.4 + 0.6 * (current_pct.abs() / top_pct);
    ratio.clamp(0.4, 1.0)
}

fn return_color(return_pct: f64, ratio: f64) -> Color {
    let level = (255.0 * ratio) as u8;
    if return_pct >= 0.0 {
        Color::Rgb { r: 0, g: level, b: 0 }
    } else {
        Color::Rgb { r: level, g: 0, b: 0 }
    }
}

fn add_rows(table: &mut Table, section: &str, rows: &[(usize, &SymbolSeries)], top_pct: f64) {
    for (rank, series) in rows {
        let ret = series.final_return();
        let ratio = get_visibility_ratio(ret, top_pct);
        let cyan_val = (255.0 * ratio) as u8;

        table.add_row(vec![
            Cell::new(section).fg(Color::DarkGrey),
            Cell::new(rank).fg(Color::DarkGrey),
            Cell::new(&series.label).fg(Color::Rgb { r: 0, g: cyan_val, b: cyan_val }),
            Cell::new(format!("{:+.2}%", ret * 100.0))
                .fg(return_color(ret, ratio))
                .set_alignment(CellAlignment::Right),
        ]);
    }
}

/// Terminal table of the best and worst performers.
pub fn render_summary(report: &RunReport, tz: &DisplayTz) -> String {
    if report.series.is_empty() {
        return "No data found.".to_string();
    }

    let title = format!(
        "(Data taken at {} {}, {} symbols, {} skipped)",
        format_time(report.generated_at, tz),
        tz,
        report.series.len(),
        report.skipped.len()
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Rank").add_attribute(Attribute::Bold),
            Cell::new("Asset").add_attribute(Attribute::Bold),
            Cell::new("Return (%)")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        ]);

    let top_pct = report
        .series
        .iter()
        .map(|s| s.final_return().abs())
        .fold(0.0_f64, f64::max);
    let safe_top_pct = if top_pct == 0.0 { 1.0 } else { top_pct };

    let total = report.series.len();
    let extremes = report.extremes();
    let best: Vec<(usize, &SymbolSeries)> = extremes.best.iter().enumerate().map(|(i, s)| (i + 1, *s)).collect();
    let worst_start = total - extremes.worst.len() + 1;
    let worst: Vec<(usize, &SymbolSeries)> = extremes
        .worst
        .iter()
        .enumerate()
        .map(|(i, s)| (worst_start + i, *s))
        .collect();

    add_rows(&mut table, "best", &best, safe_top_pct);
    add_rows(&mut table, "worst", &worst, safe_top_pct);

    format!("\n{}\n{}", title, table)
}
