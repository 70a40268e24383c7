use crate::config::DisplayTz;
use crate::cumulative_price_change::SymbolSeries;
use crate::error::{Result, ScreenerError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(ts: DateTime<Utc>, tz: &DisplayTz) -> String {
    tz.format(ts, TIME_FORMAT)
}

/// One row per distinct timestamp, one column per symbol, blank where a symbol has no bar.
pub fn write_returns<W: Write>(writer: W, series: &[SymbolSeries], tz: &DisplayTz) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(series.len() + 1);
    header.push("time");
    header.extend(series.iter().map(|s| s.symbol.as_str()));
    wtr.write_record(&header)?;

    let columns: Vec<HashMap<DateTime<Utc>, f64>> = series
        .iter()
        .map(|s| s.points.iter().map(|p| (p.timestamp, p.return_pct)).collect())
        .collect();
    let times: BTreeSet<DateTime<Utc>> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.timestamp))
        .collect();

    for ts in times {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(format_time(ts, tz));
        record.extend(
            columns
                .iter()
                .map(|col| col.get(&ts).map(|v| format!("{:.6}", v)).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(series: &[SymbolSeries], tz: &DisplayTz) -> Result<String> {
    let mut buf = Vec::new();
    write_returns(&mut buf, series, tz)?;
    String::from_utf8(buf).map_err(|e| ScreenerError::Decode(e.to_string()))
}
