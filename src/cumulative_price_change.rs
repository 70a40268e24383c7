use crate::config::LabelStyle;
use crate::filter_utils::display_label;
use crate::klines::Candle;
use chrono::{DateTime, Utc};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub timestamp: DateTime<Utc>,
    /// Fraction since the first bar: 0.05 is +5%.
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub label: String,
    pub points: Vec<ReturnPoint>,
}

impl SymbolSeries {
    /// Return at the last bar. Series built here are never empty.
    pub fn final_return(&self) -> f64 {
        self.points.last().map_or(f64::NAN, |p| p.return_pct)
    }
}

/// Return-since-first-bar for every candle.
///
/// Empty input or an unusable first close yields an empty series.
pub fn normalize(candles: &[Candle]) -> Vec<ReturnPoint> {
    let Some(first) = candles.first() else {
        return Vec::new();
    };
    let first_close = first.close;
    if first_close == 0.0 || !first_close.is_finite() {
        return Vec::new();
    }

    candles
        .iter()
        .filter(|c| c.close.is_finite())
        .map(|c| ReturnPoint {
            timestamp: c.open_time,
            return_pct: c.close / first_close - 1.0,
        })
        .collect()
}

/// Normalizes every fetched symbol, silently dropping degenerate series.
pub fn run(fetched: Vec<(String, Vec<Candle>)>, label_style: LabelStyle) -> Vec<SymbolSeries> {
    let mut results = Vec::with_capacity(fetched.len());

    for (symbol, candles) in fetched {
        let points = normalize(&candles);
        if points.is_empty() {
            debug!("dropping {}: no usable candles", symbol);
            continue;
        }
        results.push(SymbolSeries {
            label: display_label(&symbol, label_style),
            symbol,
            points,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: DateTime::from_timestamp(1_700_000_000 + i as i64 * 300, 0).unwrap(),
                close,
                quote_volume: 0.0,
            })
            .collect()
    }

    fn returns(points: &[ReturnPoint]) -> Vec<f64> {
        points.iter().map(|p| (p.return_pct * 1e6).round() / 1e6).collect()
    }

    #[test]
    fn returns_relative_to_first_close() {
        let points = normalize(&candles(&[100.0, 110.0, 90.0]));
        assert_eq!(returns(&points), vec![0.0, 0.1, -0.1]);
        assert_eq!(points[0].return_pct, 0.0);
    }

    #[test]
    fn degenerate_input_gives_empty_series() {
        assert!(normalize(&[]).is_empty());
        assert!(normalize(&candles(&[0.0, 1.0, 2.0])).is_empty());
        assert!(normalize(&candles(&[f64::NAN, 1.0])).is_empty());
    }

    #[test]
    fn run_labels_and_drops_empty_series() {
        let fetched = vec![
            ("ABCUSDT".to_string(), candles(&[1.0, 1.05, 0.95])),
            ("ZEROUSDT".to_string(), candles(&[0.0, 1.0])),
            ("NONEUSDT".to_string(), Vec::new()),
        ];
        let series = run(fetched, LabelStyle::Base);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "ABC");
        assert_eq!(returns(&series[0].points), vec![0.0, 0.05, -0.05]);
        assert!((series[0].final_return() + 0.05).abs() < 1e-9);
    }
}
