use crate::config::{FetchConfig, Interval, KlineConfig};
use crate::error::{Result, ScreenerError};
use crate::exchange::BinanceClient;
use crate::lenient::{value_as_f64, value_as_i64};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde_json::Value;
use std::future::Future;

// Column positions in a raw kline row:
// [openTime, open, high, low, close, volume, closeTime, quoteAssetVolume, trades, ...]
const OPEN_TIME: usize = 0;
const CLOSE: usize = 4;
const QUOTE_ASSET_VOLUME: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub quote_volume: f64,
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    let open_time = DateTime::from_timestamp_millis(value_as_i64(row.get(OPEN_TIME)?)?)?;
    let close = value_as_f64(row.get(CLOSE)?)?;
    let quote_volume = row.get(QUOTE_ASSET_VOLUME).and_then(value_as_f64).unwrap_or(0.0);
    Some(Candle { open_time, close, quote_volume })
}

/// Candles for one symbol, oldest first.
pub async fn fetch_klines(
    client: &BinanceClient,
    symbol: &str,
    interval: Interval,
    limit: u32,
) -> Result<Vec<Candle>> {
    let query = [
        ("symbol", symbol.to_string()),
        ("interval", interval.as_str().to_string()),
        ("limit", limit.to_string()),
    ];
    let rows: Vec<Vec<Value>> = client.get_json("/api/v3/klines", &query).await?;

    let mut candles = rows
        .iter()
        .map(|row| parse_row(row))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ScreenerError::Decode(format!("{}: malformed kline row", symbol)))?;
    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

/// Per-symbol results of a fetch round. `ok` keeps the input order.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub ok: Vec<(String, T)>,
    pub failed: Vec<String>,
}

/// Runs `op` for every symbol, sequentially with a pause or through a bounded pool.
///
/// Failures are logged and collected; they never stop the round.
pub async fn fetch_each<T, F, Fut>(symbols: &[String], fetch: &FetchConfig, op: F) -> FetchOutcome<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut indexed: Vec<(usize, String, T)> = Vec::with_capacity(symbols.len());
    let mut failed = Vec::new();

    let mut record = |index: usize, symbol: String, result: Result<T>| match result {
        Ok(value) => indexed.push((index, symbol, value)),
        Err(e) => {
            warn!("skipping {}: {}", symbol, e);
            failed.push(symbol);
        }
    };

    if fetch.concurrency <= 1 {
        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 && !fetch.request_delay.is_zero() {
                tokio::time::sleep(fetch.request_delay).await;
            }
            let result = op(symbol.clone()).await;
            record(index, symbol.clone(), result);
        }
    } else {
        let mut pending = stream::iter(symbols.iter().cloned().enumerate())
            .map(|(index, symbol)| {
                let fut = op(symbol.clone());
                async move { (index, symbol, fut.await) }
            })
            .buffer_unordered(fetch.concurrency);

        while let Some((index, symbol, result)) = pending.next().await {
            record(index, symbol, result);
        }
    }

    indexed.sort_by_key(|(index, _, _)| *index);
    FetchOutcome {
        ok: indexed.into_iter().map(|(_, symbol, value)| (symbol, value)).collect(),
        failed,
    }
}

/// Fetches the charted candle series for every selected symbol.
pub async fn run(
    client: &BinanceClient,
    symbols: &[String],
    klines: &KlineConfig,
    fetch: &FetchConfig,
) -> FetchOutcome<Vec<Candle>> {
    let limit = klines.limit();
    info!(
        "fetching {} candles at {} for {} symbols (concurrency {})",
        limit,
        klines.interval,
        symbols.len(),
        fetch.concurrency
    );

    fetch_each(symbols, fetch, |symbol| async move {
        fetch_klines(client, &symbol, klines.interval, limit).await
    })
    .await
}
