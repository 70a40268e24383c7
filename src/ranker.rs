use crate::cache::TtlCache;
use crate::config::{FetchConfig, Interval, RankWindow};
use crate::exchange::BinanceClient;
use crate::find_tickers::TickerSnapshot;
use crate::klines::{fetch_each, fetch_klines};
use log::info;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rolling mode always considers at least this many 24h leaders.
pub const ROLLING_SUPERSET: usize = 200;

fn by_volume_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Highest 24h quote volume first, ties in snapshot order.
pub fn rank_direct(mut candidates: Vec<TickerSnapshot>, top_n: usize) -> Vec<TickerSnapshot> {
    candidates.sort_by(|a, b| by_volume_desc(a.quote_volume, b.quote_volume));
    candidates.truncate(top_n);
    candidates
}

pub fn rank_by_volume(mut volumes: Vec<(String, f64)>, top_n: usize) -> Vec<String> {
    volumes.sort_by(|a, b| by_volume_desc(a.1, b.1));
    volumes.into_iter().take(top_n).map(|(symbol, _)| symbol).collect()
}

pub fn cache_key(symbol: &str, window: RankWindow) -> String {
    format!("{}:{}", symbol, window.as_str())
}

/// Selects the `top_n` symbols to chart under the configured volume window.
pub async fn rank(
    client: &BinanceClient,
    candidates: Vec<TickerSnapshot>,
    window: RankWindow,
    top_n: usize,
    fetch: &FetchConfig,
    cache: &mut TtlCache<f64>,
    now_ms: i64,
) -> Vec<String> {
    let Some(days) = window.rolling_days() else {
        return rank_direct(candidates, top_n).into_iter().map(|t| t.symbol).collect();
    };

    let pool = rank_direct(candidates, top_n.max(ROLLING_SUPERSET));
    let mut sums: HashMap<String, f64> = HashMap::with_capacity(pool.len());
    let mut missing = Vec::new();
    for ticker in &pool {
        match cache.get(&cache_key(&ticker.symbol, window), now_ms) {
            Some(sum) => {
                sums.insert(ticker.symbol.clone(), sum);
            }
            None => missing.push(ticker.symbol.clone()),
        }
    }

    info!(
        "ranking by {} volume: {} cached, {} to fetch",
        window.as_str(),
        sums.len(),
        missing.len()
    );

    let outcome = fetch_each(&missing, fetch, |symbol| async move {
        fetch_klines(client, &symbol, Interval::D1, days)
            .await
            .map(|daily| daily.iter().map(|c| c.quote_volume).sum::<f64>())
    })
    .await;

    for (symbol, sum) in outcome.ok {
        cache.insert(cache_key(&symbol, window), sum, now_ms);
        sums.insert(symbol, sum);
    }

    // Equal sums keep their 24h order whether they came from the cache or not.
    let volumes = pool
        .into_iter()
        .filter_map(|t| sums.get(&t.symbol).map(|&sum| (t.symbol, sum)))
        .collect();
    rank_by_volume(volumes, top_n)
}
