//! This module contains the core analysis pipeline logic.

use crate::cache::TtlCache;
use crate::chart::{build_payload, render_html};
use crate::config::AppConfig;
use crate::csv_export::to_csv_string;
use crate::cumulative_price_change::{self, SymbolSeries};
use crate::exchange::BinanceClient;
use crate::extremes::{EXTREME_COUNT, Extremes, select_extremes, sort_by_final_return};
use crate::storage_utils::AsyncStorageManager;
use crate::{filter_utils, find_tickers, klines, ranker};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::PathBuf;

pub const CSV_FILE: &str = "returns.csv";
pub const JSON_FILE: &str = "chart.json";
pub const HTML_FILE: &str = "chart.html";
pub const VOLUME_CACHE_FILE: &str = "cache/volume_cache.json";

#[derive(Debug, Clone)]
pub struct Artifacts {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

#[derive(Debug)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    /// Best final return first.
    pub series: Vec<SymbolSeries>,
    /// Ranked symbols whose candles could not be fetched.
    pub skipped: Vec<String>,
    pub artifacts: Artifacts,
}

impl RunReport {
    pub fn extremes(&self) -> Extremes<'_> {
        select_extremes(&self.series, EXTREME_COUNT)
    }
}

async fn load_volume_cache(storage: &AsyncStorageManager, config: &AppConfig) -> TtlCache<f64> {
    if config.rank_window.rolling_days().is_none() || config.cache_ttl.is_zero() {
        return TtlCache::new(config.cache_ttl);
    }
    match storage.load_json::<TtlCache<f64>>(VOLUME_CACHE_FILE).await {
        Ok(cache) => cache.with_ttl(config.cache_ttl),
        Err(e) => {
            debug!("starting with an empty volume cache: {}", e);
            TtlCache::new(config.cache_ttl)
        }
    }
}

async fn save_volume_cache(storage: &AsyncStorageManager, cache: &mut TtlCache<f64>, now_ms: i64) {
    if !cache.is_enabled() {
        return;
    }
    let purged = cache.purge_expired(now_ms);
    debug!("volume cache: {} entries, {} expired", cache.len(), purged);
    if let Err(e) = storage.save_json(VOLUME_CACHE_FILE, cache).await {
        warn!("could not persist volume cache: {}", e);
    }
}

/// Runs the full pipeline and writes the CSV, chart payload and HTML page:
/// 1. Fetches the 24h ticker snapshot and filters it down to spot USDT pairs.
/// 2. Ranks candidates by volume and keeps the top N.
/// 3. Downloads candles for each selected symbol.
/// 4. Normalizes closes into returns and picks the extremes.
/// 5. Renders the artifacts.
pub async fn run_analysis_pipeline(config: &AppConfig, client: &BinanceClient) -> Result<RunReport> {
    let storage = AsyncStorageManager::new(&config.output_dir)
        .await
        .with_context(|| format!("creating output directory {:?}", config.output_dir))?;

    // Step 1: Fetch and filter tickers
    info!("--- Step 1: Fetching 24h tickers ---");
    let tickers = find_tickers::fetch_tickers(client)
        .await
        .context("fetching 24h ticker snapshot")?;
    let total = tickers.len();
    let candidates = filter_utils::filter_candidates(tickers);
    info!("{} of {} symbols are eligible", candidates.len(), total);

    // Step 2: Rank
    info!("--- Step 2: Ranking by {} volume ---", config.rank_window.as_str());
    let now_ms = Utc::now().timestamp_millis();
    let mut cache = load_volume_cache(&storage, config).await;
    let selected = ranker::rank(
        client,
        candidates,
        config.rank_window,
        config.top_n,
        &config.fetch,
        &mut cache,
        now_ms,
    )
    .await;
    save_volume_cache(&storage, &mut cache, now_ms).await;
    info!("selected {} symbols", selected.len());

    // Step 3: Download candles
    info!("--- Step 3: Fetching klines ---");
    let outcome = klines::run(client, &selected, &config.klines, &config.fetch).await;

    // Step 4: Normalize
    info!("--- Step 4: Normalizing returns ---");
    let mut series = cumulative_price_change::run(outcome.ok, config.label_style);
    sort_by_final_return(&mut series);
    if series.is_empty() {
        warn!("no symbol produced a usable series; writing empty artifacts");
    }

    // Step 5: Render
    info!("--- Step 5: Rendering ---");
    let generated_at = Utc::now();
    let title = format!(
        "Top {} USDT pairs by {} volume: return over {}h ({} candles)",
        series.len(),
        config.rank_window.as_str(),
        config.klines.lookback_hours,
        config.klines.interval
    );
    let extremes = select_extremes(&series, EXTREME_COUNT);
    let payload = build_payload(&title, &series, &extremes, generated_at, &config.display_tz);

    let csv = to_csv_string(&series, &config.display_tz)?;
    let html = render_html(&payload)?;
    let artifacts = Artifacts {
        csv: storage.save_text(CSV_FILE, &csv).await.context("writing CSV")?,
        json: storage.save_json(JSON_FILE, &payload).await.context("writing chart payload")?,
        html: storage.save_text(HTML_FILE, &html).await.context("writing chart page")?,
    };
    info!("wrote {:?}, {:?}, {:?}", artifacts.csv, artifacts.json, artifacts.html);

    Ok(RunReport {
        generated_at,
        series,
        skipped: outcome.failed,
        artifacts,
    })
}
