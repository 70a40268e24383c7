use clap::Parser;
use std::path::PathBuf;

/// Charts the percentage returns of the most traded USDT pairs.
///
/// Every option can also be set through the environment variable shown in `--help`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory receiving returns.csv, chart.json and chart.html
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Number of symbols to chart
    #[arg(long, env = "TOP_N", default_value_t = 30)]
    pub top_n: usize,

    /// Candle interval (1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 1d)
    #[arg(long, env = "KLINE_INTERVAL", default_value = "5m")]
    pub interval: String,

    /// Lookback window in hours
    #[arg(long, env = "LOOKBACK_HOURS", default_value_t = 24)]
    pub hours: u32,

    /// Volume window used for ranking (24h, 7d, 30d)
    #[arg(long, env = "RANK_WINDOW", default_value = "24h")]
    pub rank_window: String,

    /// Legend label style (base, pair)
    #[arg(long, env = "LABEL_STYLE", default_value = "base")]
    pub label_style: String,

    /// Display timezone (UTC or a fixed offset like +09:00)
    #[arg(long, env = "DISPLAY_TZ", default_value = "UTC")]
    pub tz: String,

    #[arg(long, env = "EXCHANGE_BASE_URL", default_value = "https://api.binance.com")]
    pub base_url: String,

    /// Maximum in-flight kline requests; 1 fetches sequentially
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 8)]
    pub concurrency: usize,

    /// Pause between sequential requests
    #[arg(long, env = "REQUEST_DELAY_MS", default_value_t = 100)]
    pub request_delay_ms: u64,

    /// Attempts per request, including the first
    #[arg(long, env = "RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Lifetime of cached rolling volumes; 0 disables the cache
    #[arg(long, env = "CACHE_TTL_MINUTES", default_value_t = 60)]
    pub cache_ttl_minutes: u64,
}
