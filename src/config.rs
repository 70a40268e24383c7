use crate::cli::Cli;
use crate::error::ScreenerError;
use crate::retry::RetryPolicy;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Largest page the klines endpoint will return.
pub const MAX_KLINE_LIMIT: u32 = 1000;

/// Candle intervals accepted by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
}

impl Interval {
    pub const ALL: [Interval; 12] = [
        Interval::M1,
        Interval::M3,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::H2,
        Interval::H4,
        Interval::H6,
        Interval::H8,
        Interval::H12,
        Interval::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H8 => "8h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            Interval::M1 => 1,
            Interval::M3 => 3,
            Interval::M5 => 5,
            Interval::M15 => 15,
            Interval::M30 => 30,
            Interval::H1 => 60,
            Interval::H2 => 120,
            Interval::H4 => 240,
            Interval::H6 => 360,
            Interval::H8 => 480,
            Interval::H12 => 720,
            Interval::D1 => 1440,
        }
    }
}

impl FromStr for Interval {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| ScreenerError::Config(format!("unsupported kline interval '{}'", s)))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volume window used to rank symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankWindow {
    Day,
    Week,
    Month,
}

impl RankWindow {
    /// Number of daily candles summed in rolling mode; `None` for the direct 24h ticker.
    pub fn rolling_days(&self) -> Option<u32> {
        match self {
            RankWindow::Day => None,
            RankWindow::Week => Some(7),
            RankWindow::Month => Some(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankWindow::Day => "24h",
            RankWindow::Week => "7d",
            RankWindow::Month => "30d",
        }
    }
}

impl FromStr for RankWindow {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "1d" => Ok(RankWindow::Day),
            "7d" => Ok(RankWindow::Week),
            "30d" => Ok(RankWindow::Month),
            other => Err(ScreenerError::Config(format!(
                "unsupported ranking window '{}' (expected 24h, 7d or 30d)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Full pair, e.g. `BTCUSDT`.
    Pair,
    /// Base asset only, e.g. `BTC`.
    Base,
}

impl FromStr for LabelStyle {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pair" | "full" => Ok(LabelStyle::Pair),
            "base" => Ok(LabelStyle::Base),
            other => Err(ScreenerError::Config(format!(
                "unsupported label style '{}' (expected base or pair)",
                other
            ))),
        }
    }
}

/// Zone used to print timestamps: an IANA name, or a fixed offset when no name applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTz {
    Named(Tz),
    Fixed(FixedOffset),
}

impl DisplayTz {
    pub fn utc() -> Self {
        DisplayTz::Named(Tz::UTC)
    }

    pub fn format(&self, ts: DateTime<Utc>, fmt: &str) -> String {
        match self {
            DisplayTz::Named(tz) => ts.with_timezone(tz).format(fmt).to_string(),
            DisplayTz::Fixed(offset) => ts.with_timezone(offset).format(fmt).to_string(),
        }
    }
}

impl fmt::Display for DisplayTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayTz::Named(tz) => write!(f, "{}", tz),
            DisplayTz::Fixed(offset) => write!(f, "UTC{}", offset),
        }
    }
}

impl FromStr for DisplayTz {
    type Err = ScreenerError;

    /// Accepts `Asia/Tokyo`, `UTC`, `Z` or an offset like `+09:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
            return Ok(DisplayTz::utc());
        }
        if let Ok(tz) = s.parse::<Tz>() {
            return Ok(DisplayTz::Named(tz));
        }
        s.parse::<FixedOffset>()
            .map(DisplayTz::Fixed)
            .map_err(|_| ScreenerError::Config(format!("unsupported display timezone '{}'", s)))
    }
}

#[derive(Debug, Clone)]
pub struct KlineConfig {
    pub interval: Interval,
    pub lookback_hours: u32,
}

impl KlineConfig {
    /// `ceil(hours * 60 / interval_minutes)`, clamped to a single exchange page.
    pub fn limit(&self) -> u32 {
        let total_minutes = u64::from(self.lookback_hours) * 60;
        let step = u64::from(self.interval.minutes());
        let bars = total_minutes.div_ceil(step);
        bars.clamp(1, u64::from(MAX_KLINE_LIMIT)) as u32
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    /// 1 selects the sequential loop with `request_delay` between calls.
    pub concurrency: usize,
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub top_n: usize,
    pub klines: KlineConfig,
    pub rank_window: RankWindow,
    pub label_style: LabelStyle,
    pub display_tz: DisplayTz,
    pub fetch: FetchConfig,
    /// Zero disables the volume cache.
    pub cache_ttl: Duration,
}

impl TryFrom<Cli> for AppConfig {
    type Error = ScreenerError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.top_n == 0 {
            return Err(ScreenerError::Config("TOP_N must be at least 1".into()));
        }
        if cli.hours == 0 {
            return Err(ScreenerError::Config("LOOKBACK_HOURS must be at least 1".into()));
        }

        let cache_ttl_secs = cli
            .cache_ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| ScreenerError::Config("CACHE_TTL_MINUTES is too large".into()))?;
        let retry = if cli.retry_attempts <= 1 {
            RetryPolicy::none()
        } else {
            RetryPolicy::new(cli.retry_attempts)
        };

        Ok(Self {
            output_dir: cli.output_dir,
            top_n: cli.top_n,
            klines: KlineConfig {
                interval: cli.interval.parse()?,
                lookback_hours: cli.hours,
            },
            rank_window: cli.rank_window.parse()?,
            label_style: cli.label_style.parse()?,
            display_tz: cli.tz.parse()?,
            fetch: FetchConfig {
                base_url: cli.base_url.trim_end_matches('/').to_string(),
                concurrency: cli.concurrency.max(1),
                request_delay: Duration::from_millis(cli.request_delay_ms),
                retry,
            },
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["volume-returns-chart"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn every_interval_round_trips_through_its_name() {
        for interval in Interval::ALL {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn unsupported_interval_is_a_config_error() {
        let err = "7m".parse::<Interval>().unwrap_err();
        assert!(matches!(err, ScreenerError::Config(_)));

        let err = AppConfig::try_from(cli(&["--interval", "2m"])).unwrap_err();
        assert!(err.to_string().contains("2m"));
    }

    #[test]
    fn kline_limit_rounds_up_and_caps() {
        let k = |interval, hours| KlineConfig { interval, lookback_hours: hours }.limit();
        assert_eq!(k(Interval::M5, 24), 288);
        assert_eq!(k(Interval::H4, 5), 2);
        assert_eq!(k(Interval::D1, 1), 1);
        assert_eq!(k(Interval::M1, 24), 1000);
    }

    #[test]
    fn rank_window_parsing() {
        assert_eq!("24h".parse::<RankWindow>().unwrap(), RankWindow::Day);
        assert_eq!("7D".parse::<RankWindow>().unwrap().rolling_days(), Some(7));
        assert_eq!("30d".parse::<RankWindow>().unwrap().rolling_days(), Some(30));
        assert!("90d".parse::<RankWindow>().is_err());
    }

    #[test]
    fn timezone_names_and_offsets() {
        assert_eq!("UTC".parse::<DisplayTz>().unwrap(), DisplayTz::utc());
        assert_eq!(
            "Asia/Tokyo".parse::<DisplayTz>().unwrap(),
            DisplayTz::Named(chrono_tz::Asia::Tokyo)
        );
        assert_eq!(
            "+09:00".parse::<DisplayTz>().unwrap(),
            DisplayTz::Fixed(FixedOffset::east_opt(9 * 3600).unwrap())
        );
        assert_eq!(
            "-05:30".parse::<DisplayTz>().unwrap(),
            DisplayTz::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert!("Mars/Olympus".parse::<DisplayTz>().is_err());
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let ny: DisplayTz = "America/New_York".parse().unwrap();
        let winter = DateTime::from_timestamp(1_704_110_400, 0).unwrap(); // 2024-01-01 12:00 UTC
        let summer = DateTime::from_timestamp(1_719_835_200, 0).unwrap(); // 2024-07-01 12:00 UTC
        assert_eq!(ny.format(winter, "%H:%M"), "07:00");
        assert_eq!(ny.format(summer, "%H:%M"), "08:00");
        assert_eq!(ny.to_string(), "America/New_York");
    }

    #[test]
    fn oversized_cache_ttl_is_a_config_error() {
        let max = u64::MAX.to_string();
        let err = AppConfig::try_from(cli(&["--cache-ttl-minutes", &max])).unwrap_err();
        assert!(matches!(err, ScreenerError::Config(_)));

        let config = AppConfig::try_from(cli(&["--cache-ttl-minutes", "90"])).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(90 * 60));
    }

    #[test]
    fn single_retry_attempt_disables_retries() {
        let config = AppConfig::try_from(cli(&["--retry-attempts", "1"])).unwrap();
        assert_eq!(config.fetch.retry, RetryPolicy::none());

        let config = AppConfig::try_from(cli(&["--retry-attempts", "4"])).unwrap();
        assert_eq!(config.fetch.retry.max_attempts, 4);
    }

    #[test]
    fn cli_builds_validated_config() {
        let config = AppConfig::try_from(cli(&[
            "--top-n",
            "12",
            "--interval",
            "15m",
            "--rank-window",
            "7d",
            "--label-style",
            "pair",
            "--tz",
            "+08:00",
            "--base-url",
            "http://localhost:9000/",
            "--concurrency",
            "0",
        ]))
        .unwrap();

        assert_eq!(config.top_n, 12);
        assert_eq!(config.klines.interval, Interval::M15);
        assert_eq!(config.rank_window, RankWindow::Week);
        assert_eq!(config.label_style, LabelStyle::Pair);
        assert_eq!(config.display_tz, DisplayTz::Fixed(FixedOffset::east_opt(8 * 3600).unwrap()));
        assert_eq!(config.fetch.base_url, "http://localhost:9000");
        assert_eq!(config.fetch.concurrency, 1);
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert!(AppConfig::try_from(cli(&["--top-n", "0"])).is_err());
        assert!(AppConfig::try_from(cli(&["--hours", "0"])).is_err());
    }
}
