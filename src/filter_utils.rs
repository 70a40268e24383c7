use crate::config::LabelStyle;
use crate::find_tickers::TickerSnapshot;

pub const QUOTE_ASSET: &str = "USDT";

/// Base assets that are themselves pegged to a fiat currency.
pub const STABLECOINS: &[&str] = &[
    "USDC", "BUSD", "TUSD", "FDUSD", "USDP", "DAI", "USDD", "PYUSD", "USDE", "USD1", "UST", "PAX",
    "GUSD", "SUSD", "EUR", "EURI", "AEUR", "GBP", "TRY", "BRL",
];

/// Leveraged-token markers matched anywhere in the full symbol.
pub const LEVERAGED_MARKERS: &[&str] = &["UPUSDT", "DOWNUSDT", "BULLUSDT", "BEARUSDT"];

/// Base asset of a quote-asset pair, `None` when the suffix is missing or nothing precedes it.
pub fn base_asset(symbol: &str) -> Option<&str> {
    symbol.strip_suffix(QUOTE_ASSET).filter(|base| !base.is_empty())
}

pub fn is_eligible(symbol: &str) -> bool {
    // Case A: not quoted in the fixed quote asset
    let Some(base) = base_asset(symbol) else {
        return false;
    };
    // Case B: stable-to-stable pair
    if STABLECOINS.contains(&base) {
        return false;
    }
    // Case C: leveraged/derivative token
    !LEVERAGED_MARKERS.iter().any(|marker| symbol.contains(marker))
}

/// Keeps spot pairs worth ranking, preserving snapshot order.
pub fn filter_candidates(tickers: Vec<TickerSnapshot>) -> Vec<TickerSnapshot> {
    tickers.into_iter().filter(|t| is_eligible(&t.symbol)).collect()
}

pub fn display_label(symbol: &str, style: LabelStyle) -> String {
    match style {
        LabelStyle::Pair => symbol.to_string(),
        LabelStyle::Base => base_asset(symbol).unwrap_or(symbol).to_string(),
    }
}
