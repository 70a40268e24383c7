mod analysis;
mod cache;
mod chart;
mod cli;
mod comfy_table;
mod config;
mod csv_export;
mod cumulative_price_change;
mod error;
mod exchange;
mod extremes;
mod filter_utils;
mod find_tickers;
mod klines;
mod lenient;
mod ranker;
mod retry;
mod storage_utils;

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::exchange::BinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::try_from(cli).context("invalid configuration")?;
    info!(
        "top {} by {} volume, {} candles over {}h, output {:?}",
        config.top_n,
        config.rank_window.as_str(),
        config.klines.interval,
        config.klines.lookback_hours,
        config.output_dir
    );

    let client = BinanceClient::from_config(&config.fetch)?;
    let report = analysis::run_analysis_pipeline(&config, &client).await?;

    println!("{}", comfy_table::render_summary(&report, &config.display_tz));
    println!("Chart: {}", report.artifacts.html.display());

    Ok(())
}
