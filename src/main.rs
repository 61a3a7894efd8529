use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use smcscan::exchange::FuturesClient;
use smcscan::report::Report;
use smcscan::ScanEngine;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Symbols to scan (comma-separated); top-volume universe when omitted
    #[arg(short, long)]
    symbols: Option<String>,

    /// Universe size when --symbols is not given
    #[arg(short, long, default_value = "30")]
    limit: usize,

    /// Kline interval (1m, 5m, 15m, 1h, ...)
    #[arg(short, long, default_value = "15m")]
    timeframe: String,

    /// Candles fetched per symbol
    #[arg(short, long, default_value = "300")]
    bars: usize,

    /// Recency window: events older than this many bars are suppressed
    #[arg(long, default_value = "5")]
    max_age_bars: usize,

    /// Delay between symbol fetches, in milliseconds
    #[arg(long, default_value = "250")]
    pace_ms: u64,

    /// JSON report path
    #[arg(long, default_value = "SCAN_REPORT.json")]
    out_json: String,

    /// Markdown report path
    #[arg(long, default_value = "SCAN_REPORT.md")]
    out_md: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("smcscan=info")),
        )
        .init();

    let args = Args::parse();

    let engine = ScanEngine::builder()
        .window(args.max_age_bars)
        .build()
        .context("Invalid scan parameters")?;

    let client = FuturesClient::new();
    let symbols: Vec<String> = match &args.symbols {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => client
            .top_by_volume(args.limit)
            .await
            .context("Failed to resolve the symbol universe")?,
    };

    info!(
        symbols = symbols.len(),
        timeframe = %args.timeframe,
        max_age_bars = args.max_age_bars,
        "starting scan"
    );

    let mut report = Report::new(&args.timeframe, args.max_age_bars);
    for symbol in &symbols {
        match client.klines(symbol, &args.timeframe, args.bars).await {
            Ok(candles) if candles.len() < args.max_age_bars + 2 => {
                warn!(%symbol, bars = candles.len(), "series too short, skipping");
            }
            Ok(candles) => {
                let events = engine.scan(&candles);
                let latest_close = candles.last().map(|c| c.close).unwrap_or_default();
                report.push_scanned(symbol, latest_close, events);
            }
            Err(error) => {
                warn!(%symbol, %error, "fetch failed");
                report.push_failed(symbol, &error);
            }
        }
        tokio::time::sleep(Duration::from_millis(args.pace_ms)).await;
    }

    report.write_json(&args.out_json)?;
    report.write_markdown(&args.out_md)?;

    println!(
        "{}",
        serde_json::json!({
            "symbols": symbols.len(),
            "out_json": args.out_json,
            "out_md": args.out_md,
        })
    );
    Ok(())
}
