//! Binance USDT-M futures market data over public REST.
//!
//! Thin collaborator around three endpoints: `exchangeInfo` for the tradable
//! universe, `ticker/24hr` for volume ranking, and `klines` for the candle
//! series the detectors consume. No authentication is required.

use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::Candle;

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

pub struct FuturesClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for FuturesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FuturesClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Symbols currently tradable as linear USDT perpetuals.
    pub async fn tradable_symbols(&self) -> Result<Vec<String>> {
        #[derive(Debug, Deserialize)]
        struct SymbolInfo {
            symbol: String,
            status: String,
            #[serde(rename = "quoteAsset")]
            quote_asset: String,
            #[serde(rename = "contractType", default)]
            contract_type: String,
        }

        #[derive(Debug, Deserialize)]
        struct ExchangeInfo {
            symbols: Vec<SymbolInfo>,
        }

        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch exchangeInfo from Binance")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance exchangeInfo fetch failed: {}", error_text);
        }

        let info: ExchangeInfo = response
            .json()
            .await
            .context("Failed to parse Binance exchangeInfo")?;

        Ok(info
            .symbols
            .into_iter()
            .filter(|s| {
                s.status == "TRADING" && s.quote_asset == "USDT" && s.contract_type == "PERPETUAL"
            })
            .map(|s| s.symbol)
            .collect())
    }

    /// Top tradable symbols ranked by 24h quote volume.
    pub async fn top_by_volume(&self, limit: usize) -> Result<Vec<String>> {
        #[derive(Debug, Deserialize)]
        struct Ticker24h {
            symbol: String,
            #[serde(rename = "quoteVolume")]
            quote_volume: String,
        }

        let tradable: HashSet<String> = self.tradable_symbols().await?.into_iter().collect();

        let url = format!("{}/fapi/v1/ticker/24hr", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch 24hr ticker from Binance")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance 24hr ticker fetch failed: {}", error_text);
        }

        let tickers: Vec<Ticker24h> = response
            .json()
            .await
            .context("Failed to parse Binance 24hr ticker")?;

        let mut ranked: Vec<(String, f64)> = tickers
            .into_iter()
            .filter(|t| tradable.contains(&t.symbol))
            .map(|t| {
                let volume = t.quote_volume.parse().unwrap_or(0.0);
                (t.symbol, volume)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);

        Ok(ranked.into_iter().map(|(symbol, _)| symbol).collect())
    }

    /// Fetch up to `limit` klines for one symbol and interval, oldest first.
    pub async fn klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/fapi/v1/klines", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines fetch failed for {}: {}", symbol, error_text);
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        Ok(rows.iter().filter_map(parse_kline).collect())
    }
}

/// Binance kline rows are positional arrays: open time in ms, then
/// open/high/low/close/volume as strings.
fn parse_kline(row: &serde_json::Value) -> Option<Candle> {
    let row = row.as_array()?;
    Some(Candle {
        time: row.first()?.as_i64()?,
        open: row.get(1)?.as_str()?.parse().ok()?,
        high: row.get(2)?.as_str()?.parse().ok()?,
        low: row.get(3)?.as_str()?.parse().ok()?,
        close: row.get(4)?.as_str()?.parse().ok()?,
        volume: row.get(5)?.as_str()?.parse().ok()?,
    })
}
