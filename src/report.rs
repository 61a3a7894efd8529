//! Scan report rendering: JSON for machines, Markdown for humans.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::Annotations;

/// One scan run across a set of symbols
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub timeframe: String,
    pub max_age_bars: usize,
    pub results: Vec<SymbolResult>,
}

/// Per-symbol outcome; a failed fetch never aborts the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolResult {
    Scanned {
        symbol: String,
        latest_close: f64,
        events: Annotations,
    },
    Failed {
        symbol: String,
        error: String,
    },
}

impl Report {
    pub fn new(timeframe: impl Into<String>, max_age_bars: usize) -> Self {
        Self {
            timeframe: timeframe.into(),
            max_age_bars,
            results: Vec::new(),
        }
    }

    pub fn push_scanned(&mut self, symbol: impl Into<String>, latest_close: f64, events: Annotations) {
        self.results.push(SymbolResult::Scanned {
            symbol: symbol.into(),
            latest_close,
            events,
        });
    }

    pub fn push_failed(&mut self, symbol: impl Into<String>, error: impl ToString) {
        self.results.push(SymbolResult::Failed {
            symbol: symbol.into(),
            error: error.to_string(),
        });
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path.as_ref(), text)
            .with_context(|| format!("Failed to write JSON report to {:?}", path.as_ref()))
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.render_markdown())
            .with_context(|| format!("Failed to write Markdown report to {:?}", path.as_ref()))
    }

    pub fn render_markdown(&self) -> String {
        let mut lines = vec![
            format!(
                "# Scan Report — TF: {} (last {} bars)",
                self.timeframe, self.max_age_bars
            ),
            String::new(),
        ];
        for row in &self.results {
            match row {
                SymbolResult::Failed { symbol, error } => {
                    lines.push(format!("## {symbol}"));
                    lines.push(format!("**ERROR**: {error}"));
                    lines.push(String::new());
                }
                SymbolResult::Scanned {
                    symbol,
                    latest_close,
                    events,
                } => {
                    lines.push(format!("## {symbol} — close: {latest_close}"));
                    if !events.labels.is_empty() {
                        lines.push("**Labels (last window):**".to_string());
                        for label in &events.labels {
                            lines.push(format!(
                                "- [{}] {} @ {}",
                                format_utc(label.time),
                                label.text,
                                label.price
                            ));
                        }
                    }
                    if !events.zones.is_empty() {
                        lines.push("**Boxes/Zones (last window):**".to_string());
                        for zone in &events.zones {
                            lines.push(format!(
                                "- [{}] {} {} → {}",
                                format_utc(zone.left),
                                zone.text,
                                zone.bottom,
                                zone.top
                            ));
                        }
                    }
                    lines.push(String::new());
                }
            }
        }
        lines.join("\n")
    }
}

fn format_utc(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}
