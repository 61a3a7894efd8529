//! Order-block detection behind structure breaks.

use crate::{Label, Ohlcv, OhlcvExt, ScanContext, Zone};

/// Finds the originating opposite-polarity bar behind each break label.
#[derive(Debug, Clone, Copy)]
pub struct OrderBlockDetector {
  /// How many bars before the break are searched
  pub lookback: usize,
}

impl OrderBlockDetector {
  pub const DEFAULT_LOOKBACK: usize = 10;
}

impl Default for OrderBlockDetector {
  fn default() -> Self {
    Self { lookback: Self::DEFAULT_LOOKBACK }
  }
}

impl OrderBlockDetector {
  /// At most one zone per break label.
  ///
  /// The break bar is the highest index at or before the label time, falling
  /// back to the last bar of the series. The search then runs oldest-first
  /// across the window before it and stops on the first bar of opposite
  /// polarity: a down bar feeding a bullish break, an up bar feeding a
  /// bearish one. Oldest-first is the intended tie-break, not
  /// nearest-to-break. The zone spans the qualifying bar's real body.
  pub fn detect<T: Ohlcv>(
    &self,
    candles: &[T],
    breaks: &[Label],
    ctx: &ScanContext,
  ) -> Vec<Zone> {
    let mut zones = Vec::new();
    if candles.is_empty() {
      return zones;
    }
    for label in breaks {
      if !ctx.gate.admits_time(label.time) {
        continue;
      }
      let anchor = candles
        .iter()
        .rposition(|candle| candle.time() <= label.time)
        .unwrap_or(candles.len() - 1);
      let bullish_break = label.text.contains('↑');
      let start = anchor.saturating_sub(self.lookback);
      for candle in &candles[start..anchor] {
        if !ctx.gate.admits_time(candle.time()) {
          continue;
        }
        let qualifies = if bullish_break { candle.is_bearish() } else { candle.is_bullish() };
        if qualifies {
          zones.push(Zone {
            left: candle.time(),
            right: label.time,
            top: candle.body_top(),
            bottom: candle.body_bottom(),
            text: if bullish_break { "OB↑" } else { "OB↓" }.to_string(),
          });
          break;
        }
      }
    }
    zones
  }
}
