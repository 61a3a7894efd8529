//! Break-of-structure and change-of-character detection.

use crate::{Direction, Label, Ohlcv, ScanContext};

/// Labels closes that break the latest swing levels.
#[derive(Debug, Clone, Copy)]
pub struct StructureBreakDetector {
  /// Trailing bars examined for breaks
  pub span: usize,
}

impl StructureBreakDetector {
  pub const DEFAULT_SPAN: usize = 10;
}

impl Default for StructureBreakDetector {
  fn default() -> Self {
    Self { span: Self::DEFAULT_SPAN }
  }
}

impl StructureBreakDetector {
  /// Emit BOS/CHOCH labels for closes beyond the latest pivot levels.
  ///
  /// A close above the last pivot high continues a bullish structure
  /// (`BOS↑`) or contradicts a bearish one (`CHOCH↑`); mirrored against the
  /// last pivot low. A single bar may emit both of its direction's labels
  /// when the levels are inverted (pivot low above pivot high); that
  /// degenerate layout is tolerated, not rejected. The first bar of the
  /// series is never examined.
  pub fn detect<T: Ohlcv>(&self, candles: &[T], ctx: &ScanContext) -> Vec<Label> {
    let mut labels = Vec::new();
    let (Some(&last_high), Some(&last_low)) = (ctx.highs.last(), ctx.lows.last()) else {
      return labels;
    };
    let level_high = candles[last_high].high();
    let level_low = candles[last_low].low();
    let start = candles.len().saturating_sub(self.span).max(1);
    for candle in &candles[start..] {
      if !ctx.gate.admits_time(candle.time()) {
        continue;
      }
      let close = candle.close();
      match ctx.direction {
        Direction::Bullish => {
          if close > level_high {
            labels.push(Label {
              time: candle.time(),
              text: "BOS↑".to_string(),
              price: close,
            });
          }
          if close < level_low {
            labels.push(Label {
              time: candle.time(),
              text: "CHOCH↓".to_string(),
              price: close,
            });
          }
        }
        Direction::Bearish => {
          if close < level_low {
            labels.push(Label {
              time: candle.time(),
              text: "BOS↓".to_string(),
              price: close,
            });
          }
          if close > level_high {
            labels.push(Label {
              time: candle.time(),
              text: "CHOCH↑".to_string(),
              price: close,
            });
          }
        }
        Direction::Neutral => {}
      }
    }
    labels
  }
}
