//! Fair-value gap detection.

use crate::{Ohlcv, ScanContext, Zone};

/// Finds three-bar imbalances where the outer bars' ranges do not overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct FvgDetector;

impl FvgDetector {
  /// One pass over every interior bar.
  ///
  /// Only the two outer bars of a triple are gate-checked; the middle bar
  /// may be older than the gate. The bullish and bearish checks are
  /// independent, and a triple can satisfy at most one of them.
  pub fn detect<T: Ohlcv>(&self, candles: &[T], ctx: &ScanContext) -> Vec<Zone> {
    let mut zones = Vec::new();
    if candles.len() < 3 {
      return zones;
    }
    for i in 1..candles.len() - 1 {
      let prev = &candles[i - 1];
      let next = &candles[i + 1];
      if !ctx.gate.admits_time(prev.time()) || !ctx.gate.admits_time(next.time()) {
        continue;
      }
      // Gap up: the bar after the triple's middle never traded down into
      // the bar before it.
      if next.low() > prev.high() {
        zones.push(Zone {
          left: prev.time(),
          right: next.time(),
          top: next.low(),
          bottom: prev.high(),
          text: "FVG↑".to_string(),
        });
      }
      if next.high() < prev.low() {
        zones.push(Zone {
          left: prev.time(),
          right: next.time(),
          top: prev.low(),
          bottom: next.high(),
          text: "FVG↓".to_string(),
        });
      }
    }
    zones
  }
}
