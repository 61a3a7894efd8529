//! Golden-zone retracement bands on the latest swing leg.

use crate::{Ohlcv, ScanContext, Zone};

/// Inner Fibonacci retracement bound of the band
pub const GOLDEN_NEAR: f64 = 0.618;
/// Outer Fibonacci retracement bound of the band
pub const GOLDEN_FAR: f64 = 0.786;

/// Projects the 61.8%-78.6% retracement band of the latest qualifying leg.
#[derive(Debug, Clone, Copy)]
pub struct GoldenZoneDetector {
  pub near: f64,
  pub far: f64,
}

impl Default for GoldenZoneDetector {
  fn default() -> Self {
    Self { near: GOLDEN_NEAR, far: GOLDEN_FAR }
  }
}

impl GoldenZoneDetector {
  /// At most one band per scan.
  ///
  /// The leg runs from the latest pivot on one side to the latest pivot on
  /// the other; both the terminal pivot and the leg start must sit inside
  /// the recency window, though the start may be the older of the two.
  /// Equal pivot times yield nothing. A zero-range leg yields a zero-height
  /// band. The price bounds are ordered on construction, so an inverted leg
  /// still produces `bottom <= top`.
  pub fn detect<T: Ohlcv>(&self, candles: &[T], ctx: &ScanContext) -> Option<Zone> {
    let (&last_high, &last_low) = (ctx.highs.last()?, ctx.lows.last()?);
    let high_time = candles[last_high].time();
    let low_time = candles[last_low].time();
    if !ctx.gate.admits_time(high_time) || !ctx.gate.admits_time(low_time) {
      return None;
    }
    if high_time > low_time {
      // Up leg into the latest high; the band sits below the high.
      let &start = ctx.lows.iter().rev().find(|&&index| index < last_high)?;
      if !ctx.gate.admits_time(candles[start].time()) {
        return None;
      }
      let swing_low = candles[start].low();
      let swing_high = candles[last_high].high();
      let range = swing_high - swing_low;
      let near = swing_high - self.near * range;
      let far = swing_high - self.far * range;
      Some(Zone {
        left: candles[start].time(),
        right: high_time,
        top: near.max(far),
        bottom: near.min(far),
        text: "GoldenZone↑".to_string(),
      })
    } else if low_time > high_time {
      // Down leg into the latest low; the band sits above the low.
      let &start = ctx.highs.iter().rev().find(|&&index| index < last_low)?;
      if !ctx.gate.admits_time(candles[start].time()) {
        return None;
      }
      let swing_high = candles[start].high();
      let swing_low = candles[last_low].low();
      let range = swing_high - swing_low;
      let near = swing_low + self.near * range;
      let far = swing_low + self.far * range;
      Some(Zone {
        left: candles[start].time(),
        right: low_time,
        top: near.max(far),
        bottom: near.min(far),
        text: "GoldenZone↓".to_string(),
      })
    } else {
      None
    }
  }
}
