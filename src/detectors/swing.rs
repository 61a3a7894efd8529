//! Swing pivot detection and structure direction classification.

use crate::{Direction, Lookback, Ohlcv};

/// Locates local swing extrema and classifies the prevailing direction.
#[derive(Debug, Clone, Copy)]
pub struct SwingDetector {
  /// Bars on each side that a pivot must strictly dominate
  pub lookback: Lookback,
}

impl Default for SwingDetector {
  fn default() -> Self {
    Self { lookback: Lookback::new_const(1) }
  }
}

impl SwingDetector {
  pub fn with_defaults() -> Self {
    Self::default()
  }

  /// Ascending index lists of pivot highs and pivot lows.
  ///
  /// Index `i` is a pivot high when its high strictly exceeds the highs of
  /// every bar within `lookback` on both sides; dual rule with strict
  /// less-than for pivot lows. A bar can be both. Series shorter than
  /// `2 * lookback + 1` have no pivots at all.
  pub fn pivots<T: Ohlcv>(&self, candles: &[T]) -> (Vec<usize>, Vec<usize>) {
    let lookback = self.lookback.get();
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    if candles.len() < 2 * lookback + 1 {
      return (highs, lows);
    }
    for i in lookback..candles.len() - lookback {
      let bar = &candles[i];
      let is_high = (1..=lookback).all(|offset| {
        bar.high() > candles[i - offset].high() && bar.high() > candles[i + offset].high()
      });
      if is_high {
        highs.push(i);
      }
      let is_low = (1..=lookback).all(|offset| {
        bar.low() < candles[i - offset].low() && bar.low() < candles[i + offset].low()
      });
      if is_low {
        lows.push(i);
      }
    }
    (highs, lows)
  }

  /// Classify the prevailing structure direction from the pivot lists.
  ///
  /// The more recent of the two latest pivots picks the side; that side
  /// then needs a confirming higher high (or lower low) against its prior
  /// pivot, otherwise the structure is neutral. Ties on time fall to the
  /// low side.
  pub fn direction<T: Ohlcv>(
    &self,
    candles: &[T],
    highs: &[usize],
    lows: &[usize],
  ) -> Direction {
    let (Some(&last_high), Some(&last_low)) = (highs.last(), lows.last()) else {
      return Direction::Neutral;
    };
    if candles[last_high].time() > candles[last_low].time() {
      if highs.len() >= 2 && candles[last_high].high() > candles[highs[highs.len() - 2]].high() {
        return Direction::Bullish;
      }
    } else if lows.len() >= 2 && candles[last_low].low() < candles[lows[lows.len() - 2]].low() {
      return Direction::Bearish;
    }
    Direction::Neutral
  }
}
