//! Property tests for the cross-cutting detector invariants.

use proptest::prelude::*;
use smcscan::prelude::*;

const MINUTE: i64 = 60_000;

prop_compose! {
    /// Chronological series of well-formed bars with varied geometry
    fn arb_series(max_len: usize)(
        bars in prop::collection::vec(
            (50.0f64..150.0, 50.0f64..150.0, 0.0f64..5.0, 0.0f64..5.0),
            0..max_len,
        )
    ) -> Vec<Candle> {
        bars.into_iter()
            .enumerate()
            .map(|(i, (open, close, up, down))| Candle {
                time: i as i64 * MINUTE,
                open,
                high: open.max(close) + up,
                low: open.min(close) - down,
                close,
                volume: 1_000.0,
            })
            .collect()
    }
}

proptest! {
    #[test]
    fn gate_invariant_holds(series in arb_series(40), window in 1usize..8) {
        let engine = ScanEngine::builder().window(window).build().unwrap();
        let events = engine.scan(&series);
        if series.len() >= window + 2 {
            let gate_ts = series[series.len() - window].time;
            for label in &events.labels {
                prop_assert!(label.time >= gate_ts);
            }
            for zone in &events.zones {
                prop_assert!(zone.left >= gate_ts && zone.right >= gate_ts);
            }
        } else {
            prop_assert!(events.is_empty());
        }
    }

    #[test]
    fn pivots_strictly_dominate_their_neighborhood(
        series in arb_series(40),
        lookback in 1usize..4,
    ) {
        let detector = SwingDetector { lookback: Lookback::new(lookback).unwrap() };
        let (highs, lows) = detector.pivots(&series);
        for &i in &highs {
            prop_assert!(i >= lookback && i + lookback < series.len());
            for offset in 1..=lookback {
                prop_assert!(series[i].high > series[i - offset].high);
                prop_assert!(series[i].high > series[i + offset].high);
            }
        }
        for &i in &lows {
            prop_assert!(i >= lookback && i + lookback < series.len());
            for offset in 1..=lookback {
                prop_assert!(series[i].low < series[i - offset].low);
                prop_assert!(series[i].low < series[i + offset].low);
            }
        }
    }

    #[test]
    fn fvg_triple_emits_at_most_one_side(series in arb_series(40)) {
        let engine = ScanEngine::builder().build().unwrap();
        let ctx = engine.context(&series);
        let zones = FvgDetector.detect(&series, &ctx);
        // One triple maps to one (left, right) edge pair; seeing it twice
        // would mean both gap directions fired for the same triple.
        let mut seen = std::collections::HashSet::new();
        for zone in &zones {
            prop_assert!(seen.insert((zone.left, zone.right)));
        }
    }

    #[test]
    fn golden_zone_band_is_ordered(series in arb_series(40)) {
        let engine = ScanEngine::builder().build().unwrap();
        let ctx = engine.context(&series);
        if let Some(zone) = GoldenZoneDetector::default().detect(&series, &ctx) {
            prop_assert!(zone.bottom <= zone.top);
            prop_assert!(zone.left <= zone.right);
        }
    }

    #[test]
    fn order_blocks_emit_at_most_one_zone_per_break(series in arb_series(40)) {
        let engine = ScanEngine::builder().build().unwrap();
        let ctx = engine.context(&series);
        let breaks = StructureBreakDetector::default().detect(&series, &ctx);
        let zones = OrderBlockDetector::default().detect(&series, &breaks, &ctx);
        prop_assert!(zones.len() <= breaks.len());
    }

    #[test]
    fn scan_is_deterministic(series in arb_series(60), window in 1usize..8) {
        let engine = ScanEngine::builder().window(window).build().unwrap();
        prop_assert_eq!(engine.scan(&series), engine.scan(&series));
    }
}
