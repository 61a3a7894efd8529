//! Smart-money-concept detectors
//!
//! All detectors are pure functions of the candle series plus the shared
//! [`crate::ScanContext`]; they hold no state between scans.
//!
//! # Detector pipeline
//!
//! - **Swing**: pivot highs/lows and the prevailing structure direction
//! - **FVG**: three-bar fair-value gaps
//! - **Structure breaks**: BOS/CHOCH labels against the latest pivot levels
//! - **Order blocks**: the opposite-polarity bar feeding each break
//! - **Golden zone**: 61.8%-78.6% retracement band of the latest leg

pub mod fvg;
pub mod golden_zone;
pub mod order_block;
pub mod structure;
pub mod swing;

pub use fvg::FvgDetector;
pub use golden_zone::GoldenZoneDetector;
pub use order_block::OrderBlockDetector;
pub use structure::StructureBreakDetector;
pub use swing::SwingDetector;
