//! Volume-by-price congestion zone over the trailing window.
//!
//! The close-price range of the last `window` bars is split into `bins` equal-width
//! bins and each bar's volume is added to the bin holding its close. The bin with
//! the largest volume is the congestion zone; the current close is classified
//! against it.

use crate::domain::ohlcv::OhlcvBar;
use std::fmt;

/// Extension above the zone's upper bound that counts as a breakout.
pub const BREAKOUT_EXTENSION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeProfileParams {
    pub window: usize,
    pub bins: usize,
}

impl Default for VolumeProfileParams {
    fn default() -> Self {
        Self {
            window: 30,
            bins: 10,
        }
    }
}

/// Current close relative to the congestion zone, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZonePosition {
    BreakoutAbove,
    NearTop,
    Inside,
    BelowSupport,
}

impl ZonePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZonePosition::BreakoutAbove => "breakout above",
            ZonePosition::NearTop => "near top",
            ZonePosition::Inside => "inside",
            ZonePosition::BelowSupport => "below support",
        }
    }
}

impl fmt::Display for ZonePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CongestionZone {
    pub lower: f64,
    pub upper: f64,
    pub volume: f64,
    pub position: ZonePosition,
}

pub fn classify(close: f64, lower: f64, upper: f64) -> ZonePosition {
    if close >= upper * (1.0 + BREAKOUT_EXTENSION) {
        ZonePosition::BreakoutAbove
    } else if close >= upper {
        ZonePosition::NearTop
    } else if close >= lower {
        ZonePosition::Inside
    } else {
        ZonePosition::BelowSupport
    }
}

/// Congestion zone for the trailing window, or `None` when fewer than
/// `params.window` bars exist.
pub fn analyze(bars: &[OhlcvBar], params: &VolumeProfileParams) -> Option<CongestionZone> {
    if params.window == 0 || params.bins == 0 || bars.len() < params.window {
        return None;
    }
    let window = &bars[bars.len() - params.window..];
    let close = window.last()?.close;

    let low = window.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let high = window.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return None;
    }

    if high <= low {
        // Every close identical: one zone collapsed onto that price.
        let volume = window.iter().map(|b| b.volume as f64).sum();
        return Some(CongestionZone {
            lower: low,
            upper: high,
            volume,
            position: classify(close, low, high),
        });
    }

    let width = (high - low) / params.bins as f64;
    let mut profile = vec![0.0f64; params.bins];
    for bar in window {
        let idx = (((bar.close - low) / width) as usize).min(params.bins - 1);
        profile[idx] += bar.volume as f64;
    }

    // First bin wins ties.
    let (best, volume) = profile
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });

    let lower = low + best as f64 * width;
    let upper = if best + 1 == params.bins {
        high
    } else {
        lower + width
    };

    Some(CongestionZone {
        lower,
        upper,
        volume,
        position: classify(close, lower, upper),
    })
}
