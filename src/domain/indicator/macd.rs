//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded once the slow EMA is defined
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // The signal EMA runs only over the defined part of the MACD line.
    let line_start = macd_line.iter().position(Option::is_some);
    let mut signal_line: Vec<Option<f64>> = vec![None; bars.len()];
    if let Some(start) = line_start {
        let defined: Vec<f64> = macd_line[start..].iter().flatten().copied().collect();
        for (offset, signal) in ema_values(&defined, signal_period).into_iter().enumerate() {
            signal_line[start + offset] = signal;
        }
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (macd_line[i], signal_line[i]) {
            (Some(line), Some(signal)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            },
            (line, _) => IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Macd {
                    line: line.unwrap_or(0.0),
                    signal: 0.0,
                    histogram: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
