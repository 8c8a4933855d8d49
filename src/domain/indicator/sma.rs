//! Simple Moving Average over closes and over volume.
//!
//! O(n) sliding window: the running sum gains the newest value and drops the
//! value leaving the window.
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    sliding_mean(bars, period, IndicatorType::Sma(period), |b| b.close)
}

/// Trailing average of traded volume.
pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    sliding_mean(bars, period, IndicatorType::VolumeSma(period), |b| {
        b.volume as f64
    })
}

fn sliding_mean<F>(
    bars: &[OhlcvBar],
    period: usize,
    indicator_type: IndicatorType,
    source: F,
) -> IndicatorSeries
where
    F: Fn(&OhlcvBar) -> f64,
{
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += source(bar);
        if i >= period {
            window_sum -= source(&bars[i - period]);
        }

        let valid = i + 1 >= period;
        let mean = if valid {
            window_sum / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(mean),
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
