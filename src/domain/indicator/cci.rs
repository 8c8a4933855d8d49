//! CCI (Commodity Channel Index) indicator.
//!
//! CCI = (TP - SMA(TP)) / (0.015 * MeanDeviation)
//! where TP is the typical price (high + low + close) / 3 and the mean deviation
//! is the average absolute distance of TP from its SMA over the window.
//! A zero mean deviation yields CCI = 0.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

const LAMBERT_CONSTANT: f64 = 0.015;

pub fn calculate_cci(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let typical: Vec<f64> = bars.iter().map(OhlcvBar::typical_price).collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let cci = if valid {
                let window = &typical[i + 1 - period..=i];
                let mean = window.iter().sum::<f64>() / period as f64;
                let mean_dev =
                    window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;
                if mean_dev > 0.0 {
                    (typical[i] - mean) / (LAMBERT_CONSTANT * mean_dev)
                } else {
                    0.0
                }
            } else {
                0.0
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value: IndicatorValue::Simple(cci),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Cci(period),
        values,
    }
}
