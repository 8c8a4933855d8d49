//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let value = if valid {
                let window = &bars[i + 1 - period..=i];
                let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
                let variance = window
                    .iter()
                    .map(|b| (b.close - middle).powi(2))
                    .sum::<f64>()
                    / period as f64;
                let stddev = variance.sqrt();
                IndicatorValue::Bollinger {
                    upper: middle + mult * stddev,
                    middle,
                    lower: middle - mult * stddev,
                }
            } else {
                IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                }
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorField;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                code: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn bollinger_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_bollinger(&bars, 3, 200);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn bollinger_constant_values_collapse() {
        let bars = make_bars(&[100.0; 5]);
        let series = calculate_bollinger(&bars, 3, 200);

        assert_eq!(series.get(2, IndicatorField::BollingerUpper), Some(100.0));
        assert_eq!(series.get(2, IndicatorField::BollingerMiddle), Some(100.0));
        assert_eq!(series.get(2, IndicatorField::BollingerLower), Some(100.0));
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, 3, 200);

        let stddev = (200.0_f64 / 3.0).sqrt();
        let upper = series.get(2, IndicatorField::BollingerUpper).unwrap();
        let lower = series.get(2, IndicatorField::BollingerLower).unwrap();

        assert!((upper - (20.0 + 2.0 * stddev)).abs() < 1e-10);
        assert!((lower - (20.0 - 2.0 * stddev)).abs() < 1e-10);
    }

    #[test]
    fn bollinger_zero_period_is_invalid() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_bollinger(&bars, 0, 200);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
