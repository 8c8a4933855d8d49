//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the first SMA, then EMA[i] = P[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = ema_values(&closes, period)
        .into_iter()
        .zip(bars)
        .map(|(ema, bar)| IndicatorPoint {
            date: bar.date,
            valid: ema.is_some(),
            value: IndicatorValue::Simple(ema.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary value slice. Returns one entry per input; `None` during warmup.
/// An empty vector is returned for a zero period.
pub fn ema_values(input: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(input.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &value) in input.iter().enumerate() {
        if i + 1 < period {
            sum += value;
            out.push(None);
        } else if i + 1 == period {
            sum += value;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = value * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }

    out
}
