//! Per-instrument indicator frame: every indicator the strategy catalogue reads,
//! aligned 1:1 with the prepared bars.

use crate::domain::error::ScreenerError;
use crate::domain::indicator::{
    IndicatorField, IndicatorSeries, IndicatorType, bollinger, calculate_bollinger, calculate_cci,
    calculate_ema, calculate_macd, calculate_obv, calculate_rolling_max, calculate_rsi,
    calculate_sma, calculate_volume_sma, has_volume_spike, macd,
};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const SMA_5: IndicatorType = IndicatorType::Sma(5);
pub const SMA_20: IndicatorType = IndicatorType::Sma(20);
pub const SMA_40: IndicatorType = IndicatorType::Sma(40);
pub const SMA_60: IndicatorType = IndicatorType::Sma(60);
pub const RSI_14: IndicatorType = IndicatorType::Rsi(14);
pub const BOLLINGER_20_2: IndicatorType = IndicatorType::Bollinger {
    period: bollinger::DEFAULT_PERIOD,
    stddev_mult_x100: bollinger::DEFAULT_MULT_X100,
};
pub const MACD_12_26_9: IndicatorType = IndicatorType::Macd {
    fast: macd::DEFAULT_FAST,
    slow: macd::DEFAULT_SLOW,
    signal: macd::DEFAULT_SIGNAL,
};
pub const CCI_20: IndicatorType = IndicatorType::Cci(20);
pub const OBV: IndicatorType = IndicatorType::Obv;
pub const HIGH_260: IndicatorType = IndicatorType::RollingMax(260);
pub const VOLUME_SMA_5: IndicatorType = IndicatorType::VolumeSma(5);
pub const VOLUME_SMA_20: IndicatorType = IndicatorType::VolumeSma(20);
pub const VOLUME_SMA_60: IndicatorType = IndicatorType::VolumeSma(60);

/// The fixed indicator set computed for every instrument.
pub fn standard_indicators() -> Vec<IndicatorType> {
    vec![
        SMA_5,
        SMA_20,
        SMA_40,
        SMA_60,
        RSI_14,
        BOLLINGER_20_2,
        MACD_12_26_9,
        CCI_20,
        OBV,
        HIGH_260,
        VOLUME_SMA_5,
        VOLUME_SMA_20,
        VOLUME_SMA_60,
    ]
}

pub fn compute_indicator(bars: &[OhlcvBar], indicator_type: &IndicatorType) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Sma(period) => calculate_sma(bars, period),
        IndicatorType::Ema(period) => calculate_ema(bars, period),
        IndicatorType::Rsi(period) => calculate_rsi(bars, period),
        IndicatorType::Cci(period) => calculate_cci(bars, period),
        IndicatorType::Obv => calculate_obv(bars),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(bars, period, stddev_mult_x100),
        IndicatorType::RollingMax(period) => calculate_rolling_max(bars, period),
        IndicatorType::VolumeSma(period) => calculate_volume_sma(bars, period),
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub series: HashMap<IndicatorType, IndicatorSeries>,
    /// Some adjacent pair in the window had volume[i] >= ratio * volume[i-1].
    pub volume_spike: bool,
}

impl IndicatorFrame {
    pub fn compute(bars: &[OhlcvBar], spike_ratio: f64) -> Self {
        Self::compute_with(bars, &standard_indicators(), spike_ratio)
    }

    pub fn compute_with(
        bars: &[OhlcvBar],
        indicator_types: &[IndicatorType],
        spike_ratio: f64,
    ) -> Self {
        let series = indicator_types
            .iter()
            .map(|t| (t.clone(), compute_indicator(bars, t)))
            .collect();
        Self {
            dates: bars.iter().map(|b| b.date).collect(),
            series,
            volume_spike: has_volume_spike(bars, spike_ratio),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Indicator value at a bar, `None` when not computed or still warming up.
    pub fn value(
        &self,
        indicator_type: &IndicatorType,
        field: IndicatorField,
        index: usize,
    ) -> Option<f64> {
        self.series.get(indicator_type)?.get(index, field)
    }

    /// Shorthand for single-valued indicators.
    pub fn simple(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        self.value(indicator_type, IndicatorField::Value, index)
    }

    /// Like [`value`](Self::value) but reports an undefined indicator as an error.
    pub fn require(
        &self,
        indicator_type: &IndicatorType,
        field: IndicatorField,
        index: usize,
    ) -> Result<f64, ScreenerError> {
        self.value(indicator_type, field, index)
            .ok_or_else(|| ScreenerError::IndicatorUndefined {
                indicator: indicator_type.to_string(),
                index,
            })
    }
}
