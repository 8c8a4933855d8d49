//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorField`: Which component of a multi-value indicator to read
//! - `IndicatorSeries`: A time series of indicator values aligned 1:1 with bars

pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use bollinger::calculate_bollinger;
pub use cci::calculate_cci;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rolling::{calculate_rolling_max, has_volume_spike};
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, calculate_volume_sma};

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Cci(usize),
    Obv,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    RollingMax(usize),
    VolumeSma(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value of `field` at `index`, or `None` while the indicator is still warming up.
    pub fn get(&self, index: usize, field: IndicatorField) -> Option<f64> {
        let point = self.values.get(index)?;
        if !point.valid {
            return None;
        }
        extract_field(&point.value, field).filter(|v| v.is_finite())
    }
}

fn extract_field(value: &IndicatorValue, field: IndicatorField) -> Option<f64> {
    match (value, field) {
        (IndicatorValue::Simple(v), IndicatorField::Value) => Some(*v),
        (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine) => Some(*line),
        (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => Some(*signal),
        (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => {
            Some(*histogram)
        }
        (IndicatorValue::Bollinger { upper, .. }, IndicatorField::BollingerUpper) => Some(*upper),
        (IndicatorValue::Bollinger { middle, .. }, IndicatorField::BollingerMiddle) => {
            Some(*middle)
        }
        (IndicatorValue::Bollinger { lower, .. }, IndicatorField::BollingerLower) => Some(*lower),
        _ => None,
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::RollingMax(period) => write!(f, "MAX({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
        }
    }
}
