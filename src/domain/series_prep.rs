//! Cleans and validates a raw per-instrument price series before indicator work.

use crate::domain::error::{HALTED_REASON, ScreenerError};
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;

/// Per-run acceptance rules for a raw series.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepRules {
    pub min_bars: usize,
    /// Trailing bars whose summed volume must be non-zero.
    pub halt_window: usize,
    /// Minimum trading value (close * volume) of the most recent bar.
    pub min_trading_value: f64,
}

#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub bars: Vec<OhlcvBar>,
    pub trading_values: Vec<f64>,
}

impl PreparedSeries {
    pub fn latest_trading_value(&self) -> f64 {
        self.trading_values.last().copied().unwrap_or(0.0)
    }
}

/// Drop malformed bars, order by date, collapse duplicate dates (last wins), then
/// apply the emptiness, halt, history-length and liquidity checks in that order.
pub fn prepare_series(
    instrument: &Instrument,
    raw: Vec<OhlcvBar>,
    rules: &PrepRules,
) -> Result<PreparedSeries, ScreenerError> {
    let code = &instrument.code;

    let mut bars: Vec<OhlcvBar> = raw.into_iter().filter(OhlcvBar::is_well_formed).collect();
    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => deduped.push(bar),
        }
    }
    let bars = deduped;

    if bars.is_empty() {
        return Err(ScreenerError::DataUnavailable {
            code: code.clone(),
            reason: "empty series".into(),
        });
    }

    let window = rules.halt_window.min(bars.len());
    let trailing_volume: i64 = bars[bars.len() - window..].iter().map(|b| b.volume).sum();
    if window > 0 && trailing_volume == 0 {
        return Err(ScreenerError::DataUnavailable {
            code: code.clone(),
            reason: HALTED_REASON.into(),
        });
    }

    if bars.len() < rules.min_bars {
        return Err(ScreenerError::InsufficientHistory {
            code: code.clone(),
            bars: bars.len(),
            minimum: rules.min_bars,
        });
    }

    let trading_values: Vec<f64> = bars.iter().map(OhlcvBar::trading_value).collect();
    let latest = trading_values.last().copied().unwrap_or(0.0);
    if latest < rules.min_trading_value {
        return Err(ScreenerError::LowTradingValue {
            code: code.clone(),
            value: latest,
            minimum: rules.min_trading_value,
        });
    }

    Ok(PreparedSeries {
        bars,
        trading_values,
    })
}
