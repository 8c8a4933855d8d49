#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use screener::domain::error::ScreenerError;
use screener::domain::instrument::{Instrument, MarketSegment};
pub use screener::domain::ohlcv::OhlcvBar;
use screener::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub instruments: Vec<Instrument>,
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_instrument(mut self, instrument: Instrument, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(instrument.code.clone(), bars);
        self.instruments.push(instrument);
        self
    }

    pub fn with_error(mut self, instrument: Instrument, reason: &str) -> Self {
        self.errors
            .insert(instrument.code.clone(), reason.to_string());
        self.instruments.push(instrument);
        self
    }
}

impl DataPort for MockDataPort {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ScreenerError> {
        Ok(self.instruments.clone())
    }

    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenerError::Provider {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn end_date() -> NaiveDate {
    date(2024, 6, 28)
}

pub fn instrument(code: &str, segment: MarketSegment) -> Instrument {
    Instrument {
        code: code.to_string(),
        name: format!("{code} Co"),
        segment,
        market_cap: 5.0e11,
    }
}

/// Consecutive daily bars ending on [`end_date`], flat OHLC at each close.
pub fn make_bars(code: &str, closes: &[f64], volume: i64) -> Vec<OhlcvBar> {
    let start = end_date() - Duration::days(closes.len() as i64 - 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            code: code.to_string(),
            date: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

/// 26 bars: flat, a ten-bar decline, a five-bar recovery, then a pullback close.
/// MA5 crosses above MA20 on the last bar (940.0 <= 943.75, then 951.0 > 940.5),
/// bar 5 carries a 4x volume spike, and the last close sits 1.2% below 0.995 * MA5
/// and well under the upper Bollinger band.
pub fn golden_cross_closes() -> Vec<f64> {
    let mut closes = vec![1000.0; 10];
    closes.extend((1..=10).map(|k| 1000.0 - 15.0 * k as f64));
    closes.extend((1..=5).map(|k| 850.0 + 30.0 * k as f64));
    closes.push(935.0);
    closes
}

pub fn golden_cross_bars(code: &str, volume: i64) -> Vec<OhlcvBar> {
    let mut bars = make_bars(code, &golden_cross_closes(), volume);
    bars[5].volume = volume * 4;
    bars
}
