//! CSV file market-data adapter.
//!
//! Layout of the data directory:
//! - `instruments.csv`: `code,name,segment,market_cap`
//! - `<CODE>.csv`: `date,open,high,low,close,volume` with `YYYY-MM-DD` dates

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const UNIVERSE_FILE: &str = "instruments.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    code: String,
    name: String,
    segment: String,
    market_cap: f64,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl DataPort for CsvAdapter {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ScreenerError> {
        let path = self.base_path.join(UNIVERSE_FILE);
        let unavailable = |reason: String| ScreenerError::UniverseUnavailable { reason };

        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let mut instruments = Vec::new();
        for (line, result) in rdr.deserialize::<InstrumentRow>().enumerate() {
            let row = result.map_err(|e| unavailable(format!("CSV parse error: {}", e)))?;
            let segment = row
                .segment
                .parse()
                .map_err(|e| unavailable(format!("row {}: {}", line + 1, e)))?;
            instruments.push(Instrument {
                code: row.code.trim().to_string(),
                name: row.name.trim().to_string(),
                segment,
                market_cap: row.market_cap,
            });
        }
        Ok(instruments)
    }

    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let provider = |reason: String| ScreenerError::Provider {
            code: code.to_string(),
            reason,
        };

        let path = self.csv_path(code);
        let content = fs::read_to_string(&path)
            .map_err(|e| provider(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.deserialize::<BarRow>() {
            let row = result.map_err(|e| provider(format!("CSV parse error: {}", e)))?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
                .map_err(|e| provider(format!("invalid date format: {}", e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
