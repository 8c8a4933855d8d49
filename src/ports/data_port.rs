//! Market-data access port.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of the instrument universe and per-instrument daily history.
///
/// Implementations are shared across scan worker threads.
pub trait DataPort: Send + Sync {
    /// Every listed instrument with its segment and market capitalisation.
    fn list_instruments(&self) -> Result<Vec<Instrument>, ScreenerError>;

    /// Daily bars for `code` with `start_date <= date <= end_date`.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError>;
}
