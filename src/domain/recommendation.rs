//! Per-instrument recommendation record.

use crate::domain::instrument::Instrument;
use crate::domain::pricing::PriceLevels;
use crate::domain::strategy::{StrategyFamily, StrategyFlags, StrategyId};
use crate::domain::volume_profile::CongestionZone;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub instrument: Instrument,
    pub flags: StrategyFlags,
    pub current_price: f64,
    /// Percent change of the last close versus the previous close.
    pub change_pct: f64,
    /// Levels of the family of the lowest-numbered satisfied strategy.
    pub levels: PriceLevels,
    /// Levels of every other satisfied family, in the same order as
    /// [`StrategyFlags::families`].
    pub other_levels: Vec<PriceLevels>,
    /// Date of the most recent bar.
    pub as_of: NaiveDate,
    /// Omitted when the trailing window is too short for a volume profile.
    pub zone: Option<CongestionZone>,
    pub trading_value: f64,
}

impl Recommendation {
    pub fn satisfied_count(&self) -> usize {
        self.flags.count()
    }

    pub fn satisfied(&self) -> Vec<StrategyId> {
        self.flags.satisfied()
    }

    pub fn code(&self) -> &str {
        &self.instrument.code
    }

    pub fn levels_for(&self, family: StrategyFamily) -> Option<&PriceLevels> {
        std::iter::once(&self.levels)
            .chain(&self.other_levels)
            .find(|l| l.family == family)
    }
}

/// Percent change from `prev` to `curr`; zero when `prev` is not positive.
pub fn change_pct(prev: f64, curr: f64) -> f64 {
    if prev > 0.0 {
        (curr - prev) / prev * 100.0
    } else {
        0.0
    }
}
