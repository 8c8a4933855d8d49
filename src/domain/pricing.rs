//! Entry / stop-loss / target price policies, one per strategy family.

use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorField;
use crate::domain::indicator_frame::{IndicatorFrame, SMA_5, SMA_20};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyFamily;
use chrono::NaiveDate;

/// Entry relative to the 5-bar MA, stop and target relative to entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPricing {
    pub entry_offset: f64,
    pub stop_mult: f64,
    pub target_mult: f64,
}

impl Default for SwingPricing {
    fn default() -> Self {
        Self {
            entry_offset: -0.005,
            stop_mult: 0.95,
            target_mult: 1.12,
        }
    }
}

impl SwingPricing {
    /// Entry price at `index`, `None` while the 5-bar MA is undefined.
    pub fn entry(&self, frame: &IndicatorFrame, index: usize) -> Option<f64> {
        frame
            .simple(&SMA_5, index)
            .map(|ma5| ma5 * (1.0 + self.entry_offset))
    }
}

/// Prices anchored on the previous bar's high and close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutPricing {
    pub entry_mult: f64,
    pub stop_mult: f64,
    pub target_mult: f64,
}

impl Default for BreakoutPricing {
    fn default() -> Self {
        Self {
            entry_mult: 1.005,
            stop_mult: 0.97,
            target_mult: 1.05,
        }
    }
}

/// Entry on the current close, stop under the 20-bar MA, target at the high three bars back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullbackPricing {
    pub entry_mult: f64,
    pub stop_mult: f64,
}

impl Default for PullbackPricing {
    fn default() -> Self {
        Self {
            entry_mult: 1.005,
            stop_mult: 0.98,
        }
    }
}

/// Bars back from the current bar whose high the pullback model measures against.
pub const PULLBACK_HIGH_OFFSET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PricingPolicies {
    pub swing: SwingPricing,
    pub breakout: BreakoutPricing,
    pub pullback: PullbackPricing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevels {
    pub family: StrategyFamily,
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    /// Bar the levels were derived from.
    pub reference_date: NaiveDate,
}

impl PricingPolicies {
    /// Price levels for `family` on the most recent bar of `bars`.
    pub fn levels(
        &self,
        family: StrategyFamily,
        bars: &[OhlcvBar],
        frame: &IndicatorFrame,
    ) -> Result<PriceLevels, ScreenerError> {
        let Some(curr) = bars.last() else {
            return Err(ScreenerError::DataUnavailable {
                code: String::new(),
                reason: "empty series".into(),
            });
        };
        let last = bars.len() - 1;

        match family {
            StrategyFamily::Swing => {
                let ma5 = frame.require(&SMA_5, IndicatorField::Value, last)?;
                let entry = ma5 * (1.0 + self.swing.entry_offset);
                Ok(PriceLevels {
                    family,
                    entry,
                    stop_loss: entry * self.swing.stop_mult,
                    target: entry * self.swing.target_mult,
                    reference_date: curr.date,
                })
            }
            StrategyFamily::Breakout => {
                let prev = bar_back(bars, 1)?;
                Ok(PriceLevels {
                    family,
                    entry: prev.high * self.breakout.entry_mult,
                    stop_loss: prev.close * self.breakout.stop_mult,
                    target: prev.high * self.breakout.target_mult,
                    reference_date: prev.date,
                })
            }
            StrategyFamily::Pullback => {
                let anchor = bar_back(bars, PULLBACK_HIGH_OFFSET)?;
                let ma20 = frame.require(&SMA_20, IndicatorField::Value, last)?;
                Ok(PriceLevels {
                    family,
                    entry: curr.close * self.pullback.entry_mult,
                    stop_loss: ma20 * self.pullback.stop_mult,
                    target: anchor.high,
                    reference_date: curr.date,
                })
            }
        }
    }
}

fn bar_back(bars: &[OhlcvBar], back: usize) -> Result<&OhlcvBar, ScreenerError> {
    bars.len()
        .checked_sub(back + 1)
        .map(|i| &bars[i])
        .ok_or_else(|| ScreenerError::InsufficientHistory {
            code: bars.first().map(|b| b.code.clone()).unwrap_or_default(),
            bars: bars.len(),
            minimum: back + 1,
        })
}
