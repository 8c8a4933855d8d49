//! Strategy catalogue: stable identifiers, families, strategy sets and the
//! fixed-size flag record evaluated once per instrument.

use std::fmt;
use std::str::FromStr;

pub const STRATEGY_COUNT: usize = 16;

/// Stable strategy identifiers. The numeric id never changes once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyId {
    GoldenCross5x20,
    Ma20Recovery,
    LowerBandRecovery,
    MacdCross,
    RsiRebound,
    NearLowerBand,
    GoldenCross5x60,
    NewHigh260,
    VolumeSurge,
    DeepPullback,
    BullishEngulfing,
    Ma60Reclaim,
    CciRebound,
    ObvRising,
    Breakout,
    Pullback,
}

/// Pricing family a strategy belongs to; each family has its own entry/stop/target policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyFamily {
    Swing,
    Breakout,
    Pullback,
}

impl fmt::Display for StrategyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyFamily::Swing => write!(f, "swing"),
            StrategyFamily::Breakout => write!(f, "breakout"),
            StrategyFamily::Pullback => write!(f, "pullback"),
        }
    }
}

impl StrategyId {
    /// Catalogue order (ascending numeric id).
    pub const ALL: [StrategyId; STRATEGY_COUNT] = [
        StrategyId::GoldenCross5x20,
        StrategyId::Ma20Recovery,
        StrategyId::LowerBandRecovery,
        StrategyId::MacdCross,
        StrategyId::RsiRebound,
        StrategyId::NearLowerBand,
        StrategyId::GoldenCross5x60,
        StrategyId::NewHigh260,
        StrategyId::VolumeSurge,
        StrategyId::DeepPullback,
        StrategyId::BullishEngulfing,
        StrategyId::Ma60Reclaim,
        StrategyId::CciRebound,
        StrategyId::ObvRising,
        StrategyId::Breakout,
        StrategyId::Pullback,
    ];

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_number(number: u8) -> Option<StrategyId> {
        let idx = (number as usize).checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }

    pub fn family(self) -> StrategyFamily {
        match self {
            StrategyId::Breakout => StrategyFamily::Breakout,
            StrategyId::Pullback => StrategyFamily::Pullback,
            _ => StrategyFamily::Swing,
        }
    }

    /// Short column header.
    pub fn label(self) -> &'static str {
        match self {
            StrategyId::GoldenCross5x20 => "MA5xMA20",
            StrategyId::Ma20Recovery => "MA20 recovery",
            StrategyId::LowerBandRecovery => "BB lower recovery",
            StrategyId::MacdCross => "MACD cross",
            StrategyId::RsiRebound => "RSI rebound",
            StrategyId::NearLowerBand => "Near BB lower",
            StrategyId::GoldenCross5x60 => "MA5xMA60",
            StrategyId::NewHigh260 => "52w high",
            StrategyId::VolumeSurge => "Volume surge",
            StrategyId::DeepPullback => "Deep pullback",
            StrategyId::BullishEngulfing => "Engulfing",
            StrategyId::Ma60Reclaim => "MA60 reclaim",
            StrategyId::CciRebound => "CCI rebound",
            StrategyId::ObvRising => "OBV rising",
            StrategyId::Breakout => "Breakout",
            StrategyId::Pullback => "Pullback",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyId::GoldenCross5x20 => "5-day MA crosses above the 20-day MA",
            StrategyId::Ma20Recovery => "Close recovers above the 20-day MA",
            StrategyId::LowerBandRecovery => "Close recovers above the lower Bollinger band",
            StrategyId::MacdCross => "MACD line crosses above its signal line",
            StrategyId::RsiRebound => "RSI climbs above 35 after sitting at or below 30",
            StrategyId::NearLowerBand => "Close within 5% above the lower Bollinger band",
            StrategyId::GoldenCross5x60 => "5-day MA crosses above the 60-day MA",
            StrategyId::NewHigh260 => "Close at or above the 260-bar high",
            StrategyId::VolumeSurge => "Volume above 2x its 20-day and above its 60-day average",
            StrategyId::DeepPullback => "Close at least 10% below the 5-day MA",
            StrategyId::BullishEngulfing => "Bullish candle engulfs the prior bearish bar",
            StrategyId::Ma60Reclaim => "Close reclaims the 60-day MA",
            StrategyId::CciRebound => "CCI climbs back above -100",
            StrategyId::ObvRising => "On-balance volume rising",
            StrategyId::Breakout => "Strong close near the high on heavy volume yesterday",
            StrategyId::Pullback => "Quiet 5-10% dip from a recent high near the 20-day MA",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.number(), self.label())
    }
}

/// Named selection of enabled strategies with its own history requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySet {
    Swing14,
    Swing8,
    BreakoutPullback,
}

impl StrategySet {
    pub fn enabled(self) -> Vec<StrategyId> {
        match self {
            StrategySet::Swing14 => StrategyId::ALL[..14].to_vec(),
            StrategySet::Swing8 => StrategyId::ALL[..8].to_vec(),
            StrategySet::BreakoutPullback => vec![StrategyId::Breakout, StrategyId::Pullback],
        }
    }

    pub fn default_min_bars(self) -> usize {
        match self {
            StrategySet::Swing14 => 60,
            StrategySet::Swing8 => 25,
            StrategySet::BreakoutPullback => 20,
        }
    }

    pub fn default_lookback_days(self) -> i64 {
        match self {
            StrategySet::Swing14 => 180,
            StrategySet::Swing8 => 120,
            StrategySet::BreakoutPullback => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategySet::Swing14 => "swing14",
            StrategySet::Swing8 => "swing8",
            StrategySet::BreakoutPullback => "breakout_pullback",
        }
    }
}

impl fmt::Display for StrategySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategySet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swing14" => Ok(StrategySet::Swing14),
            "swing8" => Ok(StrategySet::Swing8),
            "breakout_pullback" | "breakout-pullback" => Ok(StrategySet::BreakoutPullback),
            other => Err(format!(
                "unknown strategy set '{}' (expected swing14, swing8 or breakout_pullback)",
                other
            )),
        }
    }
}

/// One boolean per catalogue entry, indexed by [`StrategyId::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyFlags([bool; STRATEGY_COUNT]);

impl StrategyFlags {
    pub fn get(&self, id: StrategyId) -> bool {
        self.0[id.index()]
    }

    pub fn set(&mut self, id: StrategyId, value: bool) {
        self.0[id.index()] = value;
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&f| f).count()
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&f| f)
    }

    /// Satisfied strategies in catalogue order.
    pub fn satisfied(&self) -> Vec<StrategyId> {
        StrategyId::ALL
            .iter()
            .copied()
            .filter(|&id| self.get(id))
            .collect()
    }

    /// Distinct families of the satisfied strategies, ordered by their lowest satisfied id.
    pub fn families(&self) -> Vec<StrategyFamily> {
        let mut families = Vec::new();
        for id in self.satisfied() {
            if !families.contains(&id.family()) {
                families.push(id.family());
            }
        }
        families
    }

    pub fn all_of(&self, ids: &[StrategyId]) -> bool {
        ids.iter().all(|&id| self.get(id))
    }

    pub fn from_ids(ids: &[StrategyId]) -> Self {
        let mut flags = Self::default();
        for &id in ids {
            flags.set(id, true);
        }
        flags
    }
}
