//! Strategy registry and per-instrument evaluation.
//!
//! Every strategy is a pure predicate over an immutable [`EvalContext`] holding the
//! prepared bars and their indicator frame. Predicates read the current bar (the
//! last one) and, where needed, the previous bar or deeper history.
//!
//! # Evaluation Semantics
//!
//! - An indicator that is undefined on a bar the predicate reads makes it `false`
//! - Crosses require the previous bar: `prev_left <= prev_right && curr_left > curr_right`
//! - Swing gates (volume-spike history, entry proximity, upper band) only affect
//!   Swing-family strategies; a failing gate forces every Swing flag to `false`

use crate::domain::error::ScreenerError;
use crate::domain::indicator::{IndicatorField, IndicatorType};
use crate::domain::indicator_frame::{
    BOLLINGER_20_2, CCI_20, HIGH_260, IndicatorFrame, MACD_12_26_9, OBV, RSI_14, SMA_5, SMA_20,
    SMA_60, VOLUME_SMA_5, VOLUME_SMA_20, VOLUME_SMA_60,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pricing::{PULLBACK_HIGH_OFFSET, SwingPricing};
use crate::domain::strategy::{STRATEGY_COUNT, StrategyFamily, StrategyFlags, StrategyId};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_RECOVERY: f64 = 35.0;
const CCI_OVERSOLD: f64 = -100.0;
const LOWER_BAND_PROXIMITY: f64 = 0.05;
const VOLUME_SURGE_MULT: f64 = 2.0;
const DEEP_PULLBACK_RATIO: f64 = 0.9;
const BREAKOUT_CLOSE_TO_HIGH: f64 = 0.9;
const BREAKOUT_VOLUME_MULT: f64 = 1.5;
const PULLBACK_LOWER: f64 = 0.90;
const PULLBACK_UPPER: f64 = 0.95;
const PULLBACK_MA20_BAND: f64 = 0.02;

/// Immutable per-instrument view handed to every predicate.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub bars: &'a [OhlcvBar],
    pub frame: &'a IndicatorFrame,
}

impl<'a> EvalContext<'a> {
    pub fn new(bars: &'a [OhlcvBar], frame: &'a IndicatorFrame) -> Self {
        Self { bars, frame }
    }

    pub fn index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    pub fn curr(&self) -> Option<&'a OhlcvBar> {
        self.bars.last()
    }

    pub fn prev(&self) -> Option<&'a OhlcvBar> {
        self.back(1)
    }

    /// Bar `n` positions before the current one.
    pub fn back(&self, n: usize) -> Option<&'a OhlcvBar> {
        let i = self.bars.len().checked_sub(n + 1)?;
        self.bars.get(i)
    }

    /// Single-valued indicator `n` bars before the current one.
    fn at(&self, ty: &IndicatorType, n: usize) -> Option<f64> {
        self.field(ty, IndicatorField::Value, n)
    }

    fn field(&self, ty: &IndicatorType, field: IndicatorField, n: usize) -> Option<f64> {
        let i = self.index()?.checked_sub(n)?;
        self.frame.value(ty, field, i)
    }

    /// Close of the bar `n` positions back.
    fn close(&self, n: usize) -> Option<f64> {
        self.back(n).map(|b| b.close)
    }
}

/// `None` means a required input was undefined; callers treat it as `false`.
pub type Predicate = fn(&EvalContext<'_>) -> Option<bool>;

fn crossed_above(prev_left: f64, prev_right: f64, left: f64, right: f64) -> bool {
    prev_left <= prev_right && left > right
}

fn ma5_cross_ma20(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(crossed_above(
        ctx.at(&SMA_5, 1)?,
        ctx.at(&SMA_20, 1)?,
        ctx.at(&SMA_5, 0)?,
        ctx.at(&SMA_20, 0)?,
    ))
}

fn ma20_recovery(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.close(1)? < ctx.at(&SMA_20, 1)? && ctx.close(0)? > ctx.at(&SMA_20, 0)?)
}

fn lower_band_recovery(ctx: &EvalContext<'_>) -> Option<bool> {
    let lower = IndicatorField::BollingerLower;
    Some(
        ctx.close(1)? < ctx.field(&BOLLINGER_20_2, lower, 1)?
            && ctx.close(0)? > ctx.field(&BOLLINGER_20_2, lower, 0)?,
    )
}

fn macd_cross(ctx: &EvalContext<'_>) -> Option<bool> {
    let (line, signal) = (IndicatorField::MacdLine, IndicatorField::MacdSignal);
    Some(crossed_above(
        ctx.field(&MACD_12_26_9, line, 1)?,
        ctx.field(&MACD_12_26_9, signal, 1)?,
        ctx.field(&MACD_12_26_9, line, 0)?,
        ctx.field(&MACD_12_26_9, signal, 0)?,
    ))
}

fn rsi_rebound(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.at(&RSI_14, 1)? <= RSI_OVERSOLD && ctx.at(&RSI_14, 0)? > RSI_RECOVERY)
}

fn near_lower_band(ctx: &EvalContext<'_>) -> Option<bool> {
    let lower = ctx.field(&BOLLINGER_20_2, IndicatorField::BollingerLower, 0)?;
    let close = ctx.close(0)?;
    Some(close >= lower && close <= lower * (1.0 + LOWER_BAND_PROXIMITY))
}

fn ma5_cross_ma60(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(crossed_above(
        ctx.at(&SMA_5, 1)?,
        ctx.at(&SMA_60, 1)?,
        ctx.at(&SMA_5, 0)?,
        ctx.at(&SMA_60, 0)?,
    ))
}

fn new_high_260(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.close(0)? >= ctx.at(&HIGH_260, 0)?)
}

fn volume_surge(ctx: &EvalContext<'_>) -> Option<bool> {
    let volume = ctx.curr()?.volume as f64;
    Some(
        volume > VOLUME_SURGE_MULT * ctx.at(&VOLUME_SMA_20, 0)?
            && volume > ctx.at(&VOLUME_SMA_60, 0)?,
    )
}

fn deep_pullback(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.close(0)? <= ctx.at(&SMA_5, 0)? * DEEP_PULLBACK_RATIO)
}

fn bullish_engulfing(ctx: &EvalContext<'_>) -> Option<bool> {
    let (curr, prev) = (ctx.curr()?, ctx.prev()?);
    Some(curr.close > prev.high && curr.close > curr.open && prev.close < prev.open)
}

fn ma60_reclaim(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.close(1)? < ctx.at(&SMA_60, 1)? && ctx.close(0)? > ctx.at(&SMA_60, 0)?)
}

fn cci_rebound(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.at(&CCI_20, 1)? <= CCI_OVERSOLD && ctx.at(&CCI_20, 0)? > CCI_OVERSOLD)
}

fn obv_rising(ctx: &EvalContext<'_>) -> Option<bool> {
    Some(ctx.at(&OBV, 0)? > ctx.at(&OBV, 1)?)
}

fn breakout(ctx: &EvalContext<'_>) -> Option<bool> {
    let prev = ctx.prev()?;
    let vol_avg = ctx.at(&VOLUME_SMA_5, 0)?;
    Some(
        prev.close >= prev.high * BREAKOUT_CLOSE_TO_HIGH
            && prev.volume as f64 >= vol_avg * BREAKOUT_VOLUME_MULT
            && prev.close > prev.open,
    )
}

fn pullback(ctx: &EvalContext<'_>) -> Option<bool> {
    let curr = ctx.curr()?;
    let recent_high = ctx.back(PULLBACK_HIGH_OFFSET)?.high;
    let ma20 = ctx.at(&SMA_20, 0)?;
    let vol_avg = ctx.at(&VOLUME_SMA_5, 0)?;
    if ma20 <= 0.0 {
        return Some(false);
    }
    Some(
        curr.close >= recent_high * PULLBACK_LOWER
            && curr.close <= recent_high * PULLBACK_UPPER
            && ((curr.close - ma20) / ma20).abs() < PULLBACK_MA20_BAND
            && (curr.volume as f64) < vol_avg,
    )
}

/// Fixed mapping from strategy id to predicate.
pub struct StrategyRegistry {
    entries: Vec<(StrategyId, Predicate)>,
}

impl StrategyRegistry {
    pub fn standard() -> Self {
        let entries: [(StrategyId, Predicate); STRATEGY_COUNT] = [
            (StrategyId::GoldenCross5x20, ma5_cross_ma20),
            (StrategyId::Ma20Recovery, ma20_recovery),
            (StrategyId::LowerBandRecovery, lower_band_recovery),
            (StrategyId::MacdCross, macd_cross),
            (StrategyId::RsiRebound, rsi_rebound),
            (StrategyId::NearLowerBand, near_lower_band),
            (StrategyId::GoldenCross5x60, ma5_cross_ma60),
            (StrategyId::NewHigh260, new_high_260),
            (StrategyId::VolumeSurge, volume_surge),
            (StrategyId::DeepPullback, deep_pullback),
            (StrategyId::BullishEngulfing, bullish_engulfing),
            (StrategyId::Ma60Reclaim, ma60_reclaim),
            (StrategyId::CciRebound, cci_rebound),
            (StrategyId::ObvRising, obv_rising),
            (StrategyId::Breakout, breakout),
            (StrategyId::Pullback, pullback),
        ];
        Self {
            entries: entries.to_vec(),
        }
    }

    /// Build from explicit entries; use [`validate`](Self::validate) before evaluating.
    pub fn from_entries(entries: Vec<(StrategyId, Predicate)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every catalogue id must be registered exactly once.
    pub fn validate(&self) -> Result<(), ScreenerError> {
        let mut seen = [0usize; STRATEGY_COUNT];
        for (id, _) in &self.entries {
            seen[id.index()] += 1;
        }
        for id in StrategyId::ALL {
            match seen[id.index()] {
                1 => {}
                0 => return Err(registry_error(id, "not registered")),
                _ => return Err(registry_error(id, "registered more than once")),
            }
        }
        Ok(())
    }

    pub fn predicate(&self, id: StrategyId) -> Option<Predicate> {
        self.entries
            .iter()
            .find(|(registered, _)| *registered == id)
            .map(|(_, p)| *p)
    }

    /// Evaluate the enabled strategies. Disabled ids stay `false`.
    pub fn evaluate(&self, ctx: &EvalContext<'_>, enabled: &[StrategyId]) -> StrategyFlags {
        let mut flags = StrategyFlags::default();
        for (id, predicate) in &self.entries {
            if enabled.contains(id) {
                flags.set(*id, predicate(ctx).unwrap_or(false));
            }
        }
        flags
    }
}

fn registry_error(id: StrategyId, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: "strategies".into(),
        key: id.number().to_string(),
        reason: reason.into(),
    }
}

/// Pre-conditions for the swing family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingGate {
    /// Maximum |entry - close| / close.
    pub entry_proximity: f64,
    /// Exclude when close >= upper band * (1 - this).
    pub upper_band_proximity: f64,
}

impl Default for SwingGate {
    fn default() -> Self {
        Self {
            entry_proximity: 0.02,
            upper_band_proximity: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    NoVolumeSpike,
    EntryTooFar,
    NearUpperBand,
    Undefined,
}

impl GateOutcome {
    pub fn passed(self) -> bool {
        self == GateOutcome::Pass
    }
}

impl SwingGate {
    pub fn check(&self, ctx: &EvalContext<'_>, pricing: &SwingPricing) -> GateOutcome {
        if !ctx.frame.volume_spike {
            return GateOutcome::NoVolumeSpike;
        }
        let (Some(index), Some(curr)) = (ctx.index(), ctx.curr()) else {
            return GateOutcome::Undefined;
        };
        let Some(entry) = pricing.entry(ctx.frame, index) else {
            return GateOutcome::Undefined;
        };
        if curr.close <= 0.0 || (entry - curr.close).abs() / curr.close > self.entry_proximity {
            return GateOutcome::EntryTooFar;
        }
        let Some(upper) = ctx
            .frame
            .value(&BOLLINGER_20_2, IndicatorField::BollingerUpper, index)
        else {
            return GateOutcome::Undefined;
        };
        if curr.close >= upper * (1.0 - self.upper_band_proximity) {
            return GateOutcome::NearUpperBand;
        }
        GateOutcome::Pass
    }
}

/// Result of running the registry and the swing gate on one instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub flags: StrategyFlags,
    pub gate: GateOutcome,
}

/// Evaluate `enabled` strategies and clear every Swing flag when the gate fails.
/// The gate is only checked when some Swing strategy is enabled.
pub fn evaluate_strategies(
    registry: &StrategyRegistry,
    ctx: &EvalContext<'_>,
    enabled: &[StrategyId],
    gate: &SwingGate,
    swing_pricing: &SwingPricing,
) -> Evaluation {
    let mut flags = registry.evaluate(ctx, enabled);
    let swing_enabled = enabled
        .iter()
        .any(|id| id.family() == StrategyFamily::Swing);
    let outcome = if swing_enabled {
        gate.check(ctx, swing_pricing)
    } else {
        GateOutcome::Pass
    };
    if !outcome.passed() {
        for id in StrategyId::ALL {
            if id.family() == StrategyFamily::Swing {
                flags.set(id, false);
            }
        }
    }
    Evaluation {
        flags,
        gate: outcome,
    }
}
