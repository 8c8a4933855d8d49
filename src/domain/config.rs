//! Resolved scan configuration built from a [`ConfigPort`].

use crate::domain::config_validation::{parse_date, validate_screen_config};
use crate::domain::error::ScreenerError;
use crate::domain::instrument::MarketSegment;
use crate::domain::pricing::{BreakoutPricing, PricingPolicies, PullbackPricing, SwingPricing};
use crate::domain::series_prep::PrepRules;
use crate::domain::strategy::{StrategyId, StrategySet};
use crate::domain::strategy_eval::SwingGate;
use crate::domain::synergy::{SYNERGY_SECTION, SynergyCombo, resolve_catalogue};
use crate::domain::universe::{DEFAULT_MIN_MARKET_CAP, UniverseFilter, parse_codes};
use crate::domain::volume_profile::VolumeProfileParams;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};

/// Minimum most-recent trading value per market segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityThresholds {
    pub kospi: f64,
    pub kosdaq: f64,
    pub konex: f64,
}

impl Default for LiquidityThresholds {
    fn default() -> Self {
        Self {
            kospi: 5_000_000_000.0,
            kosdaq: 3_000_000_000.0,
            konex: 100_000_000.0,
        }
    }
}

impl LiquidityThresholds {
    pub fn min_for(&self, segment: MarketSegment) -> f64 {
        match segment {
            MarketSegment::Kospi => self.kospi,
            MarketSegment::Kosdaq => self.kosdaq,
            MarketSegment::Konex => self.konex,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub universe: UniverseFilter,
    pub liquidity: LiquidityThresholds,
    pub strategy_set: StrategySet,
    pub enabled: Vec<StrategyId>,
    pub lookback_days: i64,
    pub min_bars: usize,
    /// Zero disables the per-instrument fetch timeout.
    pub fetch_timeout_secs: u64,
    pub parallel: bool,
    pub end_date: NaiveDate,
    pub gate: SwingGate,
    pub volume_spike_ratio: f64,
    pub halt_window: usize,
    pub pricing: PricingPolicies,
    pub volume_profile: VolumeProfileParams,
    pub synergies: Vec<SynergyCombo>,
}

impl ScreenConfig {
    /// Defaults for `strategy_set` ending on `end_date`.
    pub fn for_set(strategy_set: StrategySet, end_date: NaiveDate) -> Self {
        let enabled = strategy_set.enabled();
        let synergies = resolve_catalogue(&[], &enabled).unwrap_or_default();
        Self {
            universe: UniverseFilter::default(),
            liquidity: LiquidityThresholds::default(),
            strategy_set,
            enabled,
            lookback_days: strategy_set.default_lookback_days(),
            min_bars: strategy_set.default_min_bars(),
            fetch_timeout_secs: 10,
            parallel: true,
            end_date,
            gate: SwingGate::default(),
            volume_spike_ratio: 3.0,
            halt_window: 3,
            pricing: PricingPolicies::default(),
            volume_profile: VolumeProfileParams::default(),
            synergies,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.end_date - Duration::days(self.lookback_days)
    }

    pub fn prep_rules(&self, segment: MarketSegment) -> PrepRules {
        PrepRules {
            min_bars: self.min_bars,
            halt_window: self.halt_window,
            min_trading_value: self.liquidity.min_for(segment),
        }
    }
}

/// Validate and resolve configuration. `today` is the end date when none is configured.
pub fn build_screen_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<ScreenConfig, ScreenerError> {
    validate_screen_config(config)?;

    let strategy_set = match config.get_string("scan", "strategy_set") {
        Some(s) => s.parse::<StrategySet>().map_err(|reason| ScreenerError::ConfigInvalid {
            section: "scan".into(),
            key: "strategy_set".into(),
            reason,
        })?,
        None => StrategySet::Swing14,
    };
    let defaults = ScreenConfig::for_set(strategy_set, today);

    let end_date = match config.get_string("scan", "end_date") {
        Some(s) => parse_date(&s, "end_date")?,
        None => today,
    };

    let universe = UniverseFilter {
        min_market_cap: config.get_double("universe", "min_market_cap", DEFAULT_MIN_MARKET_CAP),
        preferred_suffixes: match config.get_string("universe", "preferred_suffixes") {
            Some(s) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => defaults.universe.preferred_suffixes.clone(),
        },
        codes: config
            .get_string("universe", "codes")
            .map(|c| parse_codes(&c))
            .transpose()
            .map_err(|e| ScreenerError::ConfigInvalid {
                section: "universe".into(),
                key: "codes".into(),
                reason: e.to_string(),
            })?,
        max_instruments: config
            .get_string("universe", "max_instruments")
            .map(|_| config.get_int("universe", "max_instruments", 1) as usize),
    };

    let liquidity = LiquidityThresholds {
        kospi: config.get_double("liquidity", "min_trading_value_kospi", defaults.liquidity.kospi),
        kosdaq: config.get_double(
            "liquidity",
            "min_trading_value_kosdaq",
            defaults.liquidity.kosdaq,
        ),
        konex: config.get_double("liquidity", "min_trading_value_konex", defaults.liquidity.konex),
    };

    let swing = SwingPricing::default();
    let breakout = BreakoutPricing::default();
    let pullback = PullbackPricing::default();
    let pricing = PricingPolicies {
        swing: SwingPricing {
            entry_offset: config.get_double("pricing", "swing_entry_offset", swing.entry_offset),
            stop_mult: config.get_double("pricing", "swing_stop", swing.stop_mult),
            target_mult: config.get_double("pricing", "swing_target", swing.target_mult),
        },
        breakout: BreakoutPricing {
            entry_mult: config.get_double("pricing", "breakout_entry", breakout.entry_mult),
            stop_mult: config.get_double("pricing", "breakout_stop", breakout.stop_mult),
            target_mult: config.get_double("pricing", "breakout_target", breakout.target_mult),
        },
        pullback: PullbackPricing {
            entry_mult: config.get_double("pricing", "pullback_entry", pullback.entry_mult),
            stop_mult: config.get_double("pricing", "pullback_stop", pullback.stop_mult),
        },
    };

    let gate = SwingGate {
        entry_proximity: config.get_double(
            "thresholds",
            "entry_proximity",
            defaults.gate.entry_proximity,
        ),
        upper_band_proximity: config.get_double(
            "thresholds",
            "upper_band_proximity",
            defaults.gate.upper_band_proximity,
        ),
    };

    let volume_profile = VolumeProfileParams {
        window: config.get_int(
            "volume_profile",
            "window",
            defaults.volume_profile.window as i64,
        ) as usize,
        bins: config.get_int("volume_profile", "bins", defaults.volume_profile.bins as i64)
            as usize,
    };

    let synergies = resolve_catalogue(&config.section_entries(SYNERGY_SECTION), &defaults.enabled)?;

    Ok(ScreenConfig {
        universe,
        liquidity,
        strategy_set,
        enabled: defaults.enabled.clone(),
        lookback_days: config.get_int("scan", "lookback_days", defaults.lookback_days),
        min_bars: config.get_int("scan", "min_bars", defaults.min_bars as i64) as usize,
        fetch_timeout_secs: config.get_int(
            "scan",
            "fetch_timeout_secs",
            defaults.fetch_timeout_secs as i64,
        ) as u64,
        parallel: config.get_bool("scan", "parallel", defaults.parallel),
        end_date,
        gate,
        volume_spike_ratio: config.get_double(
            "thresholds",
            "volume_spike_ratio",
            defaults.volume_spike_ratio,
        ),
        halt_window: config.get_int("thresholds", "halt_window", defaults.halt_window as i64)
            as usize,
        pricing,
        volume_profile,
        synergies,
    })
}
