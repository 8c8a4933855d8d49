//! End-to-end scans over a mock data port.
//!
//! Tests cover:
//! - Golden cross with a passing swing gate and MA5-based price levels
//! - Liquidity, history-length and provider failures become skips
//! - Stable ranking and identical output from parallel and sequential scans
//! - Synergy tables as intersections of the ranked list

mod common;

use approx::assert_relative_eq;
use common::*;
use screener::domain::config::ScreenConfig;
use screener::domain::error::SkipReason;
use screener::domain::instrument::MarketSegment;
use screener::domain::pricing::PriceLevels;
use screener::domain::ranker::rank;
use screener::domain::recommendation::Recommendation;
use screener::domain::scan::{ScanReport, run_scan};
use screener::domain::strategy::{StrategyFamily, StrategyFlags, StrategyId, StrategySet};
use screener::domain::strategy_eval::{
    EvalContext, GateOutcome, StrategyRegistry, evaluate_strategies,
};
use screener::domain::indicator_frame::IndicatorFrame;
use screener::domain::synergy::{SynergyCombo, aggregate_synergies};
use screener::domain::universe::{UniverseFilter, load_universe};
use screener::ports::data_port::DataPort;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const LIQUID_VOLUME: i64 = 5_000_000;

fn swing8_config() -> ScreenConfig {
    ScreenConfig::for_set(StrategySet::Swing8, end_date())
}

fn scan(port: MockDataPort, config: &ScreenConfig) -> ScanReport {
    let universe = port.instruments.clone();
    let port: Arc<dyn DataPort> = Arc::new(port);
    let cancel = AtomicBool::new(false);
    run_scan(port, &universe, config, &cancel, |_, _, _| {}).unwrap()
}

mod golden_cross {
    use super::*;

    #[test]
    fn gate_passes_and_strategy_one_fires() {
        let bars = golden_cross_bars("A", LIQUID_VOLUME);
        let frame = IndicatorFrame::compute(&bars, 3.0);
        let ctx = EvalContext::new(&bars, &frame);
        let config = swing8_config();

        let evaluation = evaluate_strategies(
            &StrategyRegistry::standard(),
            &ctx,
            &config.enabled,
            &config.gate,
            &config.pricing.swing,
        );
        assert_eq!(evaluation.gate, GateOutcome::Pass);
        assert!(evaluation.flags.get(StrategyId::GoldenCross5x20));
    }

    #[test]
    fn scan_prices_from_ma5() {
        let port = MockDataPort::new().with_instrument(
            instrument("A", MarketSegment::Kosdaq),
            golden_cross_bars("A", LIQUID_VOLUME),
        );
        let report = scan(port, &swing8_config());

        assert_eq!(report.scanned, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.recommendations.len(), 1);

        let rec = &report.recommendations[0];
        assert!(rec.flags.get(StrategyId::GoldenCross5x20));
        assert_eq!(rec.levels.family, StrategyFamily::Swing);
        assert_eq!(rec.as_of, end_date());
        assert_eq!(rec.levels.reference_date, end_date());

        let ma5 = (910.0 + 940.0 + 970.0 + 1000.0 + 935.0) / 5.0;
        let entry = ma5 * 0.995;
        assert_relative_eq!(rec.levels.entry, entry, epsilon = 1e-9);
        assert_relative_eq!(rec.levels.stop_loss, entry * 0.95, epsilon = 1e-9);
        assert_relative_eq!(rec.levels.target, entry * 1.12, epsilon = 1e-9);
        assert_relative_eq!(rec.current_price, 935.0);
        assert_relative_eq!(rec.change_pct, -6.5, epsilon = 1e-9);
        assert_relative_eq!(rec.trading_value, 935.0 * LIQUID_VOLUME as f64);
    }

    #[test]
    fn series_shorter_than_profile_window_has_no_zone() {
        let port = MockDataPort::new().with_instrument(
            instrument("A", MarketSegment::Kosdaq),
            golden_cross_bars("A", LIQUID_VOLUME),
        );
        let report = scan(port, &swing8_config());
        assert!(report.recommendations[0].zone.is_none());
    }

    #[test]
    fn without_volume_spike_swing_flags_are_cleared() {
        let bars = make_bars("A", &golden_cross_closes(), LIQUID_VOLUME);
        let port = MockDataPort::new().with_instrument(instrument("A", MarketSegment::Kosdaq), bars);
        let report = scan(port, &swing8_config());

        assert!(report.recommendations.is_empty());
        assert_eq!(report.no_signal, 1);
    }
}

mod skips {
    use super::*;

    #[test]
    fn low_trading_value_is_excluded() {
        let port = MockDataPort::new()
            .with_instrument(
                instrument("THIN", MarketSegment::Kosdaq),
                golden_cross_bars("THIN", 1_000),
            )
            .with_instrument(
                instrument("A", MarketSegment::Kosdaq),
                golden_cross_bars("A", LIQUID_VOLUME),
            );
        let report = scan(port, &swing8_config());

        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].code(), "A");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].code, "THIN");
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::LowTradingValue { .. }
        ));
    }

    #[test]
    fn too_few_bars_produces_no_record() {
        let closes = golden_cross_closes();
        let bars = make_bars("SHORT", &closes[closes.len() - 10..], LIQUID_VOLUME);
        let port = MockDataPort::new().with_instrument(instrument("SHORT", MarketSegment::Kospi), bars);
        let report = scan(port, &swing8_config());

        assert!(report.recommendations.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::InsufficientBars {
                bars: 10,
                minimum: 25
            }
        );
    }

    #[test]
    fn halted_instrument_is_skipped() {
        let mut bars = golden_cross_bars("HALT", LIQUID_VOLUME);
        let n = bars.len();
        for bar in &mut bars[n - 3..] {
            bar.volume = 0;
        }
        let port = MockDataPort::new().with_instrument(instrument("HALT", MarketSegment::Kosdaq), bars);
        let report = scan(port, &swing8_config());
        assert_eq!(report.skipped[0].reason, SkipReason::Halted);
    }

    #[test]
    fn provider_error_does_not_abort_the_scan() {
        let port = MockDataPort::new()
            .with_error(instrument("BAD", MarketSegment::Kosdaq), "connection reset")
            .with_instrument(
                instrument("A", MarketSegment::Kosdaq),
                golden_cross_bars("A", LIQUID_VOLUME),
            );
        let report = scan(port, &swing8_config());

        assert_eq!(report.scanned, 2);
        assert_eq!(report.recommendations.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::ProviderError { .. }
        ));
    }

    #[test]
    fn missing_series_is_no_data() {
        let port = MockDataPort::new().with_instrument(instrument("EMPTY", MarketSegment::Kosdaq), vec![]);
        let report = scan(port, &swing8_config());
        assert_eq!(report.skipped[0].reason, SkipReason::NoData);
    }
}

mod ranking {
    use super::*;

    fn three_instrument_port() -> MockDataPort {
        MockDataPort::new()
            .with_instrument(
                instrument("C", MarketSegment::Kosdaq),
                golden_cross_bars("C", LIQUID_VOLUME),
            )
            .with_instrument(
                instrument("A", MarketSegment::Kosdaq),
                golden_cross_bars("A", LIQUID_VOLUME),
            )
            .with_instrument(
                instrument("B", MarketSegment::Kosdaq),
                golden_cross_bars("B", LIQUID_VOLUME),
            )
    }

    #[test]
    fn ties_keep_universe_order() {
        let report = scan(three_instrument_port(), &swing8_config());
        let codes: Vec<&str> = report.recommendations.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[test]
    fn sequential_and_parallel_scans_agree() {
        let parallel = scan(three_instrument_port(), &swing8_config());
        let mut config = swing8_config();
        config.parallel = false;
        let sequential = scan(three_instrument_port(), &config);

        assert_eq!(parallel.recommendations, sequential.recommendations);
        assert_eq!(parallel.skipped, sequential.skipped);
    }

    #[test]
    fn higher_count_ranks_first() {
        let recs = vec![
            recommendation("ONE", &[StrategyId::MacdCross]),
            recommendation("THREE", &[StrategyId::GoldenCross5x20, StrategyId::MacdCross, StrategyId::ObvRising]),
            recommendation("NONE", &[]),
            recommendation("TWO", &[StrategyId::RsiRebound, StrategyId::LowerBandRecovery]),
        ];
        let ranked = rank(recs);
        let codes: Vec<&str> = ranked.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["THREE", "TWO", "ONE"]);
    }
}

mod synergy {
    use super::*;

    #[test]
    fn tables_are_intersections_of_the_ranked_list() {
        let ranked = rank(vec![
            recommendation("X", &[StrategyId::LowerBandRecovery, StrategyId::RsiRebound]),
            recommendation("Y", &[StrategyId::LowerBandRecovery]),
            recommendation(
                "Z",
                &[
                    StrategyId::LowerBandRecovery,
                    StrategyId::RsiRebound,
                    StrategyId::MacdCross,
                ],
            ),
        ]);
        let combos = vec![
            SynergyCombo::new(
                "oversold",
                &[StrategyId::LowerBandRecovery, StrategyId::RsiRebound],
                "Band and RSI recovery together",
            ),
            SynergyCombo::new(
                "unused",
                &[StrategyId::GoldenCross5x20, StrategyId::VolumeSurge],
                "Never seen here",
            ),
        ];
        let matches = aggregate_synergies(&combos, &ranked);

        let codes: Vec<&str> = matches[0].recommendations.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["Z", "X"]);
        assert!(matches[1].recommendations.is_empty());
    }

    #[test]
    fn scan_report_carries_configured_combos() {
        let mut config = swing8_config();
        config.synergies = vec![SynergyCombo::new(
            "cross_with_obv",
            &[StrategyId::GoldenCross5x20, StrategyId::ObvRising],
            "Golden cross with rising OBV",
        )];
        config.enabled = StrategySet::Swing14.enabled();
        let port = MockDataPort::new().with_instrument(
            instrument("A", MarketSegment::Kosdaq),
            golden_cross_bars("A", LIQUID_VOLUME),
        );
        let report = scan(port, &config);

        assert_eq!(report.synergies.len(), 1);
        // Last close is below the previous one, so OBV falls.
        assert!(report.synergies[0].recommendations.is_empty());
        assert_eq!(report.recommendations.len(), 1);
    }
}

mod universe {
    use super::*;

    #[test]
    fn preferred_shares_and_small_caps_are_dropped() {
        let mut small = instrument("SMALL", MarketSegment::Kosdaq);
        small.market_cap = 5.0e10;
        let mut preferred = instrument("005935", MarketSegment::Kospi);
        preferred.name = "삼성전자우".to_string();
        let port = MockDataPort::new()
            .with_instrument(small, vec![])
            .with_instrument(preferred, vec![])
            .with_instrument(instrument("A", MarketSegment::Kosdaq), vec![]);

        let universe = load_universe(&port, &UniverseFilter::default()).unwrap();
        let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["A"]);
    }
}

fn recommendation(code: &str, ids: &[StrategyId]) -> Recommendation {
    Recommendation {
        instrument: instrument(code, MarketSegment::Kospi),
        flags: StrategyFlags::from_ids(ids),
        current_price: 1000.0,
        change_pct: 0.0,
        levels: PriceLevels {
            family: StrategyFamily::Swing,
            entry: 995.0,
            stop_loss: 945.25,
            target: 1114.4,
            reference_date: end_date(),
        },
        other_levels: Vec::new(),
        as_of: end_date(),
        zone: None,
        trading_value: 1.0e10,
    }
}
