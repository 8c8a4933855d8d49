//! Scan pipeline: fetch, prepare, evaluate and price every instrument, then rank
//! and aggregate at the join point.
//!
//! Each instrument is evaluated independently; results are only combined after
//! all per-instrument work has finished, so the per-instrument phase can run on
//! the rayon pool or sequentially with identical output order.

use crate::domain::config::ScreenConfig;
use crate::domain::error::{ScreenerError, SkipReason, SkippedInstrument};
use crate::domain::indicator_frame::IndicatorFrame;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::ranker::{ResultTable, build_family_table, build_table, rank};
use crate::domain::recommendation::{Recommendation, change_pct};
use crate::domain::series_prep::prepare_series;
use crate::domain::strategy::{StrategyFamily, StrategyId, StrategySet};
use crate::domain::strategy_eval::{EvalContext, StrategyRegistry, evaluate_strategies};
use crate::domain::synergy::{SynergyMatch, aggregate_synergies};
use crate::domain::volume_profile;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub as_of: NaiveDate,
    pub strategy_set: StrategySet,
    pub enabled: Vec<StrategyId>,
    /// Ranked: satisfied count descending, scan order within ties.
    pub recommendations: Vec<Recommendation>,
    pub synergies: Vec<SynergyMatch>,
    pub skipped: Vec<SkippedInstrument>,
    /// Instruments whose evaluation finished (recommended, no signal, or skipped).
    pub scanned: usize,
    pub no_signal: usize,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn table(&self) -> ResultTable {
        build_table(&self.recommendations, &self.enabled)
    }

    pub fn synergy_table(&self, m: &SynergyMatch) -> ResultTable {
        build_table(&m.recommendations, &self.enabled)
    }

    /// Per-family tables, each priced with its own family's levels. Empty when
    /// every enabled strategy belongs to a single family.
    pub fn family_tables(&self) -> Vec<(StrategyFamily, ResultTable)> {
        let mut families: Vec<StrategyFamily> = Vec::new();
        for id in &self.enabled {
            if !families.contains(&id.family()) {
                families.push(id.family());
            }
        }
        if families.len() < 2 {
            return Vec::new();
        }
        families
            .into_iter()
            .map(|f| (f, build_family_table(&self.recommendations, &self.enabled, f)))
            .collect()
    }
}

/// Per-instrument outcome. `Ok(None)` means evaluated with no satisfied strategy.
pub type InstrumentResult = Result<Option<Recommendation>, SkippedInstrument>;

/// Evaluate one instrument from its raw bars. Pure: no I/O, no shared state.
pub fn evaluate_instrument(
    instrument: &Instrument,
    raw: Vec<OhlcvBar>,
    config: &ScreenConfig,
    registry: &StrategyRegistry,
) -> Result<Option<Recommendation>, ScreenerError> {
    let prepared = prepare_series(instrument, raw, &config.prep_rules(instrument.segment))?;
    let bars = &prepared.bars;

    let frame = IndicatorFrame::compute(bars, config.volume_spike_ratio);
    let ctx = EvalContext::new(bars, &frame);
    let evaluation = evaluate_strategies(
        registry,
        &ctx,
        &config.enabled,
        &config.gate,
        &config.pricing.swing,
    );
    debug!(
        code = %instrument.code,
        bars = bars.len(),
        satisfied = evaluation.flags.count(),
        gate = ?evaluation.gate,
        "instrument evaluated"
    );

    let families = evaluation.flags.families();
    let Some((&lead, rest)) = families.split_first() else {
        return Ok(None);
    };
    let price = |family: StrategyFamily| {
        config
            .pricing
            .levels(family, bars, &frame)
            .map_err(|e| match e {
                ScreenerError::InsufficientHistory { bars, minimum, .. } => {
                    ScreenerError::InsufficientHistory {
                        code: instrument.code.clone(),
                        bars,
                        minimum,
                    }
                }
                other => other,
            })
    };
    let levels = price(lead)?;
    let other_levels = rest
        .iter()
        .map(|&family| price(family))
        .collect::<Result<Vec<_>, _>>()?;

    let (curr, prev) = match bars.as_slice() {
        [.., prev, curr] => (curr, Some(prev)),
        [curr] => (curr, None),
        [] => {
            return Err(ScreenerError::DataUnavailable {
                code: instrument.code.clone(),
                reason: "empty series".into(),
            });
        }
    };

    Ok(Some(Recommendation {
        instrument: instrument.clone(),
        flags: evaluation.flags,
        current_price: curr.close,
        change_pct: prev.map(|p| change_pct(p.close, curr.close)).unwrap_or(0.0),
        levels,
        other_levels,
        as_of: curr.date,
        zone: volume_profile::analyze(bars, &config.volume_profile),
        trading_value: prepared.latest_trading_value(),
    }))
}

/// Fetch with a bounded wait. `timeout_secs == 0` calls the port directly.
///
/// A timed-out fetch keeps running on its own thread; its result is dropped.
pub fn fetch_with_timeout(
    port: &Arc<dyn DataPort>,
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
    timeout_secs: u64,
) -> Result<Vec<OhlcvBar>, ScreenerError> {
    if timeout_secs == 0 {
        return port.fetch_ohlcv(code, start, end);
    }

    let (tx, rx) = mpsc::channel();
    let worker_port = Arc::clone(port);
    let worker_code = code.to_string();
    thread::Builder::new()
        .name(format!("fetch-{}", code))
        .spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = tx.send(worker_port.fetch_ohlcv(&worker_code, start, end));
        })
        .map_err(|e| ScreenerError::Provider {
            code: code.to_string(),
            reason: format!("failed to spawn fetch thread: {}", e),
        })?;

    match rx.recv_timeout(Duration::from_secs(timeout_secs)) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ScreenerError::Timeout {
            code: code.to_string(),
            secs: timeout_secs,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ScreenerError::Provider {
            code: code.to_string(),
            reason: "fetch thread exited without a result".into(),
        }),
    }
}

fn scan_one(
    port: &Arc<dyn DataPort>,
    instrument: &Instrument,
    config: &ScreenConfig,
    registry: &StrategyRegistry,
) -> InstrumentResult {
    let outcome = fetch_with_timeout(
        port,
        &instrument.code,
        config.start_date(),
        config.end_date,
        config.fetch_timeout_secs,
    )
    .and_then(|raw| evaluate_instrument(instrument, raw, config, registry));

    outcome.map_err(|e| {
        let reason = SkipReason::from(&e);
        warn!(code = %instrument.code, name = %instrument.name, %reason, "skipping instrument");
        SkippedInstrument {
            code: instrument.code.clone(),
            reason,
        }
    })
}

/// Scan `universe`, checking `cancel` before each instrument.
///
/// `progress` is called after every finished instrument with
/// `(finished, total, code)`. Cancellation keeps whatever finished before the
/// flag was observed and marks the report `cancelled`.
pub fn run_scan<F>(
    port: Arc<dyn DataPort>,
    universe: &[Instrument],
    config: &ScreenConfig,
    cancel: &AtomicBool,
    progress: F,
) -> Result<ScanReport, ScreenerError>
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    let registry = StrategyRegistry::standard();
    registry.validate()?;

    let total = universe.len();
    let finished = AtomicUsize::new(0);
    info!(
        instruments = total,
        strategy_set = %config.strategy_set,
        start = %config.start_date(),
        end = %config.end_date,
        parallel = config.parallel,
        "scan started"
    );

    let process = |instrument: &Instrument| -> Option<InstrumentResult> {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let result = scan_one(&port, instrument, config, &registry);
        let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
        progress(done, total, &instrument.code);
        Some(result)
    };

    let results: Vec<Option<InstrumentResult>> = if config.parallel {
        universe.par_iter().map(process).collect()
    } else {
        universe.iter().map(process).collect()
    };

    // Join point: everything below sees the complete, scan-ordered result set.
    let mut recommendations = Vec::new();
    let mut skipped = Vec::new();
    let mut no_signal = 0;
    let mut scanned = 0;
    let mut cancelled = false;
    for result in results {
        match result {
            None => cancelled = true,
            Some(Ok(Some(rec))) => {
                scanned += 1;
                recommendations.push(rec);
            }
            Some(Ok(None)) => {
                scanned += 1;
                no_signal += 1;
            }
            Some(Err(skip)) => {
                scanned += 1;
                skipped.push(skip);
            }
        }
    }

    let ranked = rank(recommendations);
    let synergies = aggregate_synergies(&config.synergies, &ranked);

    info!(
        scanned,
        recommended = ranked.len(),
        skipped = skipped.len(),
        no_signal,
        cancelled,
        "scan finished"
    );

    Ok(ScanReport {
        as_of: config.end_date,
        strategy_set: config.strategy_set,
        enabled: config.enabled.clone(),
        recommendations: ranked,
        synergies,
        skipped,
        scanned,
        no_signal,
        cancelled,
    })
}
