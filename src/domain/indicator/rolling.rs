//! Trailing-window extremes and the historical volume-spike flag.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::VecDeque;

/// Rolling maximum of close over the trailing `period` bars (current bar included).
///
/// Monotonic deque: indices whose close can no longer be the window maximum are
/// dropped as soon as a larger-or-equal close arrives, so each bar is pushed and
/// popped at most once.
/// Warmup: first (period-1) bars are invalid.
pub fn calculate_rolling_max(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::RollingMax(period),
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut window: VecDeque<usize> = VecDeque::with_capacity(period);

    for (i, bar) in bars.iter().enumerate() {
        while window.back().is_some_and(|&j| bars[j].close <= bar.close) {
            window.pop_back();
        }
        window.push_back(i);
        while window.front().is_some_and(|&j| j + period <= i) {
            window.pop_front();
        }

        let valid = i + 1 >= period;
        let max = window.front().map(|&j| bars[j].close).unwrap_or(0.0);

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(if valid { max } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::RollingMax(period),
        values,
    }
}

/// True if any bar's volume is at least `ratio` times the previous bar's volume.
///
/// This is a one-off historical flag over the whole window, not a current-bar
/// condition. A zero-volume bar after another zero-volume bar satisfies the
/// inequality and counts.
pub fn has_volume_spike(bars: &[OhlcvBar], ratio: f64) -> bool {
    bars.windows(2)
        .any(|w| w[1].volume as f64 >= ratio * w[0].volume as f64)
}
