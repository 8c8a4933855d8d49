//! Configuration validation.
//!
//! Validates every recognised field before any market data is touched.

use crate::domain::error::ScreenerError;
use crate::domain::strategy::StrategySet;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const MIN_LOOKBACK_DAYS: i64 = 60;
pub const MAX_LOOKBACK_DAYS: i64 = 180;

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_universe(config)?;
    validate_liquidity(config)?;
    validate_scan(config)?;
    validate_thresholds(config)?;
    validate_pricing(config)?;
    validate_volume_profile(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_double("universe", "min_market_cap", 0.0) < 0.0 {
        return Err(invalid(
            "universe",
            "min_market_cap",
            "min_market_cap must be non-negative",
        ));
    }
    if config.get_string("universe", "max_instruments").is_some()
        && config.get_int("universe", "max_instruments", 0) < 1
    {
        return Err(invalid(
            "universe",
            "max_instruments",
            "max_instruments must be at least 1",
        ));
    }
    if let Some(codes) = config.get_string("universe", "codes") {
        parse_codes(&codes).map_err(|e| invalid("universe", "codes", &e.to_string()))?;
    }
    Ok(())
}

fn validate_liquidity(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for key in [
        "min_trading_value_kospi",
        "min_trading_value_kosdaq",
        "min_trading_value_konex",
    ] {
        if config.get_double("liquidity", key, 0.0) < 0.0 {
            return Err(invalid("liquidity", key, "trading value must be non-negative"));
        }
    }
    Ok(())
}

fn validate_scan(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(set) = config.get_string("scan", "strategy_set") {
        set.parse::<StrategySet>()
            .map_err(|reason| invalid("scan", "strategy_set", &reason))?;
    }

    let lookback = config.get_int("scan", "lookback_days", MIN_LOOKBACK_DAYS);
    if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&lookback) {
        return Err(invalid(
            "scan",
            "lookback_days",
            "lookback_days must be between 60 and 180",
        ));
    }

    if config.get_int("scan", "min_bars", 2) < 2 {
        return Err(invalid("scan", "min_bars", "min_bars must be at least 2"));
    }

    if config.get_int("scan", "fetch_timeout_secs", 0) < 0 {
        return Err(invalid(
            "scan",
            "fetch_timeout_secs",
            "fetch_timeout_secs must be non-negative",
        ));
    }

    if let Some(date) = config.get_string("scan", "end_date") {
        parse_date(&date, "end_date")?;
    }
    Ok(())
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ScreenerError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "scan",
            field,
            &format!("invalid {} format, expected YYYY-MM-DD", field),
        )
    })
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let entry = config.get_double("thresholds", "entry_proximity", 0.02);
    if entry <= 0.0 || entry >= 1.0 {
        return Err(invalid(
            "thresholds",
            "entry_proximity",
            "entry_proximity must be between 0 and 1",
        ));
    }
    let upper = config.get_double("thresholds", "upper_band_proximity", 0.05);
    if !(0.0..1.0).contains(&upper) {
        return Err(invalid(
            "thresholds",
            "upper_band_proximity",
            "upper_band_proximity must be between 0 and 1",
        ));
    }
    if config.get_double("thresholds", "volume_spike_ratio", 3.0) < 1.0 {
        return Err(invalid(
            "thresholds",
            "volume_spike_ratio",
            "volume_spike_ratio must be at least 1",
        ));
    }
    if config.get_int("thresholds", "halt_window", 3) < 1 {
        return Err(invalid(
            "thresholds",
            "halt_window",
            "halt_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_pricing(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let offset = config.get_double("pricing", "swing_entry_offset", -0.005);
    if offset <= -1.0 || offset >= 1.0 {
        return Err(invalid(
            "pricing",
            "swing_entry_offset",
            "swing_entry_offset must be between -1 and 1",
        ));
    }
    for key in [
        "swing_stop",
        "swing_target",
        "breakout_entry",
        "breakout_stop",
        "breakout_target",
        "pullback_entry",
        "pullback_stop",
    ] {
        if config.get_double("pricing", key, 1.0) <= 0.0 {
            return Err(invalid("pricing", key, "price multiplier must be positive"));
        }
    }
    Ok(())
}

fn validate_volume_profile(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_int("volume_profile", "window", 30) < 2 {
        return Err(invalid(
            "volume_profile",
            "window",
            "window must be at least 2",
        ));
    }
    if config.get_int("volume_profile", "bins", 10) < 1 {
        return Err(invalid("volume_profile", "bins", "bins must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(content: &str, expected_key: &str) {
        let err = validate_screen_config(&make_config(content)).unwrap_err();
        assert!(
            matches!(&err, ScreenerError::ConfigInvalid { key, .. } if key == expected_key),
            "expected invalid {expected_key}, got {err:?}"
        );
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_screen_config(&make_config("")).is_ok());
    }

    #[test]
    fn full_config_passes() {
        let config = make_config(
            r#"
[universe]
min_market_cap = 100000000000
preferred_suffixes = 우,우B,우C
codes = 005930,000660
max_instruments = 500

[liquidity]
min_trading_value_kospi = 5000000000
min_trading_value_kosdaq = 3000000000

[scan]
strategy_set = swing14
lookback_days = 180
min_bars = 60
fetch_timeout_secs = 10
end_date = 2024-06-28

[thresholds]
entry_proximity = 0.02
upper_band_proximity = 0.05

[pricing]
swing_entry_offset = -0.005
swing_stop = 0.95

[volume_profile]
window = 30
bins = 10
"#,
        );
        assert!(validate_screen_config(&config).is_ok());
    }

    #[test]
    fn negative_market_cap_fails() {
        assert_invalid("[universe]\nmin_market_cap = -1\n", "min_market_cap");
    }

    #[test]
    fn zero_max_instruments_fails() {
        assert_invalid("[universe]\nmax_instruments = 0\n", "max_instruments");
    }

    #[test]
    fn duplicate_codes_fail() {
        assert_invalid("[universe]\ncodes = 005930,005930\n", "codes");
    }

    #[test]
    fn negative_trading_value_fails() {
        assert_invalid(
            "[liquidity]\nmin_trading_value_kosdaq = -5\n",
            "min_trading_value_kosdaq",
        );
    }

    #[test]
    fn unknown_strategy_set_fails() {
        assert_invalid("[scan]\nstrategy_set = scalping\n", "strategy_set");
    }

    #[test]
    fn lookback_out_of_range_fails() {
        assert_invalid("[scan]\nlookback_days = 30\n", "lookback_days");
        assert_invalid("[scan]\nlookback_days = 365\n", "lookback_days");
    }

    #[test]
    fn tiny_min_bars_fails() {
        assert_invalid("[scan]\nmin_bars = 1\n", "min_bars");
    }

    #[test]
    fn bad_end_date_fails() {
        assert_invalid("[scan]\nend_date = 2024/06/28\n", "end_date");
    }

    #[test]
    fn entry_proximity_out_of_range_fails() {
        assert_invalid("[thresholds]\nentry_proximity = 0\n", "entry_proximity");
    }

    #[test]
    fn spike_ratio_below_one_fails() {
        assert_invalid("[thresholds]\nvolume_spike_ratio = 0.5\n", "volume_spike_ratio");
    }

    #[test]
    fn zero_multiplier_fails() {
        assert_invalid("[pricing]\nbreakout_target = 0\n", "breakout_target");
    }

    #[test]
    fn zero_bins_fails() {
        assert_invalid("[volume_profile]\nbins = 0\n", "bins");
    }
}
