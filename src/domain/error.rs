//! Domain error types and per-instrument skip reasons.

use std::fmt;

/// Top-level error type for the screener.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("no data for {code}: {reason}")]
    DataUnavailable { code: String, reason: String },

    #[error("insufficient history for {code}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("trading value for {code} is {value:.0}, below minimum {minimum:.0}")]
    LowTradingValue {
        code: String,
        value: f64,
        minimum: f64,
    },

    #[error("indicator {indicator} undefined at bar {index}")]
    IndicatorUndefined { indicator: String, index: usize },

    #[error("provider error for {code}: {reason}")]
    Provider { code: String, reason: String },

    #[error("fetch for {code} timed out after {secs}s")]
    Timeout { code: String, secs: u64 },

    #[error("instrument universe unavailable: {reason}")]
    UniverseUnavailable { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::UniverseUnavailable { .. } | ScreenerError::Provider { .. } => 3,
            ScreenerError::IndicatorUndefined { .. } => 4,
            ScreenerError::DataUnavailable { .. }
            | ScreenerError::InsufficientHistory { .. }
            | ScreenerError::LowTradingValue { .. }
            | ScreenerError::Timeout { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Why an instrument produced no evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    Halted,
    InsufficientBars { bars: usize, minimum: usize },
    LowTradingValue { value: f64, minimum: f64 },
    IndicatorUndefined { indicator: String },
    ProviderError { reason: String },
    Timeout,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::Halted => write!(f, "trading halted (zero trailing volume)"),
            SkipReason::InsufficientBars { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::LowTradingValue { value, minimum } => {
                write!(f, "trading value {:.0} below {:.0}", value, minimum)
            }
            SkipReason::IndicatorUndefined { indicator } => {
                write!(f, "{} undefined", indicator)
            }
            SkipReason::ProviderError { reason } => write!(f, "provider error: {}", reason),
            SkipReason::Timeout => write!(f, "fetch timed out"),
        }
    }
}

impl From<&ScreenerError> for SkipReason {
    fn from(err: &ScreenerError) -> Self {
        match err {
            ScreenerError::DataUnavailable { reason, .. } if reason == HALTED_REASON => {
                SkipReason::Halted
            }
            ScreenerError::DataUnavailable { .. } => SkipReason::NoData,
            ScreenerError::InsufficientHistory { bars, minimum, .. } => {
                SkipReason::InsufficientBars {
                    bars: *bars,
                    minimum: *minimum,
                }
            }
            ScreenerError::LowTradingValue { value, minimum, .. } => SkipReason::LowTradingValue {
                value: *value,
                minimum: *minimum,
            },
            ScreenerError::IndicatorUndefined { indicator, .. } => SkipReason::IndicatorUndefined {
                indicator: indicator.clone(),
            },
            ScreenerError::Timeout { .. } => SkipReason::Timeout,
            other => SkipReason::ProviderError {
                reason: other.to_string(),
            },
        }
    }
}

/// Reason string carried by `DataUnavailable` when the trailing volume is zero.
pub const HALTED_REASON: &str = "zero trailing volume";

/// An instrument that was dropped from the scan, with the classified cause.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub code: String,
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn halted_data_maps_to_halted_reason() {
        let err = ScreenerError::DataUnavailable {
            code: "000660".into(),
            reason: HALTED_REASON.into(),
        };
        assert_eq!(SkipReason::from(&err), SkipReason::Halted);
    }

    #[test]
    fn empty_data_maps_to_no_data() {
        let err = ScreenerError::DataUnavailable {
            code: "000660".into(),
            reason: "empty series".into(),
        };
        assert_eq!(SkipReason::from(&err), SkipReason::NoData);
    }

    #[test]
    fn provider_error_keeps_cause() {
        let err = ScreenerError::Provider {
            code: "035420".into(),
            reason: "connection reset".into(),
        };
        match SkipReason::from(&err) {
            SkipReason::ProviderError { reason } => assert!(reason.contains("connection reset")),
            other => panic!("unexpected reason {:?}", other),
        }
    }

    #[test]
    fn insufficient_history_message() {
        let err = ScreenerError::InsufficientHistory {
            code: "005930".into(),
            bars: 12,
            minimum: 20,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for 005930: have 12 bars, need 20"
        );
    }

    #[test]
    fn config_errors_exit_with_two() {
        let err = ScreenerError::ConfigMissing {
            section: "scan".into(),
            key: "strategy_set".into(),
        };
        assert_eq!(ExitCode::from(&err), ExitCode::from(2));
    }

    #[test]
    fn skip_reason_display() {
        let reason = SkipReason::InsufficientBars {
            bars: 10,
            minimum: 60,
        };
        assert_eq!(reason.to_string(), "only 10 bars, minimum 60 required");
    }
}
