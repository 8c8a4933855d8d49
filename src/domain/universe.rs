//! Instrument universe: listing, market-cap and preferred-share filtering.
//!
//! Parses code lists from configuration and narrows the provider's listing to
//! the instruments a scan should visit.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;
use tracing::info;

pub const DEFAULT_MIN_MARKET_CAP: f64 = 100_000_000_000.0;
pub const DEFAULT_PREFERRED_SUFFIXES: [&str; 3] = ["우", "우B", "우C"];

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseFilter {
    pub min_market_cap: f64,
    pub preferred_suffixes: Vec<String>,
    /// Restrict to these codes when set.
    pub codes: Option<Vec<String>>,
    pub max_instruments: Option<usize>,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self {
            min_market_cap: DEFAULT_MIN_MARKET_CAP,
            preferred_suffixes: DEFAULT_PREFERRED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            codes: None,
            max_instruments: None,
        }
    }
}

impl UniverseFilter {
    pub fn accepts(&self, instrument: &Instrument) -> bool {
        let listed = self.codes.as_ref().is_none_or(|codes| {
            codes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&instrument.code))
        });
        listed
            && instrument.market_cap >= self.min_market_cap
            && !instrument.is_preferred_share(&self.preferred_suffixes)
    }
}

/// Apply `filter` keeping listing order, then cap the count.
pub fn filter_universe(instruments: Vec<Instrument>, filter: &UniverseFilter) -> Vec<Instrument> {
    let limit = filter.max_instruments.unwrap_or(usize::MAX);
    instruments
        .into_iter()
        .filter(|i| filter.accepts(i))
        .take(limit)
        .collect()
}

/// Fetch and filter the universe. Failure to list instruments aborts the run.
pub fn load_universe(
    data_port: &dyn DataPort,
    filter: &UniverseFilter,
) -> Result<Vec<Instrument>, ScreenerError> {
    let listed = data_port.list_instruments().map_err(|e| match e {
        ScreenerError::UniverseUnavailable { .. } => e,
        other => ScreenerError::UniverseUnavailable {
            reason: other.to_string(),
        },
    })?;
    let total = listed.len();
    let universe = filter_universe(listed, filter);
    info!(
        listed = total,
        selected = universe.len(),
        "instrument universe loaded"
    );
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::MarketSegment;

    fn instrument(code: &str, name: &str, market_cap: f64) -> Instrument {
        Instrument {
            code: code.into(),
            name: name.into(),
            segment: MarketSegment::Kospi,
            market_cap,
        }
    }

    fn listing() -> Vec<Instrument> {
        vec![
            instrument("005930", "삼성전자", 4.0e14),
            instrument("005935", "삼성전자우", 3.0e13),
            instrument("123456", "작은회사", 5.0e10),
            instrument("000660", "SK하이닉스", 1.0e14),
            instrument("035720", "카카오", 2.0e13),
        ]
    }

    #[test]
    fn parse_single_code() {
        let codes = parse_codes("005930").unwrap();
        assert_eq!(codes, vec!["005930"]);
    }

    #[test]
    fn parse_trims_and_uppercases() {
        let codes = parse_codes(" a1 , b2 ").unwrap();
        assert_eq!(codes, vec!["A1", "B2"]);
    }

    #[test]
    fn parse_empty_token_error() {
        assert!(matches!(
            parse_codes("005930,,000660"),
            Err(UniverseError::EmptyToken)
        ));
    }

    #[test]
    fn parse_duplicate_error() {
        let err = parse_codes("005930,005930").unwrap_err();
        assert!(matches!(err, UniverseError::DuplicateCode(ref c) if c == "005930"));
    }

    #[test]
    fn filter_drops_small_caps_and_preferred_shares() {
        let universe = filter_universe(listing(), &UniverseFilter::default());
        let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["005930", "000660", "035720"]);
    }

    #[test]
    fn filter_restricts_to_codes() {
        let filter = UniverseFilter {
            codes: Some(vec!["035720".into(), "123456".into()]),
            ..UniverseFilter::default()
        };
        let universe = filter_universe(listing(), &filter);
        assert_eq!(universe.len(), 1);
        assert_eq!(universe[0].code, "035720");
    }

    #[test]
    fn filter_caps_count_in_listing_order() {
        let filter = UniverseFilter {
            max_instruments: Some(2),
            ..UniverseFilter::default()
        };
        let universe = filter_universe(listing(), &filter);
        let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["005930", "000660"]);
    }
}
