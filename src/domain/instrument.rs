//! Tradable instrument metadata.

use std::fmt;
use std::str::FromStr;

/// Market segment an instrument is listed on. Selects the liquidity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketSegment {
    Kospi,
    Kosdaq,
    Konex,
}

impl MarketSegment {
    pub const ALL: [MarketSegment; 3] = [
        MarketSegment::Kospi,
        MarketSegment::Kosdaq,
        MarketSegment::Konex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSegment::Kospi => "KOSPI",
            MarketSegment::Kosdaq => "KOSDAQ",
            MarketSegment::Konex => "KONEX",
        }
    }
}

impl fmt::Display for MarketSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown market segment: {0}")]
pub struct UnknownSegment(pub String);

impl FromStr for MarketSegment {
    type Err = UnknownSegment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KOSPI" => Ok(MarketSegment::Kospi),
            "KOSDAQ" => Ok(MarketSegment::Kosdaq),
            "KONEX" => Ok(MarketSegment::Konex),
            other => Err(UnknownSegment(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub code: String,
    pub name: String,
    pub segment: MarketSegment,
    pub market_cap: f64,
}

impl Instrument {
    /// True when the display name ends with one of the preferred-share suffixes.
    pub fn is_preferred_share(&self, suffixes: &[String]) -> bool {
        let name = self.name.trim();
        suffixes
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| name.ends_with(s.as_str()))
    }
}
