//! Named multi-strategy combinations and their table-wide matches.

use crate::domain::error::ScreenerError;
use crate::domain::recommendation::Recommendation;
use crate::domain::strategy::StrategyId;

pub const SYNERGY_SECTION: &str = "synergy";

#[derive(Debug, Clone, PartialEq)]
pub struct SynergyCombo {
    pub name: String,
    pub members: Vec<StrategyId>,
    pub description: String,
}

impl SynergyCombo {
    pub fn new(name: &str, members: &[StrategyId], description: &str) -> Self {
        Self {
            name: name.to_string(),
            members: members.to_vec(),
            description: description.to_string(),
        }
    }

    pub fn is_satisfied_by(&self, rec: &Recommendation) -> bool {
        rec.flags.all_of(&self.members)
    }
}

/// Built-in catalogue used when no `[synergy]` section is configured.
pub fn default_catalogue() -> Vec<SynergyCombo> {
    use StrategyId::*;
    vec![
        SynergyCombo::new(
            "golden_cross_volume",
            &[GoldenCross5x20, VolumeSurge],
            "Short-term golden cross confirmed by a volume surge",
        ),
        SynergyCombo::new(
            "oversold_rebound",
            &[LowerBandRecovery, RsiRebound],
            "Price and momentum both bouncing out of oversold territory",
        ),
        SynergyCombo::new(
            "momentum_confirmation",
            &[MacdCross, ObvRising],
            "MACD turn backed by net accumulation",
        ),
        SynergyCombo::new(
            "trend_breakout",
            &[NewHigh260, VolumeSurge, ObvRising],
            "New 52-week high on heavy, accumulating volume",
        ),
        SynergyCombo::new(
            "long_trend_reclaim",
            &[GoldenCross5x60, Ma60Reclaim],
            "Price and short MA back above the long-term average",
        ),
        SynergyCombo::new(
            "reversal_candle",
            &[NearLowerBand, BullishEngulfing, CciRebound],
            "Engulfing reversal near the lower band with CCI recovering",
        ),
    ]
}

/// Parse one `name = ids | description` entry, e.g. `1,9 | Golden cross with volume`.
pub fn parse_combo(name: &str, value: &str) -> Result<SynergyCombo, ScreenerError> {
    let invalid = |reason: String| ScreenerError::ConfigInvalid {
        section: SYNERGY_SECTION.into(),
        key: name.to_string(),
        reason,
    };

    let (ids, description) = match value.split_once('|') {
        Some((ids, desc)) => (ids, desc.trim()),
        None => (value, ""),
    };

    let members = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .and_then(StrategyId::from_number)
                .ok_or_else(|| invalid(format!("unknown strategy id '{}'", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SynergyCombo {
        name: name.to_string(),
        members,
        description: description.to_string(),
    })
}

/// Combos need 2-3 distinct members, all of them enabled.
pub fn validate_combo(combo: &SynergyCombo, enabled: &[StrategyId]) -> Result<(), ScreenerError> {
    let invalid = |reason: String| ScreenerError::ConfigInvalid {
        section: SYNERGY_SECTION.into(),
        key: combo.name.clone(),
        reason,
    };

    if !(2..=3).contains(&combo.members.len()) {
        return Err(invalid(format!(
            "expected 2-3 strategies, got {}",
            combo.members.len()
        )));
    }
    for (i, id) in combo.members.iter().enumerate() {
        if combo.members[..i].contains(id) {
            return Err(invalid(format!("strategy {} listed twice", id.number())));
        }
        if !enabled.contains(id) {
            return Err(invalid(format!(
                "strategy {} is not enabled in this strategy set",
                id.number()
            )));
        }
    }
    Ok(())
}

/// Resolve the active catalogue: configured entries when present (each validated),
/// otherwise the built-in combos whose members are all enabled.
pub fn resolve_catalogue(
    configured: &[(String, String)],
    enabled: &[StrategyId],
) -> Result<Vec<SynergyCombo>, ScreenerError> {
    if configured.is_empty() {
        return Ok(default_catalogue()
            .into_iter()
            .filter(|c| c.members.iter().all(|id| enabled.contains(id)))
            .collect());
    }
    configured
        .iter()
        .map(|(name, value)| {
            let combo = parse_combo(name, value)?;
            validate_combo(&combo, enabled)?;
            Ok(combo)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynergyMatch {
    pub combo: SynergyCombo,
    /// In ranking order.
    pub recommendations: Vec<Recommendation>,
}

/// For each combo, the ranked records that satisfy every member strategy.
pub fn aggregate_synergies(
    combos: &[SynergyCombo],
    ranked: &[Recommendation],
) -> Vec<SynergyMatch> {
    combos
        .iter()
        .map(|combo| SynergyMatch {
            combo: combo.clone(),
            recommendations: ranked
                .iter()
                .filter(|r| combo.is_satisfied_by(r))
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranker::tests::make_recommendation;
    use crate::domain::strategy::StrategySet;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn default_catalogue_is_valid_for_swing14() {
        let enabled = StrategySet::Swing14.enabled();
        for combo in default_catalogue() {
            assert!(validate_combo(&combo, &enabled).is_ok(), "{}", combo.name);
        }
    }

    #[test]
    fn default_catalogue_filtered_by_enabled_set() {
        let swing8 = resolve_catalogue(&[], &StrategySet::Swing8.enabled()).unwrap();
        let names: Vec<&str> = swing8.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["oversold_rebound"]);
        let bp = resolve_catalogue(&[], &StrategySet::BreakoutPullback.enabled()).unwrap();
        assert!(bp.is_empty());
        let swing14 = resolve_catalogue(&[], &StrategySet::Swing14.enabled()).unwrap();
        assert_eq!(swing14.len(), default_catalogue().len());
    }

    #[test]
    fn parses_config_entry() {
        let combo = parse_combo("golden_volume", " 1, 9 | Golden cross with volume ").unwrap();
        assert_eq!(
            combo.members,
            vec![StrategyId::GoldenCross5x20, StrategyId::VolumeSurge]
        );
        assert_eq!(combo.description, "Golden cross with volume");
    }

    #[test]
    fn rejects_unknown_id() {
        let err = parse_combo("bad", "1,42 | nope").unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { .. }));
    }

    #[test]
    fn rejects_wrong_arity_and_duplicates() {
        let enabled = StrategySet::Swing14.enabled();
        let single = parse_combo("single", "1").unwrap();
        assert!(validate_combo(&single, &enabled).is_err());
        let dup = parse_combo("dup", "4,4").unwrap();
        assert!(validate_combo(&dup, &enabled).is_err());
        let four = parse_combo("four", "1,2,3,4").unwrap();
        assert!(validate_combo(&four, &enabled).is_err());
    }

    #[test]
    fn rejects_disabled_member() {
        let configured = vec![("late".to_string(), "9,14 | late".to_string())];
        assert!(resolve_catalogue(&configured, &StrategySet::Swing8.enabled()).is_err());
    }

    #[test]
    fn matches_keep_ranking_order() {
        let combo = SynergyCombo::new(
            "pair",
            &[StrategyId::MacdCross, StrategyId::ObvRising],
            "",
        );
        let ranked = vec![
            make_recommendation(
                "A",
                &[StrategyId::MacdCross, StrategyId::ObvRising, StrategyId::RsiRebound],
            ),
            make_recommendation("B", &[StrategyId::MacdCross]),
            make_recommendation("C", &[StrategyId::MacdCross, StrategyId::ObvRising]),
        ];
        let matches = aggregate_synergies(&[combo], &ranked);
        let codes: Vec<&str> = matches[0].recommendations.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["A", "C"]);
    }

    proptest! {
        #[test]
        fn combo_matches_are_intersection_of_members(
            flag_sets in prop::collection::vec(prop::collection::vec(any::<bool>(), 4), 0..25),
        ) {
            let pool = [
                StrategyId::GoldenCross5x20,
                StrategyId::VolumeSurge,
                StrategyId::ObvRising,
                StrategyId::MacdCross,
            ];
            let recs: Vec<Recommendation> = flag_sets
                .iter()
                .enumerate()
                .map(|(i, bits)| {
                    let ids: Vec<StrategyId> = pool
                        .iter()
                        .zip(bits)
                        .filter(|(_, on)| **on)
                        .map(|(id, _)| *id)
                        .collect();
                    make_recommendation(&i.to_string(), &ids)
                })
                .collect();
            let combo = SynergyCombo::new("triple", &pool[..3], "");

            let matched: BTreeSet<String> = aggregate_synergies(&[combo.clone()], &recs)[0]
                .recommendations
                .iter()
                .map(|r| r.code().to_string())
                .collect();

            let per_member: Vec<BTreeSet<String>> = combo
                .members
                .iter()
                .map(|id| {
                    recs.iter()
                        .filter(|r| r.flags.get(*id))
                        .map(|r| r.code().to_string())
                        .collect()
                })
                .collect();
            let intersection = per_member
                .iter()
                .skip(1)
                .fold(per_member[0].clone(), |acc, s| acc.intersection(s).cloned().collect());

            prop_assert_eq!(matched, intersection);
        }
    }
}
