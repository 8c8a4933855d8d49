//! Table-wide ranking and result-table assembly.

use crate::domain::display::{format_krw, format_pct, format_price};
use crate::domain::pricing::PriceLevels;
use crate::domain::recommendation::Recommendation;
use crate::domain::strategy::{StrategyFamily, StrategyId};

/// Identity and price columns, before the per-strategy flag columns.
pub const IDENTITY_COLUMNS: [&str; 12] = [
    "Code",
    "Name",
    "Market",
    "Price",
    "Change",
    "Entry",
    "Stop",
    "Target",
    "Date",
    "Zone",
    "Trading value",
    "Count",
];

/// Keep records with at least one satisfied strategy, ordered by satisfied count
/// descending. Equal counts keep their input order.
pub fn rank(recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = recommendations
        .into_iter()
        .filter(|r| r.satisfied_count() > 0)
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.satisfied_count().cmp(&a.satisfied_count()));
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column headers: identity first, then one column per enabled strategy in catalogue order.
pub fn table_columns(enabled: &[StrategyId]) -> Vec<String> {
    IDENTITY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(catalogue_order(enabled).map(|id| id.label().to_string()))
        .collect()
}

pub fn table_row(rec: &Recommendation, enabled: &[StrategyId]) -> Vec<String> {
    priced_row(rec, &rec.levels, enabled)
}

fn priced_row(rec: &Recommendation, levels: &PriceLevels, enabled: &[StrategyId]) -> Vec<String> {
    let zone = rec
        .zone
        .as_ref()
        .map(|z| z.position.to_string())
        .unwrap_or_default();
    let mut row = vec![
        rec.instrument.code.clone(),
        rec.instrument.name.clone(),
        rec.instrument.segment.to_string(),
        format_price(rec.current_price),
        format_pct(rec.change_pct),
        format_price(levels.entry),
        format_price(levels.stop_loss),
        format_price(levels.target),
        levels.reference_date.format("%Y-%m-%d").to_string(),
        zone,
        format_krw(rec.trading_value),
        rec.satisfied_count().to_string(),
    ];
    row.extend(catalogue_order(enabled).map(|id| {
        if rec.flags.get(id) {
            "O".to_string()
        } else {
            String::new()
        }
    }));
    row
}

/// Assemble the display table for already-ranked records.
pub fn build_table(ranked: &[Recommendation], enabled: &[StrategyId]) -> ResultTable {
    ResultTable {
        columns: table_columns(enabled),
        rows: ranked.iter().map(|r| table_row(r, enabled)).collect(),
    }
}

/// One table per pricing family: every ranked record with a satisfied strategy of
/// `family`, priced with that family's levels and showing only its strategies.
pub fn build_family_table(
    ranked: &[Recommendation],
    enabled: &[StrategyId],
    family: StrategyFamily,
) -> ResultTable {
    let members: Vec<StrategyId> = enabled
        .iter()
        .copied()
        .filter(|id| id.family() == family)
        .collect();
    ResultTable {
        columns: table_columns(&members),
        rows: ranked
            .iter()
            .filter_map(|r| r.levels_for(family).map(|levels| priced_row(r, levels, &members)))
            .collect(),
    }
}

fn catalogue_order(enabled: &[StrategyId]) -> impl Iterator<Item = StrategyId> + '_ {
    StrategyId::ALL
        .into_iter()
        .filter(move |id| enabled.contains(id))
}
