//! Derived summaries consumed by the display surface
//!
//! Everything here is a pure fold over observation rows with a deterministic
//! output order; nothing caches or mutates.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::signal::Observation;

/// Mean of the present composite scores, `None` when no row has one.
pub fn mean_composite(rows: &[Observation]) -> Option<f64> {
    let scored: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.composite_risk_score)
        .collect();
    if scored.is_empty() {
        return None;
    }
    Some(scored.iter().sum::<f64>() / scored.len() as f64)
}

/// Per-commodity mean composite over scored rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityRisk {
    pub commodity: String,
    pub mean_composite: f64,
    pub observations: usize,
}

/// Mean composite per commodity, ordered mean descending then name ascending.
///
/// Rows with a missing composite do not contribute; commodities with no
/// scored rows are omitted.
pub fn mean_composite_by_commodity(rows: &[Observation]) -> Vec<CommodityRisk> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        if let Some(composite) = row.composite_risk_score {
            let entry = totals.entry(row.commodity.as_str()).or_insert((0.0, 0));
            entry.0 += composite;
            entry.1 += 1;
        }
    }

    let mut summary: Vec<CommodityRisk> = totals
        .into_iter()
        .map(|(commodity, (sum, count))| CommodityRisk {
            commodity: commodity.to_string(),
            mean_composite: sum / count as f64,
            observations: count,
        })
        .collect();
    summary.sort_by(|a, b| {
        b.mean_composite
            .partial_cmp(&a.mean_composite)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.commodity.cmp(&b.commodity))
    });
    summary
}

/// Latest-dated row per commodity x market, ordered by commodity then market.
///
/// Among rows sharing the same date the later occurrence in the batch wins.
pub fn latest_observations(rows: &[Observation]) -> Vec<Observation> {
    let mut latest: HashMap<(&str, &str), &Observation> = HashMap::new();
    for row in rows {
        let key = (row.commodity.as_str(), row.market.as_str());
        match latest.get(&key) {
            Some(existing) if existing.date > row.date => {}
            _ => {
                latest.insert(key, row);
            }
        }
    }

    let mut out: Vec<Observation> = latest.into_values().cloned().collect();
    out.sort_by(|a, b| {
        a.commodity
            .cmp(&b.commodity)
            .then_with(|| a.market.cmp(&b.market))
    });
    out
}

/// Latest-dated row for one commodity across all of its markets.
pub fn latest_for_commodity<'a>(
    rows: &'a [Observation],
    commodity: &str,
) -> Option<&'a Observation> {
    rows.iter()
        .filter(|row| row.commodity == commodity)
        .max_by(|a, b| a.date.cmp(&b.date))
}

/// Unique commodity names, ascending.
pub fn commodities(rows: &[Observation]) -> Vec<String> {
    rows.iter()
        .map(|row| row.commodity.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Projected 14-day composite band: `[max(0, c - 6), min(100, c + 10)]`.
pub fn risk_band_14d(composite: f64) -> (f64, f64) {
    ((composite - 6.0).max(0.0), (composite + 10.0).min(100.0))
}

/// One row of the scenario outlook table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioCase {
    pub name: &'static str,
    pub probability: f64,
    pub projected_composite: f64,
}

/// Best/Base/Worst outlook derived from the current composite.
pub fn scenario_outlook(composite: f64) -> [ScenarioCase; 3] {
    [
        scenario_case("Best", 0.20, composite - 10.0),
        scenario_case("Base", 0.55, composite + 2.0),
        scenario_case("Worst", 0.25, composite + 14.0),
    ]
}

fn scenario_case(name: &'static str, probability: f64, projected: f64) -> ScenarioCase {
    ScenarioCase {
        name,
        probability,
        projected_composite: projected.clamp(0.0, 100.0),
    }
}
