//! Disruption scenario: shock a commodity's logistics and geopolitical risk
//!
//! The applier never writes scores directly into the live signal set; it
//! produces a new normalized batch and callers decide what replaces what.

use crate::normalize::normalize;
use crate::risk::DriverWeights;
use crate::signal::Observation;

/// Added to `logistics_risk_score` on shocked rows, before clamping.
pub const LOGISTICS_SHOCK: f64 = 20.0;
/// Added to `geopolitical_risk_score` on shocked rows, before clamping.
pub const GEOPOLITICAL_SHOCK: f64 = 15.0;
/// Added to `chg_7d` on shocked rows.
pub const PRICE_SHOCK_7D: f64 = 8.0;

/// Apply the disruption scenario to every row of one commodity.
///
/// Shocked rows get their composite cleared so the normalization pass
/// re-derives composite and main_driver from the shocked driver scores.
/// Rows for other commodities pass through unchanged.
pub fn apply_shock(
    rows: &[Observation],
    commodity: &str,
    weights: &DriverWeights,
) -> Vec<Observation> {
    let shocked: Vec<Observation> = rows
        .iter()
        .map(|row| {
            if row.commodity != commodity {
                return row.clone();
            }
            let mut out = row.clone();
            out.logistics_risk_score = out.logistics_risk_score.map(|v| v + LOGISTICS_SHOCK);
            out.geopolitical_risk_score =
                out.geopolitical_risk_score.map(|v| v + GEOPOLITICAL_SHOCK);
            out.chg_7d = out.chg_7d.map(|v| v + PRICE_SHOCK_7D);
            out.composite_risk_score = None;
            out
        })
        .collect();
    normalize(&shocked, weights)
}
