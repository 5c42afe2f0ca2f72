//! Score normalization pass
//!
//! Global invariants enforced:
//! - After normalization: driver scores and composite in [0, 100], confidence in [0, 1]
//! - A supplied composite is kept; only missing composites are derived
//! - `main_driver` is always recomputed, never trusted from input
//! - Pure and idempotent: normalize(normalize(x)) == normalize(x)

use crate::risk::{composite_score, dominant_driver, DriverWeights};
use crate::signal::Observation;

/// Normalize a batch of observation rows.
///
/// Derivation runs on the raw values; clamping is applied afterwards, and
/// `main_driver` is derived from the clamped scores so repeated passes see
/// identical inputs.
pub fn normalize(rows: &[Observation], weights: &DriverWeights) -> Vec<Observation> {
    rows.iter().map(|row| normalize_row(row, weights)).collect()
}

fn normalize_row(row: &Observation, weights: &DriverWeights) -> Observation {
    let mut out = row.clone();

    if out.composite_risk_score.is_none() {
        out.composite_risk_score = composite_score(&out, weights);
    }

    out.supply_risk_score = clamp_score(out.supply_risk_score);
    out.logistics_risk_score = clamp_score(out.logistics_risk_score);
    out.climate_risk_score = clamp_score(out.climate_risk_score);
    out.geopolitical_risk_score = clamp_score(out.geopolitical_risk_score);
    out.composite_risk_score = clamp_score(out.composite_risk_score);
    out.confidence = clamp_unit(out.confidence);

    out.main_driver = dominant_driver(&out);
    out
}

fn clamp_score(value: Option<f64>) -> Option<f64> {
    value.map(|v| v.clamp(0.0, 100.0))
}

fn clamp_unit(value: Option<f64>) -> Option<f64> {
    value.map(|v| v.clamp(0.0, 1.0))
}
