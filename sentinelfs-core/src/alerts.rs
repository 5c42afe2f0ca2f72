//! Alert generation: trigger evaluation and deterministic ranking
//!
//! Alerts are a stateless view over normalized observations: recomputed from
//! the current signal set on every call, never cached across mutations.

use std::cmp::Ordering;

use serde::Serialize;

use crate::risk::{severity_with_thresholds, Severity, SeverityThresholds, TriggerRules};
use crate::signal::Observation;

/// An observation promoted by one or both trigger rules.
///
/// `severity` is `None` when the composite score itself is missing; such rows
/// can still alert on the price-move trigger.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    #[serde(flatten)]
    pub observation: Observation,
    pub severity: Option<Severity>,
    pub trigger_reason: String,
}

/// Generate ranked alerts with default thresholds and triggers
pub fn generate_alerts(rows: &[Observation]) -> Vec<Alert> {
    generate_alerts_with_rules(
        rows,
        &SeverityThresholds::default(),
        &TriggerRules::default(),
    )
}

/// Generate ranked alerts with custom thresholds and triggers
///
/// A row alerts iff composite >= `triggers.composite_min` or
/// |chg_7d| >= `triggers.price_move_min`. Missing values never satisfy a
/// trigger.
pub fn generate_alerts_with_rules(
    rows: &[Observation],
    thresholds: &SeverityThresholds,
    triggers: &TriggerRules,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = rows
        .iter()
        .filter_map(|row| {
            let composite_hit = row
                .composite_risk_score
                .is_some_and(|c| c >= triggers.composite_min);
            let price_hit = row
                .chg_7d
                .is_some_and(|chg| chg.abs() >= triggers.price_move_min);
            let trigger_reason = trigger_reason(composite_hit, price_hit, triggers)?;
            Some(Alert {
                severity: row
                    .composite_risk_score
                    .map(|c| severity_with_thresholds(c, thresholds)),
                trigger_reason,
                observation: row.clone(),
            })
        })
        .collect();
    sort_alerts(&mut alerts);
    alerts
}

fn trigger_reason(
    composite_hit: bool,
    price_hit: bool,
    triggers: &TriggerRules,
) -> Option<String> {
    match (composite_hit, price_hit) {
        (true, true) => Some(format!(
            "Composite >= {} AND |7D change| >= {}",
            triggers.composite_min, triggers.price_move_min
        )),
        (true, false) => Some(format!("Composite >= {}", triggers.composite_min)),
        (false, true) => Some(format!("|7D change| >= {}", triggers.price_move_min)),
        (false, false) => None,
    }
}

/// Sort alerts by composite descending, then chg_7d descending, then
/// commodity, market, and date ascending. Missing values sort last within
/// their key.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        cmp_option_desc(
            a.observation.composite_risk_score,
            b.observation.composite_risk_score,
        )
        .then_with(|| cmp_option_desc(a.observation.chg_7d, b.observation.chg_7d))
        .then_with(|| a.observation.commodity.cmp(&b.observation.commodity))
        .then_with(|| a.observation.market.cmp(&b.observation.market))
        .then_with(|| a.observation.date.cmp(&b.observation.date))
    });
}

fn cmp_option_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
