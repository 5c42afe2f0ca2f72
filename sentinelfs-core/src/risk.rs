//! Composite risk scoring and severity banding
//!
//! Global invariants enforced:
//! - Deterministic scoring: same inputs always produce the same composite
//! - Missing driver inputs propagate as missing, never as zero

use serde::{Deserialize, Serialize};

use crate::signal::{Driver, Observation};

/// Severity banding of a composite risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,      // < 50
    Medium,   // 50-70
    High,     // 70-85
    Critical, // >= 85
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

/// Label for an optional severity, "unknown" when the composite was missing.
pub fn severity_label(severity: Option<Severity>) -> &'static str {
    match severity {
        Some(severity) => severity.as_str(),
        None => "unknown",
    }
}

/// Configurable weights for the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverWeights {
    pub supply: f64,
    pub logistics: f64,
    pub climate: f64,
    pub geopolitical: f64,
}

impl Default for DriverWeights {
    fn default() -> Self {
        DriverWeights {
            supply: 0.35,
            logistics: 0.25,
            climate: 0.20,
            geopolitical: 0.20,
        }
    }
}

/// Configurable severity band thresholds (lower edge of each band)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub medium_min: f64,
    pub high_min: f64,
    pub critical_min: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        SeverityThresholds {
            medium_min: 50.0,
            high_min: 70.0,
            critical_min: 85.0,
        }
    }
}

/// Configurable alert trigger cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerRules {
    /// Composite score at or above which a row alerts.
    pub composite_min: f64,
    /// Absolute 7-day change (percentage points) at or above which a row alerts.
    pub price_move_min: f64,
}

impl Default for TriggerRules {
    fn default() -> Self {
        TriggerRules {
            composite_min: 70.0,
            price_move_min: 10.0,
        }
    }
}

/// Weighted composite of the four driver scores
///
/// Formula (default weights):
/// composite = 0.35 * supply + 0.25 * logistics + 0.20 * climate + 0.20 * geopolitical
///
/// Returns `None` if any driver score is missing.
pub fn composite_score(observation: &Observation, weights: &DriverWeights) -> Option<f64> {
    let supply = observation.supply_risk_score?;
    let logistics = observation.logistics_risk_score?;
    let climate = observation.climate_risk_score?;
    let geopolitical = observation.geopolitical_risk_score?;
    Some(
        weights.supply * supply
            + weights.logistics * logistics
            + weights.climate * climate
            + weights.geopolitical * geopolitical,
    )
}

/// Driver with the maximal score, ties broken by declaration order
///
/// Missing scores are skipped; `None` only when all four are missing.
pub fn dominant_driver(observation: &Observation) -> Option<Driver> {
    let mut best: Option<(Driver, f64)> = None;
    for driver in Driver::PRIORITY {
        if let Some(score) = observation.driver_score(driver) {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((driver, score)),
            }
        }
    }
    best.map(|(driver, _)| driver)
}

/// Assign severity band with default thresholds
pub fn severity_for_composite(composite: f64) -> Severity {
    severity_with_thresholds(composite, &SeverityThresholds::default())
}

/// Assign severity band with custom thresholds
pub fn severity_with_thresholds(composite: f64, thresholds: &SeverityThresholds) -> Severity {
    if composite < thresholds.medium_min {
        Severity::Low
    } else if composite < thresholds.high_min {
        Severity::Medium
    } else if composite < thresholds.critical_min {
        Severity::High
    } else {
        Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_observation(
        supply: Option<f64>,
        logistics: Option<f64>,
        climate: Option<f64>,
        geopolitical: Option<f64>,
    ) -> Observation {
        Observation {
            commodity: "Wheat".to_string(),
            market: "CBOT".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            price: Some(100.0),
            chg_7d: Some(0.0),
            chg_30d: Some(0.0),
            supply_risk_score: supply,
            logistics_risk_score: logistics,
            climate_risk_score: climate,
            geopolitical_risk_score: geopolitical,
            composite_risk_score: None,
            main_driver: None,
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_composite_score_default_weights() {
        let observation =
            create_test_observation(Some(80.0), Some(60.0), Some(40.0), Some(20.0));
        let composite = composite_score(&observation, &DriverWeights::default()).unwrap();

        // 0.35 * 80 + 0.25 * 60 + 0.20 * 40 + 0.20 * 20 = 28 + 15 + 8 + 4
        assert!((composite - 55.0).abs() < 1e-9, "unexpected composite: {composite}");
    }

    #[test]
    fn test_composite_score_equal_drivers() {
        let observation =
            create_test_observation(Some(50.0), Some(50.0), Some(50.0), Some(50.0));
        let composite = composite_score(&observation, &DriverWeights::default()).unwrap();

        // Default weights sum to 1.0, so equal drivers pass through.
        assert!((composite - 50.0).abs() < 1e-9, "unexpected composite: {composite}");
    }

    #[test]
    fn test_composite_score_missing_driver_propagates() {
        let observation = create_test_observation(Some(80.0), None, Some(40.0), Some(20.0));
        assert_eq!(composite_score(&observation, &DriverWeights::default()), None);
    }

    #[test]
    fn test_dominant_driver_picks_max() {
        let observation =
            create_test_observation(Some(10.0), Some(70.0), Some(40.0), Some(20.0));
        assert_eq!(dominant_driver(&observation), Some(Driver::Logistics));
    }

    #[test]
    fn test_dominant_driver_tie_break_priority() {
        let observation =
            create_test_observation(Some(60.0), Some(60.0), Some(60.0), Some(60.0));
        assert_eq!(dominant_driver(&observation), Some(Driver::Supply));

        let observation =
            create_test_observation(Some(10.0), Some(60.0), Some(60.0), Some(60.0));
        assert_eq!(dominant_driver(&observation), Some(Driver::Logistics));

        let observation = create_test_observation(Some(10.0), Some(20.0), Some(60.0), Some(60.0));
        assert_eq!(dominant_driver(&observation), Some(Driver::Climate));
    }

    #[test]
    fn test_dominant_driver_skips_missing() {
        let observation = create_test_observation(None, Some(30.0), None, Some(55.0));
        assert_eq!(dominant_driver(&observation), Some(Driver::Geopolitical));
    }

    #[test]
    fn test_dominant_driver_all_missing() {
        let observation = create_test_observation(None, None, None, None);
        assert_eq!(dominant_driver(&observation), None);
    }

    #[test]
    fn test_severity_band_boundaries() {
        assert_eq!(severity_for_composite(49.9), Severity::Low);
        assert_eq!(severity_for_composite(50.0), Severity::Medium);
        assert_eq!(severity_for_composite(69.9), Severity::Medium);
        assert_eq!(severity_for_composite(70.0), Severity::High);
        assert_eq!(severity_for_composite(84.9), Severity::High);
        assert_eq!(severity_for_composite(85.0), Severity::Critical);
    }

    #[test]
    fn test_severity_band_extremes() {
        assert_eq!(severity_for_composite(0.0), Severity::Low);
        assert_eq!(severity_for_composite(100.0), Severity::Critical);
    }

    #[test]
    fn test_severity_custom_thresholds() {
        let thresholds = SeverityThresholds {
            medium_min: 20.0,
            high_min: 40.0,
            critical_min: 60.0,
        };
        assert_eq!(severity_with_thresholds(30.0, &thresholds), Severity::Medium);
        assert_eq!(severity_with_thresholds(60.0, &thresholds), Severity::Critical);
    }

    #[test]
    fn test_severity_label_unknown_for_missing() {
        assert_eq!(severity_label(Some(Severity::High)), "High");
        assert_eq!(severity_label(None), "unknown");
    }

    #[test]
    fn test_default_weights_match_documented_formula() {
        let weights = DriverWeights::default();
        assert_eq!(weights.supply, 0.35);
        assert_eq!(weights.logistics, 0.25);
        assert_eq!(weights.climate, 0.20);
        assert_eq!(weights.geopolitical, 0.20);
    }
}
