//! Observation rows and risk drivers
//!
//! Global invariants enforced:
//! - Numeric fields use `Option<f64>`; `None` is the missing marker produced
//!   by lenient coercion and is never silently replaced with a number
//! - `main_driver` is derived state, recomputed on every normalization pass

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the four independently scored risk categories.
///
/// The declaration order doubles as the tie-break priority when a row's
/// dominant driver is derived: the first driver with the maximal score wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Driver {
    Supply,
    Logistics,
    Climate,
    Geopolitical,
}

impl Driver {
    /// All drivers in tie-break priority order.
    pub const PRIORITY: [Driver; 4] = [
        Driver::Supply,
        Driver::Logistics,
        Driver::Climate,
        Driver::Geopolitical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Supply => "Supply",
            Driver::Logistics => "Logistics",
            Driver::Climate => "Climate",
            Driver::Geopolitical => "Geopolitical",
        }
    }
}

/// One observation row per commodity x market x date.
///
/// Driver scores and the composite score live on a 0-100 scale, confidence on
/// 0-1; those bounds hold after normalization, not necessarily on raw input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub commodity: String,
    pub market: String,
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub chg_7d: Option<f64>,
    pub chg_30d: Option<f64>,
    pub supply_risk_score: Option<f64>,
    pub logistics_risk_score: Option<f64>,
    pub climate_risk_score: Option<f64>,
    pub geopolitical_risk_score: Option<f64>,
    pub composite_risk_score: Option<f64>,
    pub main_driver: Option<Driver>,
    pub confidence: Option<f64>,
}

impl Observation {
    /// Score for one driver category.
    pub fn driver_score(&self, driver: Driver) -> Option<f64> {
        match driver {
            Driver::Supply => self.supply_risk_score,
            Driver::Logistics => self.logistics_risk_score,
            Driver::Climate => self.climate_risk_score,
            Driver::Geopolitical => self.geopolitical_risk_score,
        }
    }
}
