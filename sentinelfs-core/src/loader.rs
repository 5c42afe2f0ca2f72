//! CSV ingestion for observation rows and seed actions
//!
//! Numeric fields parse leniently: anything that does not coerce to a finite
//! number becomes the missing marker, and the batch keeps going. Identity
//! fields are stricter: a malformed observation date fails the load with row
//! context, while malformed seed-action rows are skipped with a warning
//! (seeding is best-effort bootstrap data).

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::signal::Observation;
use crate::store::{ActionStatus, NewAction};

#[derive(Debug, Deserialize)]
struct SignalRecord {
    commodity: String,
    market: String,
    date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    chg_7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    chg_30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    supply_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    logistics_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    climate_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    geopolitical_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    composite_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    confidence: Option<f64>,
}

impl SignalRecord {
    fn into_observation(self) -> Result<Observation> {
        let commodity = self.commodity.trim().to_string();
        let market = self.market.trim().to_string();
        if commodity.is_empty() {
            bail!("empty commodity");
        }
        Ok(Observation {
            date: parse_date(&self.date)?,
            commodity,
            market,
            price: self.price,
            chg_7d: self.chg_7d,
            chg_30d: self.chg_30d,
            supply_risk_score: self.supply_risk_score,
            logistics_risk_score: self.logistics_risk_score,
            climate_risk_score: self.climate_risk_score,
            geopolitical_risk_score: self.geopolitical_risk_score,
            composite_risk_score: self.composite_risk_score,
            // Derived on every normalization pass; an input column is ignored.
            main_driver: None,
            confidence: self.confidence,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SeedActionRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    expected_risk_impact: Option<String>,
    #[serde(default)]
    commodity: Option<String>,
}

impl SeedActionRecord {
    fn into_new_action(self) -> Result<NewAction> {
        let title = self.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            bail!("empty title");
        }
        let due_date = parse_date(self.due_date.as_deref().unwrap_or_default())?;

        let owner = self.owner.unwrap_or_default().trim().to_string();
        let commodity = self.commodity.unwrap_or_default().trim().to_string();
        Ok(NewAction {
            title,
            owner: if owner.is_empty() { "Ops".to_string() } else { owner },
            due_date,
            status: self
                .status
                .as_deref()
                .and_then(ActionStatus::parse)
                .unwrap_or(ActionStatus::Open),
            notes: self.notes.unwrap_or_default().trim().to_string(),
            expected_risk_impact: self
                .expected_risk_impact
                .unwrap_or_default()
                .trim()
                .to_string(),
            commodity: if commodity.is_empty() {
                "All".to_string()
            } else {
                commodity
            },
        })
    }
}

/// Load observation rows from a headered CSV file.
///
/// A `main_driver` column on input is ignored; composite_risk_score is
/// optional. Rows keep their position, nothing is dropped.
pub fn load_signals(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open signals file {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<SignalRecord>().enumerate() {
        let line = idx + 2;
        let record = record
            .with_context(|| format!("malformed signal record at line {line}"))?;
        let observation = record
            .into_observation()
            .with_context(|| format!("invalid signal record at line {line}"))?;
        rows.push(observation);
    }
    Ok(rows)
}

/// Load seed actions from a headered CSV file, skipping unusable rows.
pub fn load_seed_actions(path: &Path) -> Result<Vec<NewAction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open seed actions file {}", path.display()))?;

    let mut seeds = Vec::new();
    for (idx, record) in reader.deserialize::<SeedActionRecord>().enumerate() {
        let line = idx + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                eprintln!("warning: skipping seed action at line {line}: {err}");
                continue;
            }
        };
        match record.into_new_action() {
            Ok(seed) => seeds.push(seed),
            Err(err) => eprintln!("warning: skipping seed action at line {line}: {err}"),
        }
    }
    Ok(seeds)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .map_err(|_| anyhow::anyhow!("unparseable date {trimmed:?}"))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite()))
}
