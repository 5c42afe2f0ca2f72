//! Configuration file support
//!
//! Loads engine configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.sentinelfsrc.json` in the working directory
//! 3. `sentinelfs.config.json` in the working directory
//!
//! All fields are optional; omitted values fall back to the documented
//! defaults. CLI flags take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_SIGNAL_TTL;
use crate::risk::{DriverWeights, SeverityThresholds, TriggerRules};
use crate::session::DEFAULT_FEED_LIMIT;
use crate::store::DEFAULT_LOG_LIMIT;

const DEFAULT_SIGNALS_PATH: &str = "data/signals.csv";
const DEFAULT_SEED_ACTIONS_PATH: &str = "data/seed_actions.csv";
const DEFAULT_DB_PATH: &str = "data/actions.db";

/// Engine configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentinelConfig {
    /// Observation CSV path (default: data/signals.csv)
    #[serde(default)]
    pub signals_path: Option<PathBuf>,

    /// Seed actions CSV path, used only when the store is empty
    #[serde(default)]
    pub seed_actions_path: Option<PathBuf>,

    /// SQLite database path (default: data/actions.db)
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Custom driver weights for the composite score
    #[serde(default)]
    pub weights: Option<WeightConfig>,

    /// Custom severity band thresholds
    #[serde(default)]
    pub thresholds: Option<ThresholdConfig>,

    /// Custom alert trigger cutoffs
    #[serde(default)]
    pub triggers: Option<TriggerConfig>,

    /// Signal cache lifetime in seconds (default: 300; 0 disables caching)
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    /// Notifications surfaced by the feed (default: 8)
    #[serde(default)]
    pub feed_limit: Option<usize>,

    /// Decision log entries listed by default (default: 50)
    #[serde(default)]
    pub log_limit: Option<u32>,
}

/// Custom driver weights for the composite score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    /// Weight for supply risk (default: 0.35)
    pub supply: Option<f64>,
    /// Weight for logistics risk (default: 0.25)
    pub logistics: Option<f64>,
    /// Weight for climate risk (default: 0.20)
    pub climate: Option<f64>,
    /// Weight for geopolitical risk (default: 0.20)
    pub geopolitical: Option<f64>,
}

/// Custom severity band thresholds (lower edge of each band)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Composite score where Medium starts (default: 50)
    pub medium_min: Option<f64>,
    /// Composite score where High starts (default: 70)
    pub high_min: Option<f64>,
    /// Composite score where Critical starts (default: 85)
    pub critical_min: Option<f64>,
}

/// Custom alert trigger cutoffs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    /// Composite score that alerts on its own (default: 70)
    pub composite_min: Option<f64>,
    /// Absolute 7-day change that alerts on its own (default: 10)
    pub price_move_min: Option<f64>,
}

/// Resolved configuration ready for use
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub signals_path: PathBuf,
    pub seed_actions_path: PathBuf,
    pub db_path: PathBuf,
    pub weights: DriverWeights,
    pub thresholds: SeverityThresholds,
    pub triggers: TriggerRules,
    pub cache_ttl: Duration,
    pub feed_limit: usize,
    pub log_limit: u32,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl SentinelConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref w) = self.weights {
            let defaults = DriverWeights::default();
            let supply = w.supply.unwrap_or(defaults.supply);
            let logistics = w.logistics.unwrap_or(defaults.logistics);
            let climate = w.climate.unwrap_or(defaults.climate);
            let geopolitical = w.geopolitical.unwrap_or(defaults.geopolitical);

            for (name, value) in [
                ("supply", supply),
                ("logistics", logistics),
                ("climate", climate),
                ("geopolitical", geopolitical),
            ] {
                if value < 0.0 {
                    anyhow::bail!("weights.{} must be non-negative (got {})", name, value);
                }
                if value > 1.0 {
                    anyhow::bail!("weights.{} must be at most 1.0 (got {})", name, value);
                }
            }
            if supply + logistics + climate + geopolitical <= 0.0 {
                anyhow::bail!("weights must not all be zero");
            }
        }

        if let Some(ref t) = self.thresholds {
            let defaults = SeverityThresholds::default();
            let medium = t.medium_min.unwrap_or(defaults.medium_min);
            let high = t.high_min.unwrap_or(defaults.high_min);
            let critical = t.critical_min.unwrap_or(defaults.critical_min);

            for (name, value) in [
                ("medium_min", medium),
                ("high_min", high),
                ("critical_min", critical),
            ] {
                if value <= 0.0 {
                    anyhow::bail!("thresholds.{} must be positive (got {})", name, value);
                }
                if value > 100.0 {
                    anyhow::bail!("thresholds.{} must be at most 100 (got {})", name, value);
                }
            }
            if medium >= high {
                anyhow::bail!(
                    "thresholds.medium_min ({}) must be less than thresholds.high_min ({})",
                    medium,
                    high
                );
            }
            if high >= critical {
                anyhow::bail!(
                    "thresholds.high_min ({}) must be less than thresholds.critical_min ({})",
                    high,
                    critical
                );
            }
        }

        if let Some(ref tr) = self.triggers {
            let defaults = TriggerRules::default();
            let composite = tr.composite_min.unwrap_or(defaults.composite_min);
            let price_move = tr.price_move_min.unwrap_or(defaults.price_move_min);

            if composite <= 0.0 || composite > 100.0 {
                anyhow::bail!(
                    "triggers.composite_min must be in (0, 100] (got {})",
                    composite
                );
            }
            if price_move <= 0.0 {
                anyhow::bail!(
                    "triggers.price_move_min must be positive (got {})",
                    price_move
                );
            }
        }

        if self.feed_limit == Some(0) {
            anyhow::bail!("feed_limit must be positive");
        }
        if self.log_limit == Some(0) {
            anyhow::bail!("log_limit must be positive");
        }

        Ok(())
    }

    /// Resolve config into concrete values ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let weights = {
            let defaults = DriverWeights::default();
            match &self.weights {
                Some(w) => DriverWeights {
                    supply: w.supply.unwrap_or(defaults.supply),
                    logistics: w.logistics.unwrap_or(defaults.logistics),
                    climate: w.climate.unwrap_or(defaults.climate),
                    geopolitical: w.geopolitical.unwrap_or(defaults.geopolitical),
                },
                None => defaults,
            }
        };

        let thresholds = {
            let defaults = SeverityThresholds::default();
            match &self.thresholds {
                Some(t) => SeverityThresholds {
                    medium_min: t.medium_min.unwrap_or(defaults.medium_min),
                    high_min: t.high_min.unwrap_or(defaults.high_min),
                    critical_min: t.critical_min.unwrap_or(defaults.critical_min),
                },
                None => defaults,
            }
        };

        let triggers = {
            let defaults = TriggerRules::default();
            match &self.triggers {
                Some(tr) => TriggerRules {
                    composite_min: tr.composite_min.unwrap_or(defaults.composite_min),
                    price_move_min: tr.price_move_min.unwrap_or(defaults.price_move_min),
                },
                None => defaults,
            }
        };

        Ok(ResolvedConfig {
            signals_path: self
                .signals_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SIGNALS_PATH)),
            seed_actions_path: self
                .seed_actions_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_ACTIONS_PATH)),
            db_path: self
                .db_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            weights,
            thresholds,
            triggers,
            cache_ttl: self
                .cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SIGNAL_TTL),
            feed_limit: self.feed_limit.unwrap_or(DEFAULT_FEED_LIMIT),
            log_limit: self.log_limit.unwrap_or(DEFAULT_LOG_LIMIT),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        SentinelConfig::default().resolve()
    }
}

/// Discover a config file in the working directory
///
/// Search order: `.sentinelfsrc.json`, then `sentinelfs.config.json`.
/// Returns `None` if neither exists (use defaults).
pub fn discover_config(start_dir: &Path) -> Result<Option<(SentinelConfig, PathBuf)>> {
    for name in [".sentinelfsrc.json", "sentinelfs.config.json"] {
        let candidate = start_dir.join(name);
        if candidate.exists() {
            let config = load_config_file(&candidate)?;
            return Ok(Some((config, candidate)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<SentinelConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: SentinelConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve configuration for one invocation.
///
/// An explicit path must exist; otherwise the working directory is searched
/// and defaults apply when nothing is found.
pub fn load_and_resolve(explicit: Option<&Path>, start_dir: &Path) -> Result<ResolvedConfig> {
    let (config, config_path) = match explicit {
        Some(path) => (load_config_file(path)?, Some(path.to_path_buf())),
        None => match discover_config(start_dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (SentinelConfig::default(), None),
        },
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = config_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse_config(json: &str) -> SentinelConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_default_config_resolves_to_documented_values() {
        let resolved = ResolvedConfig::defaults().unwrap();

        assert_eq!(resolved.weights, DriverWeights::default());
        assert_eq!(resolved.thresholds.medium_min, 50.0);
        assert_eq!(resolved.thresholds.high_min, 70.0);
        assert_eq!(resolved.thresholds.critical_min, 85.0);
        assert_eq!(resolved.triggers.composite_min, 70.0);
        assert_eq!(resolved.triggers.price_move_min, 10.0);
        assert_eq!(resolved.cache_ttl, Duration::from_secs(300));
        assert_eq!(resolved.feed_limit, 8);
        assert_eq!(resolved.log_limit, 50);
        assert_eq!(resolved.signals_path, PathBuf::from("data/signals.csv"));
        assert_eq!(resolved.config_path, None);
    }

    #[test]
    fn test_partial_weight_override_merges_with_defaults() {
        let config = parse_config(r#"{"weights": {"supply": 0.5}}"#);
        let resolved = config.resolve().unwrap();

        assert_eq!(resolved.weights.supply, 0.5);
        assert_eq!(resolved.weights.logistics, 0.25);
        assert_eq!(resolved.weights.climate, 0.20);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = serde_json::from_str::<SentinelConfig>(r#"{"signals": "x.csv"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = parse_config(r#"{"weights": {"climate": -0.1}}"#);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("climate"));
    }

    #[test]
    fn test_oversized_weight_rejected() {
        let config = parse_config(r#"{"weights": {"supply": 1.5}}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let config = parse_config(
            r#"{"weights": {"supply": 0, "logistics": 0, "climate": 0, "geopolitical": 0}}"#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("all be zero"));
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let config = parse_config(r#"{"thresholds": {"medium_min": 75}}"#);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("less than"));
    }

    #[test]
    fn test_threshold_above_scale_rejected() {
        let config = parse_config(r#"{"thresholds": {"critical_min": 120}}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nonpositive_trigger_rejected() {
        let config = parse_config(r#"{"triggers": {"price_move_min": 0}}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_feed_limit_rejected() {
        let config = parse_config(r#"{"feed_limit": 0}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_triggers_resolve() {
        let config = parse_config(r#"{"triggers": {"composite_min": 65, "price_move_min": 7.5}}"#);
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.triggers.composite_min, 65.0);
        assert_eq!(resolved.triggers.price_move_min, 7.5);
    }

    #[test]
    fn test_discover_prefers_rc_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".sentinelfsrc.json"),
            r#"{"feed_limit": 3}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("sentinelfs.config.json"),
            r#"{"feed_limit": 9}"#,
        )
        .unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.feed_limit, Some(3));
        assert!(path.ends_with(".sentinelfsrc.json"));
    }

    #[test]
    fn test_discover_falls_back_to_config_json() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sentinelfs.config.json"),
            r#"{"feed_limit": 9}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.feed_limit, Some(9));
    }

    #[test]
    fn test_discover_none_when_absent() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_resolve_records_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sentinelfsrc.json");
        fs::write(&path, r#"{"db_path": "state/actions.db"}"#).unwrap();

        let resolved = load_and_resolve(None, dir.path()).unwrap();
        assert_eq!(resolved.db_path, PathBuf::from("state/actions.db"));
        assert_eq!(resolved.config_path, Some(path));
    }

    #[test]
    fn test_load_and_resolve_defaults_when_no_file() {
        let dir = TempDir::new().unwrap();
        let resolved = load_and_resolve(None, dir.path()).unwrap();
        assert_eq!(resolved.config_path, None);
        assert_eq!(resolved.feed_limit, 8);
    }

    #[test]
    fn test_explicit_missing_config_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let err = load_and_resolve(Some(&missing), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sentinelfsrc.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }
}
