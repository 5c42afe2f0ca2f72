//! SentinelFS core library - commodity supply-risk scoring, alerting, and action tracking

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Risk scores live on a 0-100 scale, confidence on 0-1; clamped at normalization
// - Missing numeric values stay missing; derivation never invents data
// - Alerts and aggregates are recomputed views, never cached across mutations
// - Identical input yields identical output: ordering ties break deterministically

pub mod aggregates;
pub mod alerts;
pub mod cache;
pub mod commands;
pub mod config;
pub mod loader;
pub mod normalize;
pub mod report;
pub mod risk;
pub mod session;
pub mod shock;
pub mod signal;
pub mod store;

pub use alerts::{generate_alerts, generate_alerts_with_rules, Alert};
pub use cache::SignalCache;
pub use commands::{dispatch, Command, CommandOutcome};
pub use config::{load_and_resolve, ResolvedConfig, SentinelConfig};
pub use normalize::normalize;
pub use report::{build_drilldown, build_overview, build_signals, render_json, Drilldown, Overview};
pub use session::Session;
pub use signal::{Driver, Observation};
pub use store::{Action, ActionStatus, ActionStore, DecisionLogEntry, NewAction};

use std::path::Path;

use anyhow::Result;

use crate::risk::DriverWeights;

/// Load observations from CSV and run them through normalization.
pub fn load_and_normalize(path: &Path, weights: &DriverWeights) -> Result<Vec<Observation>> {
    let rows = loader::load_signals(path)?;
    Ok(normalize(&rows, weights))
}

/// Open the action store, creating and seeding it on first run.
///
/// Seeds apply only while the store is empty. A missing seed file downgrades
/// to a warning on first run and an unseeded store.
pub fn open_store(config: &ResolvedConfig) -> Result<ActionStore> {
    let fresh = !config.db_path.exists();
    let seeds = if config.seed_actions_path.exists() {
        loader::load_seed_actions(&config.seed_actions_path)?
    } else {
        if fresh {
            eprintln!(
                "warning: seed actions file not found: {}",
                config.seed_actions_path.display()
            );
        }
        Vec::new()
    };

    let store = ActionStore::new(&config.db_path);
    store.init(&seeds)?;
    Ok(store)
}

/// Start a session with signals fetched through the cache.
pub fn new_session(cache: &mut SignalCache, config: &ResolvedConfig) -> Result<Session> {
    let signals = cache.fetch(&config.signals_path, &config.weights)?;
    Ok(Session::new(signals, config.feed_limit))
}
