//! End-to-end tests over CSV fixtures: load, normalize, alert, shock, persist.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::TempDir;

use sentinelfs_core::aggregates::latest_for_commodity;
use sentinelfs_core::loader::load_seed_actions;
use sentinelfs_core::risk::{DriverWeights, Severity};
use sentinelfs_core::shock::apply_shock;
use sentinelfs_core::store::DEFAULT_LOG_LIMIT;
use sentinelfs_core::{
    build_overview, dispatch, generate_alerts, load_and_normalize, new_session, open_store,
    ActionStatus, ActionStore, Command, Driver, ResolvedConfig, SignalCache,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_load_normalize_alert_pipeline() {
    let rows =
        load_and_normalize(&fixture_path("signals_basic.csv"), &DriverWeights::default()).unwrap();
    assert_eq!(rows.len(), 6);

    // 0.35*80 + 0.25*85 + 0.20*40 + 0.20*75 = 72.25
    let wheat = latest_for_commodity(&rows, "Wheat").unwrap();
    let composite = wheat.composite_risk_score.unwrap();
    assert!(
        (composite - 72.25).abs() < 1e-9,
        "unexpected composite: {composite}"
    );
    assert_eq!(wheat.main_driver, Some(Driver::Logistics));

    let alerts = generate_alerts(&rows);
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].observation.commodity, "Wheat");
    assert_eq!(alerts[0].severity, Some(Severity::High));
    assert_eq!(
        alerts[0].trigger_reason,
        "Composite >= 70 AND |7D change| >= 10"
    );
    assert_eq!(alerts[1].observation.commodity, "Sugar");
    assert_eq!(alerts[1].trigger_reason, "|7D change| >= 10");
}

#[test]
fn test_messy_rows_normalize_without_failing() {
    let rows =
        load_and_normalize(&fixture_path("signals_messy.csv"), &DriverWeights::default()).unwrap();
    assert_eq!(rows.len(), 2);

    let wheat = &rows[0];
    assert_eq!(wheat.date, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    assert_eq!(wheat.price, None);
    assert_eq!(wheat.chg_7d, None);
    assert_eq!(wheat.supply_risk_score, Some(100.0));
    assert_eq!(wheat.climate_risk_score, Some(0.0));
    assert_eq!(wheat.confidence, Some(1.0));
    // Derived from raw values before clamping: 0.35*150 + 0.25*60 - 0.20*10 + 0.20*70
    let composite = wheat.composite_risk_score.unwrap();
    assert!(
        (composite - 79.5).abs() < 1e-9,
        "unexpected composite: {composite}"
    );
    assert_eq!(wheat.main_driver, Some(Driver::Supply));

    // Supplied composite survives; the main_driver input column does not.
    let sugar = &rows[1];
    assert_eq!(sugar.composite_risk_score, Some(55.5));
    assert_eq!(sugar.main_driver, Some(Driver::Climate));
}

#[test]
fn test_shock_pipeline_recomputes_only_target_commodity() {
    let rows =
        load_and_normalize(&fixture_path("signals_basic.csv"), &DriverWeights::default()).unwrap();
    let shocked = apply_shock(&rows, "Sugar", &DriverWeights::default());

    // 0.35*45 + 0.25*70 + 0.20*60 + 0.20*53 = 55.85
    let sugar = latest_for_commodity(&shocked, "Sugar").unwrap();
    let composite = sugar.composite_risk_score.unwrap();
    assert!(
        (composite - 55.85).abs() < 1e-9,
        "unexpected composite: {composite}"
    );
    assert_eq!(sugar.logistics_risk_score, Some(70.0));
    let chg = sugar.chg_7d.unwrap();
    assert!((chg - 19.4).abs() < 1e-9, "unexpected change: {chg}");

    let wheat_before = latest_for_commodity(&rows, "Wheat").unwrap();
    let wheat_after = latest_for_commodity(&shocked, "Wheat").unwrap();
    assert_eq!(wheat_before, wheat_after);
}

#[test]
fn test_store_seeding_skips_unusable_rows_and_never_reseeds() {
    let dir = TempDir::new().unwrap();
    let seeds = load_seed_actions(&fixture_path("seed_actions.csv")).unwrap();
    assert_eq!(seeds.len(), 2);

    let store = ActionStore::new(dir.path().join("state/actions.db"));
    store.init(&seeds).unwrap();

    let actions = store.list_actions().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].title, "Escalate desk review");
    assert_eq!(actions[0].owner, "Ops");
    assert_eq!(actions[0].commodity, "All");
    assert_eq!(actions[0].status, ActionStatus::InProgress);
    assert_eq!(actions[1].title, "Qualify backup supplier");

    store.init(&seeds).unwrap();
    assert_eq!(store.list_actions().unwrap().len(), 2);
}

#[test]
fn test_open_store_seeds_from_configured_path() {
    let dir = TempDir::new().unwrap();
    let mut config = ResolvedConfig::defaults().unwrap();
    config.db_path = dir.path().join("actions.db");
    config.seed_actions_path = fixture_path("seed_actions.csv");

    let store = open_store(&config).unwrap();
    assert_eq!(store.list_actions().unwrap().len(), 2);
}

#[test]
fn test_shock_command_updates_session_and_audit_trail() {
    let dir = TempDir::new().unwrap();
    let mut config = ResolvedConfig::defaults().unwrap();
    config.signals_path = fixture_path("signals_basic.csv");
    config.db_path = dir.path().join("actions.db");
    config.seed_actions_path = dir.path().join("no_seeds.csv");

    let store = open_store(&config).unwrap();
    let mut cache = SignalCache::new(config.cache_ttl);
    let mut session = new_session(&mut cache, &config).unwrap();

    dispatch(
        &mut session,
        &store,
        &config,
        Command::SimulateShock {
            commodity: "Wheat".to_string(),
        },
    )
    .unwrap();

    // 0.35*80 + 0.25*105 + 0.20*40 + 0.20*90 = 80.25, logistics clamps to 100
    let wheat = latest_for_commodity(session.signals(), "Wheat").unwrap();
    let composite = wheat.composite_risk_score.unwrap();
    assert!(
        (composite - 80.25).abs() < 1e-9,
        "unexpected composite: {composite}"
    );
    assert_eq!(wheat.logistics_risk_score, Some(100.0));

    let overview = build_overview(&session, &config);
    assert_eq!(overview.notifications.len(), 1);
    assert_eq!(overview.notifications[0].severity, "High");
    assert_eq!(
        overview.notifications[0].message,
        "Red Sea disruption simulated for Wheat"
    );

    let logs = store.list_decision_logs(DEFAULT_LOG_LIMIT).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(
        logs[0].message,
        "Simulated Red Sea disruption triggered for Wheat"
    );
}

#[test]
fn test_sessions_own_independent_signal_copies() {
    let dir = TempDir::new().unwrap();
    let mut config = ResolvedConfig::defaults().unwrap();
    config.signals_path = fixture_path("signals_basic.csv");
    config.db_path = dir.path().join("actions.db");
    config.seed_actions_path = dir.path().join("no_seeds.csv");

    let store = open_store(&config).unwrap();
    let mut cache = SignalCache::new(config.cache_ttl);
    let mut first = new_session(&mut cache, &config).unwrap();
    let second = new_session(&mut cache, &config).unwrap();

    dispatch(
        &mut first,
        &store,
        &config,
        Command::SimulateShock {
            commodity: "Wheat".to_string(),
        },
    )
    .unwrap();

    let shocked = latest_for_commodity(first.signals(), "Wheat").unwrap();
    let untouched = latest_for_commodity(second.signals(), "Wheat").unwrap();
    assert_eq!(shocked.logistics_risk_score, Some(100.0));
    assert_eq!(untouched.logistics_risk_score, Some(85.0));
    let composite = untouched.composite_risk_score.unwrap();
    assert!(
        (composite - 72.25).abs() < 1e-9,
        "unexpected composite: {composite}"
    );
}
