//! Report building and rendering
//!
//! Global invariants enforced:
//! - Deterministic output ordering (ranked alerts, sorted tables)
//! - Missing values render as "-" in text and null in JSON

use anyhow::Result;
use serde::Serialize;

use crate::aggregates::{
    commodities, latest_for_commodity, latest_observations, mean_composite, risk_band_14d,
    scenario_outlook, ScenarioCase,
};
use crate::alerts::{generate_alerts_with_rules, Alert};
use crate::config::ResolvedConfig;
use crate::risk::{severity_label, severity_with_thresholds, Severity};
use crate::session::{Notification, Session};
use crate::signal::{Driver, Observation};
use crate::store::{Action, DecisionLogEntry};

/// Dashboard overview: KPIs, ranked alerts, recent notifications
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub risk_index: Option<f64>,
    pub commodity_count: usize,
    pub alert_count: usize,
    pub high_alert_count: usize,
    pub alerts: Vec<Alert>,
    pub notifications: Vec<Notification>,
}

/// Single-commodity drilldown built from its latest observation
#[derive(Debug, Clone, Serialize)]
pub struct Drilldown {
    pub commodity: String,
    pub latest: Observation,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_14d: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<[ScenarioCase; 3]>,
}

/// Build the overview from the session's current signal set.
pub fn build_overview(session: &Session, config: &ResolvedConfig) -> Overview {
    let rows = session.signals();
    let alerts = generate_alerts_with_rules(rows, &config.thresholds, &config.triggers);
    let high_alert_count = alerts
        .iter()
        .filter(|alert| {
            matches!(
                alert.severity,
                Some(Severity::High) | Some(Severity::Critical)
            )
        })
        .count();

    Overview {
        risk_index: mean_composite(rows),
        commodity_count: commodities(rows).len(),
        alert_count: alerts.len(),
        high_alert_count,
        alerts,
        notifications: session.feed().into_iter().cloned().collect(),
    }
}

/// Latest observation per commodity and market, for the signals table.
pub fn build_signals(session: &Session) -> Vec<Observation> {
    latest_observations(session.signals())
}

/// Build the drilldown for one commodity.
///
/// Alert context comes from the ranked alert set; the band and outlook are
/// omitted when the composite score is missing.
pub fn build_drilldown(
    session: &Session,
    config: &ResolvedConfig,
    commodity: &str,
) -> Result<Drilldown> {
    let rows = session.signals();
    let latest = latest_for_commodity(rows, commodity)
        .ok_or_else(|| anyhow::anyhow!("unknown commodity: {commodity}"))?
        .clone();

    let severity = latest
        .composite_risk_score
        .map(|c| severity_with_thresholds(c, &config.thresholds));
    let trigger_reason = generate_alerts_with_rules(rows, &config.thresholds, &config.triggers)
        .into_iter()
        .find(|alert| alert.observation.commodity == commodity)
        .map(|alert| alert.trigger_reason);

    Ok(Drilldown {
        commodity: commodity.to_string(),
        severity: severity_label(severity).to_string(),
        trigger_reason,
        band_14d: latest.composite_risk_score.map(risk_band_14d),
        outlook: latest.composite_risk_score.map(scenario_outlook),
        latest,
    })
}

/// Render the overview as text output
pub fn render_overview_text(overview: &Overview) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Risk index: {}   Commodities: {}   Alerts: {} ({} high or critical)\n\n",
        fmt_score(overview.risk_index),
        overview.commodity_count,
        overview.alert_count,
        overview.high_alert_count,
    ));

    if overview.alerts.is_empty() {
        output.push_str("No active alerts.\n");
    } else {
        output.push_str(&render_alert_table(&overview.alerts));
    }

    if !overview.notifications.is_empty() {
        output.push_str("\nRecent notifications:\n");
        for notification in &overview.notifications {
            output.push_str(&format!(
                "  [{}] {}  {}\n",
                notification.severity, notification.ts, notification.message
            ));
        }
    }

    output
}

/// Render ranked alerts as text output
pub fn render_alerts_text(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No active alerts.\n".to_string();
    }
    render_alert_table(alerts)
}

fn render_alert_table(alerts: &[Alert]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<10} {:<12} {:<10} {:<12} {:<10} {:<8} {:<14} {}\n",
        "SEVERITY", "COMMODITY", "MARKET", "DATE", "COMPOSITE", "CHG7D", "DRIVER", "REASON"
    ));

    for alert in alerts {
        let row = &alert.observation;
        output.push_str(&format!(
            "{:<10} {:<12} {:<10} {:<12} {:<10} {:<8} {:<14} {}\n",
            severity_label(alert.severity),
            truncate_or_pad(&row.commodity, 12),
            truncate_or_pad(&row.market, 10),
            row.date,
            fmt_score(row.composite_risk_score),
            fmt_signed(row.chg_7d),
            fmt_driver(row.main_driver),
            alert.trigger_reason,
        ));
    }

    output
}

/// Render the signals table as text output
pub fn render_signals_text(rows: &[Observation]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<10} {:<12} {:<10} {:<8} {:<8} {:<10} {}\n",
        "COMMODITY", "MARKET", "DATE", "PRICE", "CHG7D", "CHG30D", "COMPOSITE", "DRIVER"
    ));

    for row in rows {
        output.push_str(&format!(
            "{:<12} {:<10} {:<12} {:<10} {:<8} {:<8} {:<10} {}\n",
            truncate_or_pad(&row.commodity, 12),
            truncate_or_pad(&row.market, 10),
            row.date,
            fmt_price(row.price),
            fmt_signed(row.chg_7d),
            fmt_signed(row.chg_30d),
            fmt_score(row.composite_risk_score),
            fmt_driver(row.main_driver),
        ));
    }

    output
}

/// Render the drilldown as text output
pub fn render_drilldown_text(drilldown: &Drilldown) -> String {
    let row = &drilldown.latest;
    let mut output = String::new();

    output.push_str(&format!(
        "{} ({}, {})\n",
        drilldown.commodity, row.market, row.date
    ));
    output.push_str(&format!(
        "Severity: {}   Composite: {}\n",
        drilldown.severity,
        fmt_score(row.composite_risk_score)
    ));
    output.push_str(&format!(
        "Price: {}   7d: {}   30d: {}   Confidence: {}\n",
        fmt_price(row.price),
        fmt_signed(row.chg_7d),
        fmt_signed(row.chg_30d),
        fmt_confidence(row.confidence),
    ));
    output.push_str(&format!(
        "Drivers: supply {}  logistics {}  climate {}  geopolitical {}\n",
        fmt_score(row.supply_risk_score),
        fmt_score(row.logistics_risk_score),
        fmt_score(row.climate_risk_score),
        fmt_score(row.geopolitical_risk_score),
    ));
    output.push_str(&format!("Main driver: {}\n", fmt_driver(row.main_driver)));

    if let Some(ref reason) = drilldown.trigger_reason {
        output.push_str(&format!("Trigger: {reason}\n"));
    }
    if let Some((low, high)) = drilldown.band_14d {
        output.push_str(&format!("14-day band: {low:.1} to {high:.1}\n"));
    }
    if let Some(ref outlook) = drilldown.outlook {
        output.push_str("Outlook:\n");
        for case in outlook {
            output.push_str(&format!(
                "  {:<6} {:>4.0}%  {:.1}\n",
                case.name,
                case.probability * 100.0,
                case.projected_composite,
            ));
        }
    }

    output
}

/// Render actions as text output
pub fn render_actions_text(actions: &[Action]) -> String {
    if actions.is_empty() {
        return "No actions.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<5} {:<30} {:<10} {:<12} {:<12} {:<12} {}\n",
        "ID", "TITLE", "OWNER", "DUE", "STATUS", "COMMODITY", "NOTES"
    ));
    for action in actions {
        output.push_str(&format!(
            "{:<5} {:<30} {:<10} {:<12} {:<12} {:<12} {}\n",
            action.id,
            truncate_or_pad(&action.title, 30),
            truncate_or_pad(&action.owner, 10),
            action.due_date,
            action.status.as_str(),
            truncate_or_pad(&action.commodity, 12),
            action.notes,
        ));
    }
    output
}

/// Render decision log entries as text output
pub fn render_logs_text(entries: &[DecisionLogEntry]) -> String {
    if entries.is_empty() {
        return "No decision log entries.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("{:<5} {:<22} {}\n", "ID", "TS", "MESSAGE"));
    for entry in entries {
        output.push_str(&format!(
            "{:<5} {:<22} {}\n",
            entry.id, entry.ts, entry.message
        ));
    }
    output
}

/// Render any report value as JSON output
pub fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn fmt_score(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

fn fmt_signed(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:+.1}"),
        None => "-".to_string(),
    }
}

fn fmt_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_confidence(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_driver(driver: Option<Driver>) -> String {
    match driver {
        Some(d) => d.as_str().to_string(),
        None => "-".to_string(),
    }
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.len() > width {
        format!("{}...", &s[..width.saturating_sub(3)])
    } else {
        format!("{:<width$}", s)
    }
}
