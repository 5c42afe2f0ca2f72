//! Command handlers
//!
//! Explicit command objects dispatched against a session and the action
//! store. Handlers validate input, run the engine and store calls, and push
//! feed notifications. Rendering stays out of this module.
//!
//! Global invariants enforced:
//! - An empty or whitespace title never reaches the store.
//! - A blank owner becomes "Ops", a blank commodity becomes "All".
//! - Store writes happen before session mutations, so a failed write leaves
//!   the session untouched.

use anyhow::Result;

use crate::aggregates::{commodities, latest_for_commodity};
use crate::config::ResolvedConfig;
use crate::risk::{severity_label, severity_with_thresholds, Severity};
use crate::session::Session;
use crate::shock::apply_shock;
use crate::store::{ActionStatus, ActionStore, NewAction};

/// A mutating operation invoked by the display surface
#[derive(Debug, Clone)]
pub enum Command {
    SelectCommodity {
        commodity: String,
    },
    SimulateShock {
        commodity: String,
    },
    AddAction {
        action: NewAction,
    },
    UpdateAction {
        id: i64,
        status: Option<ActionStatus>,
        notes: Option<String>,
    },
    DeleteAction {
        id: i64,
    },
    LogDecision {
        message: String,
    },
}

/// Typed result of a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    CommoditySelected { commodity: String },
    ShockApplied { commodity: String, severity: String },
    ActionAdded { id: i64 },
    ActionUpdated { found: bool },
    ActionDeleted { removed: bool },
    DecisionLogged,
}

/// Dispatch one command against the session and store.
pub fn dispatch(
    session: &mut Session,
    store: &ActionStore,
    config: &ResolvedConfig,
    command: Command,
) -> Result<CommandOutcome> {
    match command {
        Command::SelectCommodity { commodity } => select_commodity(session, commodity),
        Command::SimulateShock { commodity } => simulate_shock(session, store, config, commodity),
        Command::AddAction { action } => add_action(session, store, action),
        Command::UpdateAction { id, status, notes } => {
            update_action(session, store, id, status, notes)
        }
        Command::DeleteAction { id } => delete_action(session, store, id),
        Command::LogDecision { message } => log_decision(store, message),
    }
}

fn known_commodity(session: &Session, commodity: &str) -> Result<()> {
    if !commodities(session.signals())
        .iter()
        .any(|name| name == commodity)
    {
        anyhow::bail!("unknown commodity: {commodity}");
    }
    Ok(())
}

fn select_commodity(session: &mut Session, commodity: String) -> Result<CommandOutcome> {
    known_commodity(session, &commodity)?;
    session.select_commodity(Some(commodity.clone()));
    Ok(CommandOutcome::CommoditySelected { commodity })
}

fn simulate_shock(
    session: &mut Session,
    store: &ActionStore,
    config: &ResolvedConfig,
    commodity: String,
) -> Result<CommandOutcome> {
    known_commodity(session, &commodity)?;

    let shocked = apply_shock(session.signals(), &commodity, &config.weights);
    let severity = latest_for_commodity(&shocked, &commodity)
        .and_then(|row| row.composite_risk_score)
        .map(|composite| severity_with_thresholds(composite, &config.thresholds));
    let severity = severity_label(severity).to_string();

    store.add_decision_log(&format!(
        "Simulated Red Sea disruption triggered for {commodity}"
    ))?;

    session.replace_signals(shocked);
    session.push_notification(
        severity.clone(),
        format!("Red Sea disruption simulated for {commodity}"),
    );

    Ok(CommandOutcome::ShockApplied {
        commodity,
        severity,
    })
}

fn add_action(
    session: &mut Session,
    store: &ActionStore,
    mut action: NewAction,
) -> Result<CommandOutcome> {
    if action.title.trim().is_empty() {
        anyhow::bail!("action title must not be empty");
    }
    if action.owner.trim().is_empty() {
        action.owner = "Ops".to_string();
    }
    if action.commodity.trim().is_empty() {
        action.commodity = "All".to_string();
    }

    let id = store.add_action(&action)?;
    session.push_notification(
        Severity::Medium.as_str(),
        format!("New action: {}", action.title),
    );

    Ok(CommandOutcome::ActionAdded { id })
}

fn update_action(
    session: &mut Session,
    store: &ActionStore,
    id: i64,
    status: Option<ActionStatus>,
    notes: Option<String>,
) -> Result<CommandOutcome> {
    if status.is_none() && notes.is_none() {
        anyhow::bail!("nothing to update: provide a status or notes");
    }

    // Omitted fields keep their stored values.
    let current = store
        .list_actions()?
        .into_iter()
        .find(|action| action.id == id);
    let Some(current) = current else {
        return Ok(CommandOutcome::ActionUpdated { found: false });
    };

    let status = status.unwrap_or(current.status);
    let notes = notes.unwrap_or(current.notes);
    let found = store.update_action(id, status, &notes)?;
    if found {
        session.push_notification(Severity::Low.as_str(), format!("Updated action #{id}"));
    }

    Ok(CommandOutcome::ActionUpdated { found })
}

fn delete_action(
    session: &mut Session,
    store: &ActionStore,
    id: i64,
) -> Result<CommandOutcome> {
    let removed = store.delete_action(id)?;
    if removed {
        session.push_notification(Severity::Low.as_str(), format!("Deleted action #{id}"));
    }
    Ok(CommandOutcome::ActionDeleted { removed })
}

fn log_decision(store: &ActionStore, message: String) -> Result<CommandOutcome> {
    if message.trim().is_empty() {
        anyhow::bail!("decision message must not be empty");
    }
    store.add_decision_log(&message)?;
    Ok(CommandOutcome::DecisionLogged)
}
