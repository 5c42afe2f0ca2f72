//! Durable action and decision-log store on SQLite
//!
//! Only this module talks to the database. Global invariants enforced:
//! - Each operation opens a connection, runs one statement (or one seeding
//!   transaction), commits, and closes; no locks held across calls
//! - `created_at` and `ts` are UTC with second precision, set once
//! - Title validation is the caller's contract (see `add_action`)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// Default cap for `list_decision_logs`.
pub const DEFAULT_LOG_LIMIT: u32 = 50;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    owner TEXT NOT NULL,
    due_date TEXT NOT NULL,
    status TEXT NOT NULL,
    notes TEXT NOT NULL,
    expected_risk_impact TEXT NOT NULL,
    commodity TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS decision_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL,
    message TEXT NOT NULL
);
";

/// Mitigation action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Blocked,
    Done,
}

impl ActionStatus {
    pub const ALL: [ActionStatus; 4] = [
        ActionStatus::Open,
        ActionStatus::InProgress,
        ActionStatus::Blocked,
        ActionStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "In Progress",
            ActionStatus::Blocked => "Blocked",
            ActionStatus::Done => "Done",
        }
    }

    /// Parse a status label. Case-insensitive; `-` and `_` count as spaces.
    pub fn parse(raw: &str) -> Option<ActionStatus> {
        let normalized = raw.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "open" => Some(ActionStatus::Open),
            "in progress" => Some(ActionStatus::InProgress),
            "blocked" => Some(ActionStatus::Blocked),
            "done" => Some(ActionStatus::Done),
            _ => None,
        }
    }
}

/// Input fields for a new action (id and created_at are store-assigned)
#[derive(Debug, Clone, PartialEq)]
pub struct NewAction {
    pub title: String,
    pub owner: String,
    pub due_date: NaiveDate,
    pub status: ActionStatus,
    pub notes: String,
    pub expected_risk_impact: String,
    pub commodity: String,
}

/// A persisted mitigation action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub id: i64,
    pub title: String,
    pub owner: String,
    pub due_date: NaiveDate,
    pub status: ActionStatus,
    pub notes: String,
    pub expected_risk_impact: String,
    pub commodity: String,
    pub created_at: String,
}

/// One append-only decision log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionLogEntry {
    pub id: i64,
    pub ts: String,
    pub message: String,
}

/// Handle on the durable store. Holds only the database path; every
/// operation opens its own short-lived connection.
#[derive(Debug, Clone)]
pub struct ActionStore {
    db_path: PathBuf,
}

impl ActionStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        ActionStore {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("failed to open database {}", self.db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL journal mode")?;
        Ok(conn)
    }

    /// Create the schema if absent and seed the actions table if it is empty.
    ///
    /// Seed rows share one creation timestamp. Calling this repeatedly never
    /// duplicates seeds.
    pub fn init(&self, seeds: &[NewAction]) -> Result<()> {
        let mut conn = self.open()?;
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to create store schema")?;

        let existing: i64 = conn
            .query_row("SELECT COUNT(*) FROM actions", [], |row| row.get(0))
            .context("failed to count existing actions")?;
        if existing > 0 || seeds.is_empty() {
            return Ok(());
        }

        let created_at = utc_timestamp();
        let tx = conn
            .transaction()
            .context("failed to start seeding transaction")?;
        for seed in seeds {
            tx.execute(
                "INSERT INTO actions (title, owner, due_date, status, notes, expected_risk_impact, commodity, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    seed.title,
                    seed.owner,
                    seed.due_date.format("%Y-%m-%d").to_string(),
                    seed.status.as_str(),
                    seed.notes,
                    seed.expected_risk_impact,
                    seed.commodity,
                    created_at,
                ],
            )
            .with_context(|| format!("failed to seed action {:?}", seed.title))?;
        }
        tx.commit().context("failed to commit seed actions")?;
        Ok(())
    }

    /// Insert one action and return its id.
    ///
    /// The store does not validate fields; rejecting an empty title is the
    /// caller's responsibility (the command layer enforces it before any
    /// write reaches this point).
    pub fn add_action(&self, action: &NewAction) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO actions (title, owner, due_date, status, notes, expected_risk_impact, commodity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                action.title,
                action.owner,
                action.due_date.format("%Y-%m-%d").to_string(),
                action.status.as_str(),
                action.notes,
                action.expected_risk_impact,
                action.commodity,
                utc_timestamp(),
            ],
        )
        .context("failed to insert action")?;
        Ok(conn.last_insert_rowid())
    }

    /// All actions, due date ascending, newest-inserted first within a date.
    pub fn list_actions(&self) -> Result<Vec<Action>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, owner, due_date, status, notes, expected_risk_impact, commodity, created_at
                 FROM actions ORDER BY due_date ASC, id DESC",
            )
            .context("failed to prepare action listing")?;
        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })
            .context("failed to query actions")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read action rows")?;

        let mut actions = Vec::with_capacity(raw_rows.len());
        for (id, title, owner, due_date, status, notes, impact, commodity, created_at) in raw_rows
        {
            let due_date = NaiveDate::parse_from_str(&due_date, "%Y-%m-%d")
                .with_context(|| format!("corrupt due_date {due_date:?} on action {id}"))?;
            actions.push(Action {
                id,
                title,
                owner,
                due_date,
                status: ActionStatus::parse(&status).unwrap_or(ActionStatus::Open),
                notes,
                expected_risk_impact: impact,
                commodity,
                created_at,
            });
        }
        Ok(actions)
    }

    /// Update the two mutable fields of an action. Returns false when the id
    /// does not exist.
    pub fn update_action(&self, id: i64, status: ActionStatus, notes: &str) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn
            .execute(
                "UPDATE actions SET status = ?1, notes = ?2 WHERE id = ?3",
                params![status.as_str(), notes, id],
            )
            .with_context(|| format!("failed to update action {id}"))?;
        Ok(changed > 0)
    }

    /// Delete an action. Idempotent: returns false when the id was absent.
    pub fn delete_action(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn
            .execute("DELETE FROM actions WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete action {id}"))?;
        Ok(changed > 0)
    }

    /// Append one decision log entry with a store-assigned timestamp.
    pub fn add_decision_log(&self, message: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO decision_log (ts, message) VALUES (?1, ?2)",
            params![utc_timestamp(), message],
        )
        .context("failed to append decision log entry")?;
        Ok(())
    }

    /// Most recent decision log entries, descending id, capped at `limit`.
    pub fn list_decision_logs(&self, limit: u32) -> Result<Vec<DecisionLogEntry>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT id, ts, message FROM decision_log ORDER BY id DESC LIMIT ?1")
            .context("failed to prepare decision log listing")?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(DecisionLogEntry {
                    id: row.get(0)?,
                    ts: row.get(1)?,
                    message: row.get(2)?,
                })
            })
            .context("failed to query decision log")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read decision log rows")?;
        Ok(entries)
    }
}

fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
