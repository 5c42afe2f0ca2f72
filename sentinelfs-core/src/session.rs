//! Session-scoped mutable state
//!
//! One `Session` per logical user: the normalized signal set, the commodity
//! selection, and the in-memory notification feed. Nothing here is persisted
//! or shared between sessions, so a shock applied in one session never leaks
//! into another; a fresh session re-seeds from source data.

use chrono::Utc;
use serde::Serialize;

use crate::signal::Observation;

/// Default number of notifications surfaced by `feed`.
pub const DEFAULT_FEED_LIMIT: usize = 8;

/// One in-memory notification. Process-lifetime only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub severity: String,
    pub message: String,
    pub ts: String,
}

/// Per-session state owned by one logical user.
#[derive(Debug)]
pub struct Session {
    signals: Vec<Observation>,
    selected_commodity: Option<String>,
    notifications: Vec<Notification>,
    feed_limit: usize,
}

impl Session {
    pub fn new(signals: Vec<Observation>, feed_limit: usize) -> Self {
        Session {
            signals,
            selected_commodity: None,
            notifications: Vec::new(),
            feed_limit,
        }
    }

    pub fn signals(&self) -> &[Observation] {
        &self.signals
    }

    /// Swap in a new signal set (after a shock re-normalization).
    pub fn replace_signals(&mut self, rows: Vec<Observation>) {
        self.signals = rows;
    }

    pub fn selected_commodity(&self) -> Option<&str> {
        self.selected_commodity.as_deref()
    }

    pub fn select_commodity(&mut self, commodity: Option<String>) {
        self.selected_commodity = commodity;
    }

    /// Append a notification stamped with the current UTC time of day.
    pub fn push_notification(&mut self, severity: impl Into<String>, message: impl Into<String>) {
        self.notifications.push(Notification {
            severity: severity.into(),
            message: message.into(),
            ts: Utc::now().format("%H:%M").to_string(),
        });
    }

    /// Full notification history, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Surfaced feed: the most recent notifications, newest first, capped at
    /// the session's feed limit.
    pub fn feed(&self) -> Vec<&Notification> {
        self.notifications
            .iter()
            .rev()
            .take(self.feed_limit)
            .collect()
    }
}
