// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared user-facing notification channel
//!
//! Components report failures the user must see to an [`AlertSink`] instead
//! of drawing their own error UI, so every part of the application surfaces
//! problems the same way.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub level: AlertLevel,
    /// Component that raised the alert, e.g. `repo_view`
    pub source: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(level: AlertLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: Alert);
}

/// Writes alerts to the log
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: Alert) {
        match alert.level {
            AlertLevel::Info => info!(source = %alert.source, "{}", alert.message),
            AlertLevel::Warning => warn!(source = %alert.source, "{}", alert.message),
            AlertLevel::Error => error!(source = %alert.source, "{}", alert.message),
        }
    }
}

/// Keeps every alert raised, most recent last
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn latest(&self) -> Option<Alert> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for RecordingAlertSink {
    fn raise(&self, alert: Alert) {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).push(alert);
    }
}
