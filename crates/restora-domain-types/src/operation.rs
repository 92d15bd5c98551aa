// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Operation records
//!
//! An operation is one recorded action (backup, prune, check, ...) performed
//! against a repository. Records are produced by the operation log and only
//! read by the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier assigned to an operation by the operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub i64);

impl OperationId {
    /// Placeholder id for records that have not been stored yet
    pub const UNASSIGNED: OperationId = OperationId(0);

    pub fn is_unassigned(self) -> bool {
        self == Self::UNASSIGNED
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an operation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Unknown,
    Pending,
    InProgress,
    Success,
    Warning,
    Error,
    SystemCancelled,
    UserCancelled,
}

impl OperationStatus {
    /// Scheduled or running
    pub fn is_pending(self) -> bool {
        matches!(self, OperationStatus::Pending | OperationStatus::InProgress)
    }

    /// The operation will not change status again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Success
                | OperationStatus::Warning
                | OperationStatus::Error
                | OperationStatus::SystemCancelled
                | OperationStatus::UserCancelled
        )
    }
}

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    #[strum(to_string = "backup")]
    Backup,
    #[strum(to_string = "snapshot")]
    IndexSnapshot,
    #[strum(to_string = "forget")]
    Forget,
    #[strum(to_string = "prune")]
    Prune,
    #[strum(to_string = "check")]
    Check,
    #[strum(to_string = "restore")]
    Restore,
    #[strum(to_string = "stats")]
    Stats,
    #[strum(to_string = "hook")]
    RunHook,
}

/// A single entry of a repository's operation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: OperationId,
    /// Groups the operations that belong to one execution (e.g. a backup and
    /// the snapshot it produced).
    pub flow_id: i64,
    /// Operation that spawned this one, if any
    pub parent_id: Option<OperationId>,
    pub repo_id: String,
    pub plan_id: Option<String>,
    pub snapshot_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: OperationStatus,
    pub kind: OperationKind,
    pub display_message: Option<String>,
}

impl OperationRecord {
    /// A fresh, unstored record for `repo_id`
    pub fn new(repo_id: impl Into<String>, kind: OperationKind, started_at: DateTime<Utc>) -> Self {
        Self {
            id: OperationId::UNASSIGNED,
            flow_id: 0,
            parent_id: None,
            repo_id: repo_id.into(),
            plan_id: None,
            snapshot_id: None,
            started_at,
            ended_at: None,
            status: OperationStatus::Unknown,
            kind,
            display_message: None,
        }
    }

    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: OperationId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }

    /// Most recent first: newer start time, then higher id.
    pub fn cmp_recency(&self, other: &Self) -> Ordering {
        other.started_at.cmp(&self.started_at).then_with(|| other.id.cmp(&self.id))
    }

    /// Wall-clock duration for finished operations
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
