// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core state plumbing for the Restora operation-history views.
//!
//! This crate owns the pieces a view model depends on but does not render:
//!
//! - [`ConfigSnapshotStore`]: the observable holder of the current
//!   [`ConfigSnapshot`](restora_config_types::ConfigSnapshot). Snapshots are
//!   swapped atomically and every consumer gets its own subscription.
//! - [`repo_resolver`]: maps a repository id onto the latest snapshot.
//! - [`OperationFeed`]: the abstract source of operation records. A feed
//!   hands out [`OperationSubscription`]s that deliver [`FeedEvent`]s
//!   asynchronously until they are released.
//! - [`OpLog`]: the in-memory operation log, the production feed backend.
//! - [`operation_wire`]: translation between the operations API JSON shapes
//!   and the strongly-typed domain records.
//! - [`AlertSink`]: the shared notification channel for failures the user
//!   must see.
//!
//! Views hold these collaborators behind `Arc<dyn ...>` so tests can swap in
//! [`mock_feed::ScriptedOperationFeed`] and [`alerts::RecordingAlertSink`].

pub mod alerts;
pub mod config_store;
pub mod error;
pub mod mock_feed;
pub mod operation_feed;
pub mod operation_wire;
pub mod oplog;
pub mod repo_resolver;

pub use alerts::{Alert, AlertLevel, AlertSink, RecordingAlertSink, TracingAlertSink};
pub use config_store::{ConfigSnapshotStore, ConfigSubscription};
pub use error::{FeedError, OpLogError, StoreError};
pub use operation_feed::{FeedEvent, OperationFeed, OperationSubscription, SubscriberRegistry};
pub use oplog::{with_operation, OpLog, WithOperationError};
pub use repo_resolver::{RepoIndex, Resolution};

/// Re-export domain types
pub use restora_domain_types::{
    OperationId, OperationKind, OperationQuery, OperationRecord, OperationStatus,
    MAX_OPERATION_HISTORY,
};
