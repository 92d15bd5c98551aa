// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory operation log
//!
//! The log is the authoritative store of operation records and the feed the
//! history views subscribe to. Every mutation is pushed to the live
//! subscriptions whose query it concerns.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use restora_domain_types::{OperationId, OperationQuery, OperationRecord, OperationStatus};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{FeedError, OpLogError};
use crate::operation_feed::{FeedEvent, OperationFeed, OperationSubscription, SubscriberRegistry};

#[derive(Default)]
struct OpLogState {
    last_id: i64,
    records: BTreeMap<OperationId, OperationRecord>,
}

impl OpLogState {
    /// Assign an id (and flow id) to a new record and check it can be stored
    fn prepare(&mut self, record: &mut OperationRecord) -> Result<(), OpLogError> {
        if record.repo_id.is_empty() {
            return Err(OpLogError::MissingRepo);
        }
        if record.id.is_unassigned() {
            self.last_id += 1;
            record.id = OperationId(self.last_id);
        } else if self.records.contains_key(&record.id) {
            return Err(OpLogError::AlreadyExists(record.id));
        } else {
            self.last_id = self.last_id.max(record.id.0);
        }
        if record.flow_id == 0 {
            record.flow_id = record.id.0;
        }
        Ok(())
    }

    fn window(&self, query: &OperationQuery) -> Vec<OperationRecord> {
        let mut matching: Vec<OperationRecord> =
            self.records.values().filter(|r| query.matches(r)).cloned().collect();
        matching.sort_by(|a, b| a.cmp_recency(b));
        matching.truncate(query.max_results());
        matching
    }
}

/// In-memory operation store implementing [`OperationFeed`]
pub struct OpLog {
    state: Mutex<OpLogState>,
    subscribers: Arc<SubscriberRegistry>,
}

impl Default for OpLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OpLog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OpLogState::default()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OpLogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new record, assigning its id when unset.
    pub fn add(&self, mut record: OperationRecord) -> Result<OperationId, OpLogError> {
        let mut state = self.lock();
        state.prepare(&mut record)?;
        let id = record.id;
        debug!(
            operation = %id,
            repo_id = %record.repo_id,
            kind = %record.kind,
            status = %record.status,
            "Operation added"
        );
        state.records.insert(id, record.clone());
        self.publish_upserts(&[record]);
        Ok(id)
    }

    /// Store several new records; either all are stored or none.
    pub fn bulk_add(&self, records: Vec<OperationRecord>) -> Result<Vec<OperationId>, OpLogError> {
        let mut state = self.lock();
        let saved_last_id = state.last_id;
        let mut prepared = Vec::with_capacity(records.len());
        let mut batch_ids = HashSet::new();
        for mut record in records {
            let result = state.prepare(&mut record).and_then(|()| {
                if batch_ids.insert(record.id) {
                    Ok(())
                } else {
                    Err(OpLogError::AlreadyExists(record.id))
                }
            });
            if let Err(err) = result {
                state.last_id = saved_last_id;
                return Err(err);
            }
            prepared.push(record);
        }

        for record in &prepared {
            state.records.insert(record.id, record.clone());
        }
        debug!(count = prepared.len(), "Operations added");
        self.publish_upserts(&prepared);
        Ok(prepared.iter().map(|r| r.id).collect())
    }

    /// Replace an existing record
    pub fn update(&self, record: OperationRecord) -> Result<(), OpLogError> {
        let mut state = self.lock();
        let Some(previous) = state.records.get(&record.id).cloned() else {
            return Err(OpLogError::NotFound(record.id));
        };
        debug!(operation = %record.id, status = %record.status, "Operation updated");
        state.records.insert(record.id, record.clone());

        // a record moved to another repository leaves the old repository's views
        self.subscribers.broadcast(|query| {
            if query.matches(&record) {
                Some(FeedEvent::Upserted(vec![record.clone()]))
            } else if query.matches(&previous) {
                Some(FeedEvent::Deleted(vec![record.id]))
            } else {
                None
            }
        });
        Ok(())
    }

    /// Remove records; returns the ids that existed
    pub fn delete(&self, ids: &[OperationId]) -> Vec<OperationId> {
        let mut state = self.lock();
        let removed: Vec<OperationRecord> =
            ids.iter().filter_map(|id| state.records.remove(id)).collect();
        if removed.is_empty() {
            return Vec::new();
        }
        debug!(count = removed.len(), "Operations deleted");
        self.subscribers.broadcast(|query| {
            let ids: Vec<OperationId> =
                removed.iter().filter(|r| query.matches(r)).map(|r| r.id).collect();
            (!ids.is_empty()).then_some(FeedEvent::Deleted(ids))
        });
        removed.into_iter().map(|r| r.id).collect()
    }

    pub fn get(&self, id: OperationId) -> Option<OperationRecord> {
        self.lock().records.get(&id).cloned()
    }

    /// The most recent `max_results` records matching `query`
    pub fn query(&self, query: &OperationQuery) -> Vec<OperationRecord> {
        self.lock().window(query)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish_upserts(&self, records: &[OperationRecord]) {
        self.subscribers.broadcast(|query| {
            let matching: Vec<OperationRecord> =
                records.iter().filter(|r| query.matches(r)).cloned().collect();
            (!matching.is_empty()).then_some(FeedEvent::Upserted(matching))
        });
    }
}

impl OperationFeed for OpLog {
    fn subscribe(&self, query: &OperationQuery) -> Result<OperationSubscription, FeedError> {
        // hold the state lock so no mutation slips between the initial window and registration
        let state = self.lock();
        let subscription = self.subscribers.register(query.clone());
        let initial = state.window(query);
        if !self.subscribers.send_to(subscription.id(), FeedEvent::Upserted(initial)) {
            return Err(FeedError::Closed);
        }
        Ok(subscription)
    }

    fn active_subscriptions(&self) -> usize {
        self.subscribers.len()
    }

    fn description(&self) -> &str {
        "in-memory operation log"
    }
}

/// Failure of a unit of work tracked by [`with_operation`]
#[derive(Debug, Error)]
pub enum WithOperationError<E> {
    #[error("{0}")]
    Work(E),
    #[error("failed to record operation: {0}")]
    Log(OpLogError),
    #[error("{work}; failed to record operation: {log}")]
    Both { work: E, log: OpLogError },
}

/// Run `work` as a tracked operation.
///
/// The record is added to the log (as `InProgress` when its status is
/// `Unknown`) before `work` runs. `work` may refine the record, e.g. attach
/// a snapshot id. Afterwards the end time is stamped and the status is set
/// to `Error` with the error text on failure, or to `Success` when `work`
/// left it `InProgress`.
pub fn with_operation<T, E, F>(
    oplog: &OpLog,
    mut record: OperationRecord,
    work: F,
) -> Result<T, WithOperationError<E>>
where
    E: std::fmt::Display,
    F: FnOnce(&mut OperationRecord) -> Result<T, E>,
{
    if record.status == OperationStatus::Unknown {
        record.status = OperationStatus::InProgress;
    }
    let id = oplog.add(record.clone()).map_err(WithOperationError::Log)?;
    record.id = id;
    if record.flow_id == 0 {
        record.flow_id = id.0;
    }

    let result = work(&mut record);
    if let Err(err) = &result {
        record.status = OperationStatus::Error;
        record.display_message = Some(err.to_string());
    }
    record.ended_at = Some(Utc::now());
    if record.status == OperationStatus::InProgress {
        record.status = OperationStatus::Success;
    }

    match (result, oplog.update(record)) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(work), Ok(())) => Err(WithOperationError::Work(work)),
        (Ok(_), Err(log)) => {
            warn!(operation = %id, error = %log, "Failed to record operation result");
            Err(WithOperationError::Log(log))
        }
        (Err(work), Err(log)) => {
            warn!(operation = %id, error = %log, "Failed to record operation failure");
            Err(WithOperationError::Both { work, log })
        }
    }
}
