// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded, id-keyed set of operation records shared by the history
//! projections.
//!
//! Feed batches are merged incrementally: upserts replace records by id,
//! deletions remove them, and nothing else is discarded except the oldest
//! records once the window grows past the query bound.

use std::collections::HashMap;

use restora_core::FeedEvent;
use restora_domain_types::{OperationId, OperationQuery, OperationRecord};

#[derive(Debug, Clone)]
pub struct OperationWindow {
    query: OperationQuery,
    records: HashMap<OperationId, OperationRecord>,
    loaded: bool,
}

impl OperationWindow {
    pub fn new(query: OperationQuery) -> Self {
        Self {
            query,
            records: HashMap::new(),
            loaded: false,
        }
    }

    pub fn query(&self) -> &OperationQuery {
        &self.query
    }

    /// Merge one feed event. Returns whether the window changed.
    ///
    /// Records that do not belong to the query are ignored. Failures leave
    /// the window untouched.
    pub fn apply(&mut self, event: &FeedEvent) -> bool {
        match event {
            FeedEvent::Upserted(records) => {
                let first_batch = !self.loaded;
                self.loaded = true;
                let mut changed = first_batch;
                for record in records.iter().filter(|r| self.query.matches(r)) {
                    if self.records.get(&record.id) != Some(record) {
                        self.records.insert(record.id, record.clone());
                        changed = true;
                    }
                }
                self.truncate();
                changed
            }
            FeedEvent::Deleted(ids) => {
                let before = self.records.len();
                for id in ids {
                    self.records.remove(id);
                }
                self.records.len() != before
            }
            FeedEvent::Failed(_) => false,
        }
    }

    fn truncate(&mut self) {
        let limit = self.query.max_results();
        if self.records.len() <= limit {
            return;
        }
        let mut ordered: Vec<&OperationRecord> = self.records.values().collect();
        ordered.sort_by(|a, b| a.cmp_recency(b));
        let evicted: Vec<OperationId> = ordered[limit..].iter().map(|r| r.id).collect();
        for id in evicted {
            self.records.remove(&id);
        }
    }

    /// Records, most recent first
    pub fn sorted(&self) -> Vec<&OperationRecord> {
        let mut ordered: Vec<&OperationRecord> = self.records.values().collect();
        ordered.sort_by(|a, b| a.cmp_recency(b));
        ordered
    }

    pub fn get(&self, id: OperationId) -> Option<&OperationRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the initial batch has arrived
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
