// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Hand-driven operation feed for tests and demos
//!
//! The scripted feed records every subscribe call and only delivers what the
//! test pushes. Unlike [`crate::OpLog`] it does not filter or truncate, so
//! consumers can be checked against oversized or foreign batches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use restora_domain_types::{OperationQuery, OperationRecord};

use crate::error::FeedError;
use crate::operation_feed::{FeedEvent, OperationFeed, OperationSubscription, SubscriberRegistry};

#[derive(Default)]
struct Script {
    initial: Option<Vec<OperationRecord>>,
    fail_next_subscribe: Option<FeedError>,
    subscribe_calls: Vec<OperationQuery>,
}

#[derive(Default)]
pub struct ScriptedOperationFeed {
    script: Mutex<Script>,
    subscribers: Arc<SubscriberRegistry>,
}

impl ScriptedOperationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `records` as the first batch of every new subscription
    pub fn with_initial(self, records: Vec<OperationRecord>) -> Self {
        self.script().initial = Some(records);
        self
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `subscribe` call fail with `error`
    pub fn fail_next_subscribe(&self, error: FeedError) {
        self.script().fail_next_subscribe = Some(error);
    }

    /// Every query `subscribe` was called with, in call order
    pub fn subscribe_calls(&self) -> Vec<OperationQuery> {
        self.script().subscribe_calls.clone()
    }

    /// Queries of the subscriptions still live
    pub fn live_queries(&self) -> Vec<OperationQuery> {
        self.subscribers.queries()
    }

    /// Deliver `event` to every live subscription
    pub fn push(&self, event: FeedEvent) {
        self.subscribers.broadcast(|_| Some(event.clone()));
    }

    /// Deliver `event` to the live subscriptions opened for `query`
    pub fn push_to(&self, query: &OperationQuery, event: FeedEvent) {
        self.subscribers.broadcast(|q| (q == query).then(|| event.clone()));
    }

    /// Deliver a failure to every live subscription
    pub fn fail(&self, error: FeedError) {
        self.push(FeedEvent::Failed(error));
    }
}

impl OperationFeed for ScriptedOperationFeed {
    fn subscribe(&self, query: &OperationQuery) -> Result<OperationSubscription, FeedError> {
        let mut script = self.script();
        script.subscribe_calls.push(query.clone());
        if let Some(error) = script.fail_next_subscribe.take() {
            return Err(error);
        }

        let subscription = self.subscribers.register(query.clone());
        if let Some(initial) = &script.initial {
            self.subscribers
                .send_to(subscription.id(), FeedEvent::Upserted(initial.clone()));
        }
        Ok(subscription)
    }

    fn active_subscriptions(&self) -> usize {
        self.subscribers.len()
    }

    fn description(&self) -> &str {
        "scripted operation feed"
    }
}
