// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Operation Feed - Abstract Source of Operation History
//!
//! A feed executes an [`OperationQuery`] and keeps delivering matching
//! operation records as they change. Views never talk to the operation log
//! or the transport directly; they hold an `Arc<dyn OperationFeed>` so tests
//! can substitute a scripted feed.
//!
//! ## Subscription lifecycle
//!
//! [`OperationFeed::subscribe`] returns immediately with an
//! [`OperationSubscription`]. Events arrive asynchronously over an unbounded
//! channel and are pulled by the owner, either with
//! [`OperationSubscription::try_next`] from a UI tick or with
//! [`OperationSubscription::next`] from a task.
//!
//! Releasing the handle (dropping it or calling
//! [`OperationSubscription::unsubscribe`]) removes its sender from the feed.
//! A released subscription receives nothing further, and the feed stops
//! doing work for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use restora_domain_types::{OperationId, OperationQuery, OperationRecord};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::FeedError;

/// One delivery from a feed to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Records that were created or changed. The first event of every
    /// subscription is the initial window, possibly empty.
    Upserted(Vec<OperationRecord>),
    /// Records that no longer exist
    Deleted(Vec<OperationId>),
    /// Delivery failed; the subscription may still recover
    Failed(FeedError),
}

/// Abstract trait for operation history sources
///
/// Implementations:
/// - [`crate::OpLog`]: the in-memory operation log
/// - [`crate::mock_feed::ScriptedOperationFeed`]: test double driven by hand
pub trait OperationFeed: Send + Sync {
    /// Start delivering records matching `query`
    fn subscribe(&self, query: &OperationQuery) -> Result<OperationSubscription, FeedError>;

    /// Number of subscriptions that have not been released
    fn active_subscriptions(&self) -> usize;

    /// Get a human-readable description of this feed
    fn description(&self) -> &str;
}

struct Subscriber {
    query: OperationQuery,
    tx: mpsc::UnboundedSender<FeedEvent>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
}

/// Bookkeeping of live subscriptions, shared by feed implementations.
#[derive(Default)]
pub struct SubscriberRegistry {
    inner: Mutex<RegistryInner>,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a subscription for `query` and keep its sender
    pub fn register(self: &Arc<Self>, query: OperationQuery) -> OperationSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.insert(
            id,
            Subscriber {
                query: query.clone(),
                tx,
            },
        );
        debug!(
            subscription = id,
            repo_id = query.repo_id(),
            max_results = query.max_results(),
            "Operation subscription opened"
        );

        OperationSubscription {
            id,
            query,
            rx,
            registry: Arc::downgrade(self),
        }
    }

    /// Send `event` to one subscription. Returns `false` if it is gone.
    pub fn send_to(&self, id: u64, event: FeedEvent) -> bool {
        let mut inner = self.lock();
        let delivered = match inner.subscribers.get(&id) {
            Some(subscriber) => subscriber.tx.send(event).is_ok(),
            None => false,
        };
        if !delivered {
            inner.subscribers.remove(&id);
        }
        delivered
    }

    /// Offer an event to every subscriber; `event_for` decides per query
    /// what (if anything) that subscriber receives.
    pub fn broadcast<F>(&self, mut event_for: F)
    where
        F: FnMut(&OperationQuery) -> Option<FeedEvent>,
    {
        let mut inner = self.lock();
        inner.subscribers.retain(|id, subscriber| match event_for(&subscriber.query) {
            Some(event) => {
                let alive = subscriber.tx.send(event).is_ok();
                if !alive {
                    trace!(subscription = id, "Dropping closed operation subscription");
                }
                alive
            }
            None => !subscriber.tx.is_closed(),
        });
    }

    /// Queries of all live subscriptions, oldest first
    pub fn queries(&self) -> Vec<OperationQuery> {
        let inner = self.lock();
        let mut entries: Vec<_> = inner
            .subscribers
            .iter()
            .filter(|(_, s)| !s.tx.is_closed())
            .map(|(id, s)| (*id, s.query.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, query)| query).collect()
    }

    /// Ids of all live subscriptions, oldest first
    pub fn ids(&self) -> Vec<u64> {
        let inner = self.lock();
        let mut ids: Vec<u64> = inner
            .subscribers
            .iter()
            .filter(|(_, s)| !s.tx.is_closed())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().subscribers.values().filter(|s| !s.tx.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        if self.lock().subscribers.remove(&id).is_some() {
            debug!(subscription = id, "Operation subscription released");
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry").field("live", &self.len()).finish()
    }
}

/// Handle to a live feed subscription
///
/// Dropping the handle releases the subscription.
#[derive(Debug)]
pub struct OperationSubscription {
    id: u64,
    query: OperationQuery,
    rx: mpsc::UnboundedReceiver<FeedEvent>,
    registry: Weak<SubscriberRegistry>,
}

impl OperationSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The query this subscription was opened for
    pub fn query(&self) -> &OperationQuery {
        &self.query
    }

    /// Next queued event, without waiting
    pub fn try_next(&mut self) -> Option<FeedEvent> {
        self.rx.try_recv().ok()
    }

    /// All queued events, without waiting
    pub fn drain(&mut self) -> Vec<FeedEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next event. `None` once the feed has dropped the
    /// subscription.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Release the subscription
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for OperationSubscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
