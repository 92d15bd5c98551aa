// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Observable holder of the current configuration snapshot
//!
//! The store keeps exactly one [`ConfigSnapshot`] behind an `Arc`. A change
//! swaps in a whole new snapshot, so readers either see the old
//! configuration or the new one, never a mix. Consumers are notified through
//! their own [`ConfigSubscription`] and always read the latest value when
//! they process the notification.

use std::sync::Arc;

use restora_config_types::{ConfigSnapshot, Plan, Repository};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::StoreError;

/// Shared, cheaply clonable handle to the configuration store
#[derive(Clone)]
pub struct ConfigSnapshotStore {
    tx: Arc<watch::Sender<Arc<ConfigSnapshot>>>,
}

impl ConfigSnapshotStore {
    pub fn new(initial: ConfigSnapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// The snapshot current at the time of the call
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.tx.borrow().clone()
    }

    /// Register a new consumer. The current snapshot counts as already seen.
    pub fn subscribe(&self) -> ConfigSubscription {
        ConfigSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Atomically replace the current snapshot.
    ///
    /// A snapshot whose `modno` is older than the current one is rejected.
    pub fn replace(&self, snapshot: ConfigSnapshot) -> Result<(), StoreError> {
        let current = self.tx.borrow().modno();
        if snapshot.modno() < current {
            return Err(StoreError::Stale {
                current,
                offered: snapshot.modno(),
            });
        }

        info!(
            modno = snapshot.modno(),
            repos = snapshot.repos().len(),
            "Configuration snapshot replaced"
        );
        self.tx.send_replace(Arc::new(snapshot));
        Ok(())
    }

    /// Build a snapshot from `repos` and `plans` with the next `modno`,
    /// keeping the current UI settings, and install it.
    pub fn update(&self, repos: Vec<Repository>, plans: Vec<Plan>) -> Result<u64, StoreError> {
        let current = self.current();
        let modno = current.modno() + 1;
        let snapshot = ConfigSnapshot::new(repos, plans)?
            .with_modno(modno)
            .with_ui(current.ui().clone());
        self.replace(snapshot)?;
        Ok(modno)
    }
}

impl std::fmt::Debug for ConfigSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSnapshotStore")
            .field("modno", &self.tx.borrow().modno())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

/// One consumer's view of store changes.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct ConfigSubscription {
    rx: watch::Receiver<Arc<ConfigSnapshot>>,
}

impl ConfigSubscription {
    /// Whether a snapshot newer than the last one read is available
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Read the latest snapshot and mark it as seen
    pub fn latest(&mut self) -> Arc<ConfigSnapshot> {
        let snapshot = self.rx.borrow_and_update().clone();
        debug!(modno = snapshot.modno(), "Observed configuration snapshot");
        snapshot
    }

    /// Read the latest snapshot without marking it as seen
    pub fn peek(&self) -> Arc<ConfigSnapshot> {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
