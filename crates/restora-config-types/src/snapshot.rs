// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Point-in-time configuration snapshots
//!
//! A snapshot is never mutated after construction. Configuration changes
//! produce a new snapshot that replaces the previous one as a whole, so a
//! reader can never observe a partially-applied edit.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::Plan;
use crate::repo::Repository;
use crate::ui::UiRoot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate repository id '{0}'")]
    DuplicateRepoId(String),
    #[error("duplicate plan id '{0}'")]
    DuplicatePlanId(String),
}

/// The complete set of configured repositories and plans at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields", into = "SnapshotFields")]
pub struct ConfigSnapshot {
    modno: u64,
    repos: Vec<Repository>,
    plans: Vec<Plan>,
    ui: UiRoot,
}

/// Serialized shape of a snapshot (`[[repo]]` / `[[plan]]` tables)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SnapshotFields {
    #[serde(default)]
    modno: u64,
    #[serde(default, rename = "repo")]
    repos: Vec<Repository>,
    #[serde(default, rename = "plan")]
    plans: Vec<Plan>,
    #[serde(flatten)]
    ui: UiRoot,
}

impl TryFrom<SnapshotFields> for ConfigSnapshot {
    type Error = ConfigError;

    fn try_from(fields: SnapshotFields) -> Result<Self, Self::Error> {
        let snapshot = ConfigSnapshot::new(fields.repos, fields.plans)?;
        Ok(snapshot.with_modno(fields.modno).with_ui(fields.ui))
    }
}

impl From<ConfigSnapshot> for SnapshotFields {
    fn from(snapshot: ConfigSnapshot) -> Self {
        SnapshotFields {
            modno: snapshot.modno,
            repos: snapshot.repos,
            plans: snapshot.plans,
            ui: snapshot.ui,
        }
    }
}

impl ConfigSnapshot {
    /// Build a snapshot, rejecting duplicate repository or plan ids
    pub fn new(repos: Vec<Repository>, plans: Vec<Plan>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for repo in &repos {
            if !seen.insert(repo.id.as_str()) {
                return Err(ConfigError::DuplicateRepoId(repo.id.clone()));
            }
        }
        let mut seen = HashSet::new();
        for plan in &plans {
            if !seen.insert(plan.id.as_str()) {
                return Err(ConfigError::DuplicatePlanId(plan.id.clone()));
            }
        }

        Ok(Self {
            modno: 0,
            repos,
            plans,
            ui: UiRoot::default(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_modno(mut self, modno: u64) -> Self {
        self.modno = modno;
        self
    }

    pub fn with_ui(mut self, ui: UiRoot) -> Self {
        self.ui = ui;
        self
    }

    /// Monotonic modification number of the configuration this was taken from
    pub fn modno(&self) -> u64 {
        self.modno
    }

    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn ui(&self) -> &UiRoot {
        &self.ui
    }

    /// Plans that write to the repository `repo_id`
    pub fn plans_for_repo<'a>(&'a self, repo_id: &'a str) -> impl Iterator<Item = &'a Plan> + 'a {
        self.plans.iter().filter(move |plan| plan.repo == repo_id)
    }
}
