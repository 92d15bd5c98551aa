// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository configuration types

use serde::{Deserialize, Serialize};

/// A configured backup repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct Repository {
    /// Unique, stable identifier
    pub id: String,
    /// Repository location (local path or restic backend URI)
    pub uri: String,
    /// Name of the environment variable that holds the repository password
    pub password_env: Option<String>,
    /// Extra environment entries (`KEY=VALUE`) passed to the backup tool
    #[serde(default)]
    pub env: Vec<String>,
    /// Extra command-line flags passed to the backup tool
    #[serde(default)]
    pub flags: Vec<String>,
    pub prune_policy: Option<PrunePolicy>,
    pub check_policy: Option<CheckPolicy>,
    /// Remove stale locks before running operations
    #[serde(default)]
    pub auto_unlock: bool,
}

impl Repository {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            password_env: None,
            env: Vec::new(),
            flags: Vec::new(),
            prune_policy: None,
            check_policy: None,
            auto_unlock: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct PrunePolicy {
    /// Cron expression
    pub schedule: Option<String>,
    /// Repack when more than this share of the repository is unused
    pub max_unused_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct CheckPolicy {
    /// Cron expression
    pub schedule: Option<String>,
    /// Percentage of pack data read back during a check (0 = structure only)
    pub read_data_subset_percent: Option<f64>,
}
