// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded operation-history queries

use serde::{Deserialize, Serialize};

use crate::operation::OperationRecord;

/// Default cap on the number of operations fetched for one history view
pub const MAX_OPERATION_HISTORY: usize = 10_000;

/// A bounded request for one repository's operation history.
///
/// Queries compare by value, so two views built from the same repository and
/// bound observe exactly the same window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationQuery {
    repo_id: String,
    max_results: usize,
}

impl OperationQuery {
    pub fn new(repo_id: impl Into<String>, max_results: usize) -> Self {
        Self {
            repo_id: repo_id.into(),
            max_results,
        }
    }

    /// Query with the default history bound
    pub fn for_repo(repo_id: impl Into<String>) -> Self {
        Self::new(repo_id, MAX_OPERATION_HISTORY)
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Whether `record` belongs to the history this query describes
    pub fn matches(&self, record: &OperationRecord) -> bool {
        record.repo_id == self.repo_id
    }
}
