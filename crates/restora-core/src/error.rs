// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the core crate

use restora_config_types::ConfigError;
use restora_domain_types::OperationId;
use thiserror::Error;

/// Failure delivering operation records to a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("operation feed transport failed: {0}")]
    Transport(String),
    #[error("operation feed rejected query for repository '{repo_id}': {reason}")]
    Rejected { repo_id: String, reason: String },
    #[error("operation feed closed")]
    Closed,
}

/// Errors returned by the operation log
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpLogError {
    #[error("operation {0} not found")]
    NotFound(OperationId),
    #[error("operation {0} already exists")]
    AlreadyExists(OperationId),
    #[error("operation must reference a repository")]
    MissingRepo,
}

/// Errors raised when replacing the configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid configuration snapshot: {0}")]
    Invalid(#[from] ConfigError),
    #[error("stale configuration: modno {offered} is older than current {current}")]
    Stale { current: u64, offered: u64 },
}
