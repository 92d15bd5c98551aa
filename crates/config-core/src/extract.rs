// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed extraction from the merged configuration

use anyhow::Result;
use restora_config_types::ConfigSnapshot;
use serde::de::DeserializeOwned;
use serde_json::Value as J;

/// Deserialize `value`, naming the offending field path on failure
pub fn typed<T: DeserializeOwned>(value: &J, what: &str) -> Result<T> {
    serde_path_to_error::deserialize(value.clone()).map_err(|e| {
        let path = e.path().to_string();
        anyhow::anyhow!("invalid {what} at '{path}': {}", e.into_inner())
    })
}

/// The repository and plan snapshot described by the merged layers
pub fn snapshot(root: &J) -> Result<ConfigSnapshot> {
    typed(root, "configuration")
}
