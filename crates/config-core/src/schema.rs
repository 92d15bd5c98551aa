// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Schema root definition for configuration validation.
//!
//! This type describes the canonical shape of a configuration file and is
//! used only for schema generation and validation. Configuration is read
//! through the typed views in `restora-config-types`.

use restora_config_types::{Plan, Repository, UiRoot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SchemaRoot {
    /// UI settings are flattened into root properties
    #[serde(flatten)]
    pub ui: UiRoot,

    /// Modification number, bumped by whatever writes the file
    pub modno: Option<u64>,

    #[serde(default)]
    pub repo: Vec<Repository>,
    #[serde(default)]
    pub plan: Vec<Plan>,
}
