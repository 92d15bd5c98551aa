// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! UI-related configuration types

use serde::{Deserialize, Serialize};

/// Root-level UI settings that get flattened into the main config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct UiRoot {
    /// Log level
    pub log_level: Option<String>,
    /// Maximum number of operations shown in a history view
    pub operation_history_limit: Option<usize>,
    /// Tab shown first in the repository view
    pub default_history_tab: Option<HistoryTabSetting>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryTabSetting {
    Tree,
    List,
}
