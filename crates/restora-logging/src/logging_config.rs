// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging configuration types

use serde::{Deserialize, Serialize};

use crate::CliLogLevel;

/// Logging section of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging verbosity level
    #[serde(rename = "log-level")]
    pub level: Option<String>,
}

impl LoggingConfig {
    /// Parse the configured level, ignoring values clap would reject
    pub fn cli_level(&self) -> Option<CliLogLevel> {
        self.level.as_deref().and_then(|s| s.parse().ok())
    }
}
