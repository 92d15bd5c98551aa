// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Build and environment metadata shown by the UI

/// Version reported when no build version is provided
pub const DEV_BUILD_VERSION: &str = "dev-snapshot-build";

/// Operating system tag and build version of the running client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Lower-cased, trimmed `UI_OS` (empty when unset)
    pub os: String,
    /// Trimmed `RESTORA_BUILD_VERSION`, or [`DEV_BUILD_VERSION`]
    pub version: String,
}

impl BuildInfo {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let os = lookup("UI_OS").unwrap_or_default().trim().to_lowercase();
        // An empty value counts as unset; whitespace-only is kept and trimmed.
        let version = lookup("RESTORA_BUILD_VERSION")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEV_BUILD_VERSION.to_string())
            .trim()
            .to_string();
        Self { os, version }
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}
