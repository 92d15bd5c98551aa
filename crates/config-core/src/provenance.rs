// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Provenance tracking for configuration values

use serde_json::Value as J;
use std::collections::BTreeMap;

/// Configuration scope, in precedence order (later scopes win)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Scope {
    System,
    User,
    Env,
    CliConfig,
    Flags,
}

/// Which layer supplied each configuration value
#[derive(Default, Clone, Debug)]
pub struct Provenance {
    /// Maps dotted key paths to the winning scope
    pub winner: BTreeMap<String, Scope>,
    /// Maps dotted key paths to change history [(scope, value)]
    pub changes: BTreeMap<String, Vec<(Scope, J)>>,
}

impl Provenance {
    /// Record every leaf value of `layer` as supplied by `scope`.
    ///
    /// Arrays are recorded as a single value since merging replaces them
    /// wholesale.
    pub fn record_layer(&mut self, layer: &J, scope: Scope, prefix: &str) {
        match layer {
            J::Object(obj) => {
                for (k, v) in obj {
                    let pfx = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    self.record_layer(v, scope, &pfx);
                }
            }
            J::Null => {}
            _ => {
                self.winner.insert(prefix.to_string(), scope);
                self.changes.entry(prefix.to_string()).or_default().push((scope, layer.clone()));
            }
        }
    }
}
