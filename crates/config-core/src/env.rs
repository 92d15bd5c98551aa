// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Environment variable and CLI flag overlays

use anyhow::Result;
use serde_json::Value as J;

/// Create JSON overlay from RESTORA_* environment variables
///
/// `RESTORA_OPERATION_HISTORY_LIMIT=500` becomes
/// `{"operation-history-limit": 500}`; a double underscore nests keys.
pub fn env_overlay() -> Result<J> {
    let built = config::Config::builder()
        .add_source(
            config::Environment::with_prefix("RESTORA")
                .separator("__")
                .convert_case(config::Case::Kebab)
                .try_parsing(true),
        )
        .build()?;

    Ok(serde_json::to_value(
        built.try_deserialize::<serde_json::Map<String, J>>()?,
    )?)
}

/// Create JSON overlay from CLI flag key=value pairs
pub fn flags_overlay(kv_pairs: &[(&str, &str)]) -> J {
    let mut root = serde_json::json!({});
    for (k, v) in kv_pairs {
        crate::merge::insert_dotted(&mut root, k, parse_flag_value(v));
    }
    root
}

/// Flag values are typed the same way environment values are: integers,
/// floats and booleans are recognized, everything else stays a string.
fn parse_flag_value(v: &str) -> J {
    if let Ok(i) = v.parse::<i64>() {
        return J::from(i);
    }
    if let Ok(b) = v.parse::<bool>() {
        return J::Bool(b);
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() => J::from(f),
        _ => J::String(v.to_string()),
    }
}

/// Split a `key=value` CLI argument
pub fn parse_flag_pair(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => anyhow::bail!("expected key=value, got '{arg}'"),
    }
}
