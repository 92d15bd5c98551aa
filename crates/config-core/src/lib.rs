// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered configuration loading for Restora.
//!
//! Configuration is assembled from TOML files, `RESTORA_*` environment
//! variables and CLI `--set key=value` flags. Every layer is converted to
//! `serde_json::Value`, file layers are validated against the schema, and
//! the layers are merged in precedence order before typed extraction into a
//! [`ConfigSnapshot`].

pub mod build_env;
pub mod env;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod paths;
pub mod provenance;
pub mod schema;

pub use build_env::BuildInfo;
pub use provenance::{Provenance, Scope};
pub use schema::SchemaRoot;

use anyhow::{Context, Result};
use restora_config_types::ConfigSnapshot;
use serde_json::Value as J;

/// Final resolved configuration with provenance information
#[derive(Debug)]
pub struct Resolved {
    /// Final merged JSON configuration
    pub json: J,
    /// Which layer supplied each value
    pub provenance: Provenance,
}

impl Resolved {
    /// Typed snapshot of the merged configuration
    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        extract::snapshot(&self.json).context("extracting configuration snapshot")
    }
}

/// Load and merge all configuration layers according to precedence rules
///
/// Precedence order: system < user < env < cli-config < flags
pub fn load_all(paths: &paths::Paths, flag_sets: &[(&str, &str)]) -> Result<Resolved> {
    let read_optional = |path: &std::path::Path, scope: Scope| -> Result<Option<J>> {
        if path.exists() {
            Ok(Some(loader::read_layer_from_file(path, scope)?.json))
        } else {
            Ok(None)
        }
    };

    let system_layer = read_optional(&paths.system, Scope::System)?;
    let user_layer = read_optional(&paths.user, Scope::User)?;
    let env_layer = env::env_overlay()?;
    // An explicitly requested config file must exist.
    let cli_config_layer = match &paths.cli_config {
        Some(path) => Some(loader::read_layer_from_file(path, Scope::CliConfig)?.json),
        None => None,
    };
    let flags_layer = env::flags_overlay(flag_sets);

    let layers = [
        (system_layer, Scope::System),
        (user_layer, Scope::User),
        (Some(env_layer), Scope::Env),
        (cli_config_layer, Scope::CliConfig),
        (Some(flags_layer), Scope::Flags),
    ];

    let mut provenance = Provenance::default();
    let mut json = serde_json::json!({});
    for (layer, scope) in layers {
        if let Some(layer) = layer {
            provenance.record_layer(&layer, scope, "");
            merge::merge_two_json(&mut json, layer);
        }
    }

    Ok(Resolved { json, provenance })
}

/// Load every layer and extract the resulting snapshot
pub fn load_snapshot(paths: &paths::Paths, flag_sets: &[(&str, &str)]) -> Result<ConfigSnapshot> {
    let resolved = load_all(paths, flag_sets)?;
    let snapshot = resolved.snapshot()?;
    tracing::info!(
        modno = snapshot.modno(),
        repos = snapshot.repos().len(),
        plans = snapshot.plans().len(),
        "Configuration loaded"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const USER_TOML: &str = r#"
        operation-history-limit = 200

        [[repo]]
        id = "local"
        uri = "/mnt/backups"

        [[plan]]
        id = "home"
        repo = "local"
        paths = ["/home"]
    "#;

    #[test]
    fn test_toml_parsing() {
        let json = loader::parse_toml_to_json(USER_TOML).unwrap();
        assert_eq!(json["operation-history-limit"], 200);
        assert_eq!(json["repo"][0]["id"], "local");
    }

    #[test]
    fn test_schema_validation() {
        let json = loader::parse_toml_to_json(USER_TOML).unwrap();
        assert!(loader::validate_against_schema(&json).is_ok());
    }

    #[test]
    fn test_invalid_schema_validation() {
        let json = loader::parse_toml_to_json(
            r#"
            [[repo]]
            uri = "/missing/id"
        "#,
        )
        .unwrap();
        assert!(loader::validate_against_schema(&json).is_err());

        let json = loader::parse_toml_to_json(r#"default-history-tab = "sideways""#).unwrap();
        assert!(loader::validate_against_schema(&json).is_err());
    }

    #[test]
    fn test_merge_deep_objects() {
        let mut base = serde_json::json!({"a": {"b": 1}});
        merge::merge_two_json(&mut base, serde_json::json!({"a": {"c": 2}}));
        assert_eq!(base["a"]["b"], 1);
        assert_eq!(base["a"]["c"], 2);
    }

    #[test]
    fn test_merge_repo_collection_replaced() {
        let mut base = serde_json::json!({"repo": [{"id": "a"}, {"id": "b"}]});
        merge::merge_two_json(&mut base, serde_json::json!({"repo": [{"id": "c"}]}));
        assert_eq!(base["repo"], serde_json::json!([{"id": "c"}]));
    }

    #[test]
    fn test_insert_dotted() {
        let mut root = serde_json::json!({"ui": "scalar"});
        merge::insert_dotted(&mut root, "ui.nested.key", serde_json::json!(1));
        assert_eq!(root["ui"]["nested"]["key"], 1);
    }

    #[test]
    fn test_flags_overlay_types_values() {
        let overlay = env::flags_overlay(&[
            ("operation-history-limit", "50"),
            ("log-level", "debug"),
        ]);
        assert_eq!(overlay["operation-history-limit"], 50);
        assert_eq!(overlay["log-level"], "debug");
    }

    #[test]
    fn test_parse_flag_pair() {
        assert_eq!(
            env::parse_flag_pair("log-level=debug").unwrap(),
            ("log-level".to_string(), "debug".to_string())
        );
        assert!(env::parse_flag_pair("no-equals-sign").is_err());
        assert!(env::parse_flag_pair("=value").is_err());
    }

    #[test]
    fn test_env_overlay() {
        // No RESTORA_ variables are set in the test environment
        let overlay = env::env_overlay().unwrap();
        assert!(overlay.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_paths_honor_cli_config() {
        let temp_dir = TempDir::new().unwrap();
        let cli = temp_dir.path().join("custom.toml");
        let paths = paths::discover_paths(Some(&cli));
        assert_eq!(paths.cli_config.as_deref(), Some(cli.as_path()));
        assert!(paths.system.to_string_lossy().contains("restora"));
    }

    #[test]
    fn test_load_all_integration() {
        let temp_dir = TempDir::new().unwrap();
        let user_config_path = temp_dir.path().join("user.toml");
        std::fs::write(&user_config_path, USER_TOML).unwrap();

        let cli_config_path = temp_dir.path().join("cli.toml");
        std::fs::write(
            &cli_config_path,
            r#"
            [[repo]]
            id = "offsite"
            uri = "s3:https://backups.example.com/restora"
        "#,
        )
        .unwrap();

        let paths = paths::Paths {
            system: temp_dir.path().join("system.toml"), // doesn't exist
            user: user_config_path,
            cli_config: Some(cli_config_path),
        };

        let resolved = load_all(&paths, &[("log-level", "debug")]).unwrap();
        assert_eq!(resolved.json["operation-history-limit"], 200);
        assert_eq!(resolved.json["repo"][0]["id"], "offsite");
        assert_eq!(resolved.provenance.winner.get("repo"), Some(&Scope::CliConfig));
        assert_eq!(
            resolved.provenance.winner.get("operation-history-limit"),
            Some(&Scope::User)
        );
        assert_eq!(resolved.provenance.winner.get("log-level"), Some(&Scope::Flags));

        let snapshot = resolved.snapshot().unwrap();
        assert_eq!(snapshot.repos().len(), 1);
        assert_eq!(snapshot.repos()[0].id, "offsite");
        assert_eq!(snapshot.plans()[0].repo, "local");
        assert_eq!(snapshot.ui().log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_cli_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = paths::Paths {
            system: temp_dir.path().join("system.toml"),
            user: temp_dir.path().join("user.toml"),
            cli_config: Some(temp_dir.path().join("absent.toml")),
        };
        assert!(load_all(&paths, &[]).is_err());
    }
}
