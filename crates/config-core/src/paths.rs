// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration file path discovery

use std::path::{Path, PathBuf};

/// Configuration file paths for different scopes
#[derive(Debug, Clone)]
pub struct Paths {
    pub system: PathBuf,
    pub user: PathBuf,
    pub cli_config: Option<PathBuf>,
}

/// Discover configuration file paths for the current environment
pub fn discover_paths(cli_config: Option<&Path>) -> Paths {
    Paths {
        system: get_system_config_path(),
        user: get_user_config_path(),
        cli_config: cli_config.map(Path::to_path_buf),
    }
}

fn get_system_config_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/restora/config.toml")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var("ProgramData").unwrap_or_else(|_| "C:\\ProgramData".into()))
            .join("restora")
            .join("config.toml")
    } else {
        PathBuf::from("/etc/restora/config.toml")
    }
}

/// User configuration path, honoring RESTORA_HOME
fn get_user_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("RESTORA_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    let home = || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()));
    if cfg!(target_os = "macos") {
        home().join("Library").join("Application Support").join("restora").join("config.toml")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var("APPDATA").unwrap_or_else(|_| "C:\\".into()))
            .join("restora")
            .join("config.toml")
    } else {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home().join(".config"))
            .join("restora")
            .join("config.toml")
    }
}
