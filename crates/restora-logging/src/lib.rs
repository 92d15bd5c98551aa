// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized logging utilities for Restora
//!
//! Every binary initializes `tracing` through this crate so that log level
//! handling, output format and log file locations stay consistent.

pub mod logging_config;

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export clap for convenience when using CliLoggingArgs
pub use clap;

// Re-export Level for convenience
pub use tracing::Level;

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON format
    Json,
}

/// CLI log level enum for clap integration
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    /// Only error conditions
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and informational messages
    #[default]
    Info,
    /// All above plus debug information
    Debug,
    /// All above plus detailed tracing
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for CliLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(CliLogLevel::Error),
            "warn" | "warning" => Ok(CliLogLevel::Warn),
            "info" => Ok(CliLogLevel::Info),
            "debug" => Ok(CliLogLevel::Debug),
            "trace" => Ok(CliLogLevel::Trace),
            other => Err(format!("Invalid log level: {other}")),
        }
    }
}

/// Standardized CLI logging arguments, meant for `#[command(flatten)]`.
///
/// TUI binaries always log to a file. Other binaries log to the console
/// unless `--log-file` or `--log-dir` is given.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level
    #[arg(long, value_enum, help = "Log verbosity level (default: info)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format
    #[arg(long, value_enum, help = "Log output format (default: plaintext)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,

    /// Directory for log files
    #[arg(long, help = "Directory for log files (default: platform specific)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Log filename
    #[arg(long, help = "Log filename")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl CliLoggingArgs {
    /// Initialize logging for `component`
    pub fn init(self, component: &str, is_tui: bool) -> anyhow::Result<()> {
        self.init_with_default_level(component, is_tui, CliLogLevel::Info)
    }

    /// Like [`CliLoggingArgs::init`], with the level used when `--log-level`
    /// is absent (typically taken from the configuration file).
    pub fn init_with_default_level(
        self,
        component: &str,
        is_tui: bool,
        default_level: CliLogLevel,
    ) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or(default_level).into();
        let format = self.log_format.unwrap_or_default();

        if self.logs_to_file(is_tui) {
            let log_path = self.resolve_log_path(component);
            init_to_file(component, level, format, &log_path)
        } else {
            init(component, level, format)
        }
    }

    fn logs_to_file(&self, is_tui: bool) -> bool {
        is_tui || self.log_file.is_some() || self.log_dir.is_some()
    }

    /// Resolve the log file path:
    /// 1. an absolute `log_file` is used as is
    /// 2. a relative `log_file` is placed under `log_dir` when given
    /// 3. otherwise `<log_dir or standard dir>/<component>.log`
    fn resolve_log_path(&self, component: &str) -> PathBuf {
        let default_name = format!("{component}.log");
        match (&self.log_file, &self.log_dir) {
            (Some(file), _) if Path::new(file).is_absolute() => PathBuf::from(file),
            (Some(file), Some(dir)) => Path::new(dir).join(file),
            (Some(file), None) if Path::new(file).parent().is_some_and(|p| !p.as_os_str().is_empty()) => {
                PathBuf::from(file)
            }
            (Some(file), None) => standard_log_dir().join(file),
            (None, Some(dir)) => Path::new(dir).join(default_name),
            (None, None) => standard_log_dir().join(default_name),
        }
    }
}

/// Platform-specific directory for Restora log files
///
/// - Windows: %APPDATA%\restora
/// - macOS: ~/Library/Logs/restora
/// - Linux and others: ~/.local/share/restora
pub fn standard_log_dir() -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));

    #[cfg(target_os = "macos")]
    let base = home().join("Library").join("Logs");

    #[cfg(not(target_os = "macos"))]
    let base = dirs::data_dir().unwrap_or_else(home);

    base.join("restora")
}

/// Initialize console logging
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stdout)
}

/// Initialize logging to a file, creating its directory when missing
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    use std::fs;

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = fs::OpenOptions::new().create(true).append(true).open(log_path)?;

    init_with_writer(component, default_level, format, std::sync::Mutex::new(log_file))
}

/// Initialize logging with a custom writer
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Filter directive used when `RUST_LOG` is not set.
///
/// Crate targets use underscores, so `restora-tui` also enables
/// `restora_tui` at the requested level.
fn default_filter(component: &str, level: Level) -> String {
    format!("{level},{}={level}", component.replace('-', "_"))
}
