// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Show the operation history of one configured repository.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config_core::BuildInfo;
use restora_core::operation_wire::records_from_json;
use restora_core::{ConfigSnapshotStore, OpLog, TracingAlertSink, MAX_OPERATION_HISTORY};
use restora_logging::{CliLogLevel, logging_config::LoggingConfig};
use restora_tui::{ConfigReloader, RepoViewDependencies, RepoViewModel, UiRuntime, run_repo_view};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "restora-tui", about = "Browse a repository's backup operation history")]
struct Args {
    /// Id of the repository to show
    #[arg(long)]
    repo: String,

    /// Configuration file layered over the system and user files
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a configuration value (`key=value`, repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Seed the operation log from a JSON array of operations
    #[arg(long)]
    operations: Option<PathBuf>,

    /// Logging options
    #[command(flatten)]
    logging: restora_logging::CliLoggingArgs,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let flags = args
        .set
        .iter()
        .map(|arg| config_core::env::parse_flag_pair(arg.as_str()))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let flag_refs: Vec<(&str, &str)> = flags.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let paths = config_core::paths::discover_paths(args.config.as_deref());
    let snapshot = config_core::load_snapshot(&paths, &flag_refs).context("loading configuration")?;

    let configured_level = LoggingConfig {
        level: snapshot.ui().log_level.clone(),
    }
    .cli_level()
    .unwrap_or(CliLogLevel::Info);
    args.logging.clone().init_with_default_level("restora-tui", true, configured_level)?;

    let build = BuildInfo::from_env();
    info!(
        version = %build.version,
        os = %build.os,
        repo_id = %args.repo,
        modno = snapshot.modno(),
        "Starting restora-tui"
    );

    let oplog = Arc::new(OpLog::new());
    if let Some(path) = &args.operations {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading operations from {}", path.display()))?;
        let records = records_from_json(&json)
            .with_context(|| format!("decoding operations from {}", path.display()))?;
        let ids = oplog.bulk_add(records)?;
        info!(count = ids.len(), path = %path.display(), "Seeded operation log");
    }

    let max_results = snapshot.ui().operation_history_limit.unwrap_or(MAX_OPERATION_HISTORY);
    let store = ConfigSnapshotStore::new(snapshot);
    let reloader = ConfigReloader::new(paths, flags, store.clone())?;

    let view_model = RepoViewModel::new(
        args.repo,
        RepoViewDependencies {
            config: store,
            feed: oplog,
            alerts: Arc::new(TracingAlertSink),
            max_results,
        },
    );

    UiRuntime::run(async move { run_repo_view(view_model, Some(reloader)).await })
}
