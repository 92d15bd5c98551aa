// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reload configuration files into the snapshot store when they change
//!
//! The directories holding the configuration files are watched rather than
//! the files themselves, so files that do not exist yet and editors that
//! replace a file by renaming over it are both noticed. Change signals are
//! coalesced into a single pending reload.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use config_core::paths::Paths;
use crossbeam_channel as chan;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use restora_core::ConfigSnapshotStore;
use tracing::{debug, info};

/// Watches the configuration files and republishes the snapshot after they
/// are created, modified or removed.
pub struct ConfigReloader {
    paths: Paths,
    flags: Vec<(String, String)>,
    store: ConfigSnapshotStore,
    changes: chan::Receiver<()>,
    _watcher: RecommendedWatcher,
}

impl ConfigReloader {
    pub fn new(
        paths: Paths,
        flags: Vec<(String, String)>,
        store: ConfigSnapshotStore,
    ) -> anyhow::Result<Self> {
        let files = watched_files(&paths)?;
        let (tx, changes) = chan::bounded(1);

        let watched = files.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let Ok(event) = res else { return };
                if touches_config(&event, &watched) {
                    // a full channel already holds a pending reload
                    let _ = tx.try_send(());
                }
            },
            Config::default(),
        )
        .context("creating configuration watcher")?;

        let dirs: BTreeSet<&Path> = files.iter().filter_map(|file| file.parent()).collect();
        for dir in dirs {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "Configuration directory missing, not watched");
                continue;
            }
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("watching {}", dir.display()))?;
        }

        Ok(Self {
            paths,
            flags,
            store,
            changes,
            _watcher: watcher,
        })
    }

    /// Signals one pending change of the configuration files
    pub fn changes(&self) -> &chan::Receiver<()> {
        &self.changes
    }

    /// Block up to `timeout` for a change of the configuration files
    pub fn wait_for_change(&self, timeout: Duration) -> bool {
        self.changes.recv_timeout(timeout).is_ok()
    }

    /// Load every layer again and publish the result. Returns the new modno.
    ///
    /// Files rarely carry a modno of their own, so a loaded snapshot that is
    /// not newer than the current one is renumbered after it.
    pub fn reload(&self) -> anyhow::Result<u64> {
        let flags: Vec<(&str, &str)> =
            self.flags.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let loaded = config_core::load_snapshot(&self.paths, &flags)?;

        let current = self.store.current().modno();
        let snapshot = if loaded.modno() > current {
            loaded
        } else {
            loaded.with_modno(current + 1)
        };
        let modno = snapshot.modno();
        self.store.replace(snapshot).context("publishing reloaded configuration")?;
        info!(modno, "Configuration reloaded");
        Ok(modno)
    }
}

/// Absolute file paths as the watcher reports them; existing parent
/// directories are canonicalized since events carry resolved paths.
fn watched_files(paths: &Paths) -> anyhow::Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut files = vec![paths.system.as_path(), paths.user.as_path()];
    files.extend(paths.cli_config.as_deref());
    Ok(files
        .into_iter()
        .map(|file| {
            let file = cwd.join(file);
            match (file.parent().map(Path::canonicalize), file.file_name()) {
                (Some(Ok(dir)), Some(name)) => dir.join(name),
                _ => file,
            }
        })
        .collect())
}

fn touches_config(event: &Event, files: &[PathBuf]) -> bool {
    !matches!(event.kind, EventKind::Access(_))
        && event.paths.iter().any(|path| files.contains(path))
}
