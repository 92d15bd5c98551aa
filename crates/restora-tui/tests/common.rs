// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared test utilities for TUI tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use restora_config_types::{ConfigSnapshot, Repository};
use restora_core::mock_feed::ScriptedOperationFeed;
use restora_core::{ConfigSnapshotStore, RecordingAlertSink};
use restora_domain_types::{OperationId, OperationKind, OperationRecord, OperationStatus};
use restora_tui::theme::Theme;
use restora_tui::view::render_repo_view;
use restora_tui::{RepoViewDependencies, RepoViewModel, create_test_terminal};

pub const HISTORY_LIMIT: usize = 50;

pub fn repository(id: &str) -> Repository {
    Repository::new(id, format!("/srv/restic/{id}"))
}

pub fn snapshot_with(ids: &[&str]) -> ConfigSnapshot {
    ConfigSnapshot::new(ids.iter().map(|id| repository(id)).collect(), vec![])
        .expect("unique repository ids")
        .with_modno(1)
}

/// Store, scripted feed and alert sink wired the way the binary wires the
/// real ones
pub struct Harness {
    pub store: ConfigSnapshotStore,
    pub feed: Arc<ScriptedOperationFeed>,
    pub alerts: Arc<RecordingAlertSink>,
}

impl Harness {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            store: ConfigSnapshotStore::new(snapshot_with(ids)),
            feed: Arc::new(ScriptedOperationFeed::new()),
            alerts: Arc::new(RecordingAlertSink::new()),
        }
    }

    pub fn deps(&self, max_results: usize) -> RepoViewDependencies {
        RepoViewDependencies {
            config: self.store.clone(),
            feed: self.feed.clone(),
            alerts: self.alerts.clone(),
            max_results,
        }
    }

    pub fn view(&self, repo_id: &str) -> RepoViewModel {
        RepoViewModel::new(repo_id, self.deps(HISTORY_LIMIT))
    }

    /// Publish a new snapshot containing exactly `ids`
    pub fn set_repos(&self, ids: &[&str]) {
        self.store
            .update(ids.iter().map(|id| repository(id)).collect(), vec![])
            .expect("store update");
    }
}

/// A finished backup of `repo_id` started `minute` minutes after a fixed epoch
pub fn backup(repo_id: &str, id: i64, minute: i64) -> OperationRecord {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 2, 0, 0).unwrap() + Duration::minutes(minute);
    let mut record = OperationRecord::new(repo_id, OperationKind::Backup, start)
        .with_plan("nightly")
        .with_status(OperationStatus::Success);
    record.id = OperationId(id);
    record.flow_id = id;
    record.ended_at = Some(start + Duration::seconds(42));
    record
}

pub fn list_ids(view_model: &RepoViewModel) -> Vec<i64> {
    view_model
        .list()
        .map(|list| list.rows().iter().map(|r| r.id.0).collect())
        .unwrap_or_default()
}

/// Render `view_model` and return the screen as one string per line
pub fn render_lines(view_model: &RepoViewModel, width: u16, height: u16) -> Vec<String> {
    let mut terminal = create_test_terminal(width, height).expect("test terminal");
    let theme = Theme::default();
    terminal
        .draw(|frame| {
            let area = frame.area();
            render_repo_view(frame, area, view_model, &theme);
        })
        .expect("draw");

    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn render_text(view_model: &RepoViewModel) -> String {
    render_lines(view_model, 100, 24).join("\n")
}
