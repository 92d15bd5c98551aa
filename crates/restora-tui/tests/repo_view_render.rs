// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Rendering of the repository page against a TestBackend

mod common;

use common::{Harness, backup, render_lines, render_text};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use restora_core::{FeedError, FeedEvent};
use restora_domain_types::OperationId;
use restora_tui::view::repo_view::{
    DELETED_NOTICE, EMPTY_HISTORY_NOTICE, LIST_HEADING, LOADING_NOTICE, TREE_HEADING,
};
use restora_tui::{HistoryTab, RepoViewMsg};

fn key(code: KeyCode) -> RepoViewMsg {
    RepoViewMsg::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

#[test]
fn resolved_repo_shows_header_and_both_tabs() {
    let harness = Harness::new(&["repo1"]);
    let vm = harness.view("repo1");

    let text = render_text(&vm);
    assert!(text.contains("repo1"));
    assert!(text.contains("/srv/restic/repo1"));
    assert!(text.contains("Tree View"));
    assert!(text.contains("Operation List"));
    assert!(!text.contains(DELETED_NOTICE));
}

#[test]
fn deleted_repo_renders_only_the_notice() {
    let harness = Harness::new(&["repo2"]);
    let vm = harness.view("repo1");

    let lines = render_lines(&vm, 80, 20);
    let non_empty: Vec<&str> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    assert_eq!(non_empty, vec![DELETED_NOTICE]);
}

#[test]
fn deletion_while_open_switches_to_notice() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    assert!(render_text(&vm).contains("Tree View"));

    harness.set_repos(&[]);
    vm.update(RepoViewMsg::Tick);

    let text = render_text(&vm);
    assert!(text.contains(DELETED_NOTICE));
    assert!(!text.contains("Tree View"));
}

#[test]
fn history_shows_loading_until_first_batch() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    assert!(render_text(&vm).contains(LOADING_NOTICE));

    harness.feed.push(FeedEvent::Upserted(vec![]));
    vm.update(RepoViewMsg::Tick);
    let tree_text = render_text(&vm);
    assert!(tree_text.contains(TREE_HEADING));
    assert!(tree_text.contains(EMPTY_HISTORY_NOTICE));

    vm.update(key(KeyCode::Tab));
    let list_text = render_text(&vm);
    assert!(list_text.contains(LIST_HEADING));
    assert!(list_text.contains(EMPTY_HISTORY_NOTICE));
    assert!(!list_text.contains(LOADING_NOTICE));
}

#[test]
fn list_tab_shows_operations_with_plan_annotation() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    vm.update(key(KeyCode::Tab));
    assert_eq!(vm.active_tab(), HistoryTab::List);

    harness
        .feed
        .push(FeedEvent::Upserted(vec![backup("repo1", 1, 0), backup("repo1", 2, 90)]));
    vm.update(RepoViewMsg::Tick);

    let lines = render_lines(&vm, 100, 24);
    let newer = lines.iter().position(|l| l.contains("2025-03-01 03:30")).unwrap();
    let older = lines.iter().position(|l| l.contains("2025-03-01 02:00")).unwrap();
    assert!(newer < older);
    assert!(lines[newer].contains("backup"));
    assert!(lines[newer].contains("success"));
    assert!(lines[newer].contains("[nightly]"));
    assert!(lines[newer].contains("42s"));

    let text = lines.join("\n");
    assert!(text.contains("2 operations (limit 50)"));
}

#[test]
fn incremental_update_keeps_rendered_entries() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    vm.update(key(KeyCode::Tab));

    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 1, 0)]));
    vm.update(RepoViewMsg::Tick);
    assert!(render_text(&vm).contains("2025-03-01 02:00"));

    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 2, 30)]));
    vm.update(RepoViewMsg::Tick);
    let text = render_text(&vm);
    assert!(text.contains("2025-03-01 02:00"));
    assert!(text.contains("2025-03-01 02:30"));
}

#[test]
fn tree_tab_groups_operations_by_plan() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");

    let mut unplanned = backup("repo1", 3, 60);
    unplanned.plan_id = None;
    let child = backup("repo1", 2, 5).with_parent(OperationId(1));
    harness
        .feed
        .push(FeedEvent::Upserted(vec![backup("repo1", 1, 0), child, unplanned]));
    vm.update(RepoViewMsg::Tick);

    let lines = render_lines(&vm, 100, 24);
    let nightly = lines.iter().position(|l| l.contains("nightly (2)")).unwrap();
    let unassigned = lines.iter().position(|l| l.contains("unassigned (1)")).unwrap();
    assert!(nightly < unassigned);
}

#[test]
fn feed_failure_is_shown_in_status_line() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 1, 0)]));
    harness.feed.fail(FeedError::Transport("connection reset".into()));
    vm.update(RepoViewMsg::Tick);

    let text = render_text(&vm);
    assert!(text.contains("connection reset"));
    assert!(text.contains("2025-03-01 02:00"));
}
