// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository view model lifecycle: resolution, subscriptions and merging

mod common;

use common::{HISTORY_LIMIT, Harness, backup, list_ids};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use restora_core::{AlertLevel, FeedError, FeedEvent, OperationFeed};
use restora_domain_types::{MAX_OPERATION_HISTORY, OperationId, OperationQuery};
use restora_tui::{RepoViewModel, RepoViewMsg, ViewState};

#[test]
fn test_existing_repo_resolves_with_one_shared_query() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let vm = harness.view("repo1");

    let expected = OperationQuery::new("repo1", HISTORY_LIMIT);
    match vm.state() {
        ViewState::Resolved { repo, query } => {
            assert_eq!(repo.id, "repo1");
            assert_eq!(query, &expected);
        }
        ViewState::Deleted => panic!("repo1 should resolve"),
    }
    assert_eq!(vm.list_query(), Some(&expected));
    assert_eq!(vm.tree_query(), Some(&expected));
    assert_eq!(vm.list_query(), vm.tree_query());

    assert!(vm.is_subscribed());
    assert_eq!(harness.feed.subscribe_calls(), vec![expected]);
}

#[test]
fn test_missing_repo_is_deleted_without_subscription() {
    let harness = Harness::new(&["repo2"]);
    let vm = harness.view("repo1");

    assert!(vm.is_deleted());
    assert!(vm.query().is_none());
    assert!(vm.list().is_none());
    assert!(vm.tree().is_none());
    assert!(harness.feed.subscribe_calls().is_empty());
    assert_eq!(harness.feed.active_subscriptions(), 0);
}

#[test]
fn test_empty_repo_id_is_deleted() {
    let harness = Harness::new(&["repo1"]);
    let vm = harness.view("");
    assert!(vm.is_deleted());
    assert!(harness.feed.subscribe_calls().is_empty());
}

#[test]
fn test_repo_removed_while_open_releases_subscription() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let mut vm = harness.view("repo1");
    assert_eq!(harness.feed.active_subscriptions(), 1);

    harness.set_repos(&["repo2"]);
    assert!(vm.process_config_changes());

    assert!(vm.is_deleted());
    assert!(!vm.is_subscribed());
    assert_eq!(harness.feed.active_subscriptions(), 0);
}

#[test]
fn test_deleted_repo_stays_deleted_when_id_reappears() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");

    harness.set_repos(&[]);
    vm.update(RepoViewMsg::Tick);
    assert!(vm.is_deleted());

    harness.set_repos(&["repo1"]);
    vm.update(RepoViewMsg::Tick);
    assert!(vm.is_deleted());
    assert_eq!(harness.feed.subscribe_calls().len(), 1);
    assert_eq!(harness.feed.active_subscriptions(), 0);
}

#[test]
fn test_switching_to_another_repo_leaves_deleted_state() {
    let harness = Harness::new(&["repo2"]);
    let mut vm = harness.view("repo1");
    assert!(vm.is_deleted());

    vm.set_repo_id("repo2");
    assert_eq!(vm.repository().map(|r| r.id.as_str()), Some("repo2"));
    assert_eq!(harness.feed.live_queries(), vec![OperationQuery::new("repo2", HISTORY_LIMIT)]);
}

#[test]
fn test_switching_repos_releases_previous_subscription_first() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let mut vm = harness.view("repo1");

    vm.set_repo_id("repo2");

    assert_eq!(
        harness.feed.subscribe_calls(),
        vec![
            OperationQuery::new("repo1", HISTORY_LIMIT),
            OperationQuery::new("repo2", HISTORY_LIMIT),
        ]
    );
    assert_eq!(harness.feed.live_queries(), vec![OperationQuery::new("repo2", HISTORY_LIMIT)]);
}

#[test]
fn test_unrelated_config_change_keeps_subscription() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let mut vm = harness.view("repo1");
    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 1, 0)]));
    vm.process_feed_events();

    harness.set_repos(&["repo1", "repo3"]);
    assert!(vm.process_config_changes());

    assert_eq!(harness.feed.subscribe_calls().len(), 1);
    assert_eq!(harness.feed.active_subscriptions(), 1);
    assert_eq!(list_ids(&vm), vec![1]);
}

#[test]
fn test_config_without_changes_is_not_reprocessed() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    assert!(!vm.process_config_changes());
}

#[test]
fn test_empty_feed_batch_is_a_loaded_empty_history() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    assert!(!vm.list().unwrap().is_loaded());

    harness
        .feed
        .push_to(&OperationQuery::new("repo1", 50), FeedEvent::Upserted(vec![]));
    assert!(vm.process_feed_events());

    let list = vm.list().unwrap();
    let tree = vm.tree().unwrap();
    assert!(list.is_loaded() && list.is_empty());
    assert!(tree.is_loaded() && tree.is_empty());
    assert!(vm.feed_error().is_none());
    assert!(harness.alerts.is_empty());
}

#[test]
fn test_incremental_updates_merge_into_both_projections() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");

    harness
        .feed
        .push(FeedEvent::Upserted(vec![backup("repo1", 1, 0), backup("repo1", 2, 10)]));
    vm.process_feed_events();
    assert_eq!(list_ids(&vm), vec![2, 1]);

    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 3, 20)]));
    vm.update(RepoViewMsg::Tick);

    assert_eq!(list_ids(&vm), vec![3, 2, 1]);
    assert_eq!(vm.tree().unwrap().operation_count(), 3);

    harness.feed.push(FeedEvent::Deleted(vec![OperationId(2)]));
    vm.update(RepoViewMsg::Tick);
    assert_eq!(list_ids(&vm), vec![3, 1]);
    assert_eq!(vm.tree().unwrap().operation_count(), 2);
}

#[test]
fn test_oversized_batch_is_truncated_to_limit() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = RepoViewModel::new("repo1", harness.deps(5));

    let batch = (1..=12).map(|id| backup("repo1", id, id)).collect();
    harness.feed.push(FeedEvent::Upserted(batch));
    vm.process_feed_events();

    assert_eq!(list_ids(&vm), vec![12, 11, 10, 9, 8]);
    assert_eq!(vm.tree().unwrap().operation_count(), 5);
}

#[test]
fn test_foreign_records_are_ignored() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let mut vm = harness.view("repo1");

    harness
        .feed
        .push(FeedEvent::Upserted(vec![backup("repo1", 1, 0), backup("repo2", 2, 5)]));
    vm.process_feed_events();
    assert_eq!(list_ids(&vm), vec![1]);
}

#[test]
fn test_feed_failure_alerts_once_and_keeps_history() {
    let harness = Harness::new(&["repo1"]);
    let mut vm = harness.view("repo1");
    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 1, 0)]));
    vm.process_feed_events();

    let error = FeedError::Transport("connection reset".into());
    harness.feed.fail(error.clone());
    harness.feed.fail(error.clone());
    vm.process_feed_events();

    assert_eq!(vm.feed_error(), Some(&error));
    assert_eq!(list_ids(&vm), vec![1]);
    assert_eq!(harness.alerts.len(), 1);
    let alert = harness.alerts.latest().unwrap();
    assert_eq!(alert.level, AlertLevel::Error);
    assert!(alert.message.contains("connection reset"));

    harness.feed.push(FeedEvent::Upserted(vec![backup("repo1", 2, 5)]));
    vm.process_feed_events();
    assert!(vm.feed_error().is_none());
    assert_eq!(list_ids(&vm), vec![2, 1]);
}

#[test]
fn test_failed_subscribe_can_be_retried() {
    let harness = Harness::new(&["repo1"]);
    harness.feed.fail_next_subscribe(FeedError::Closed);

    let mut vm = harness.view("repo1");
    assert!(!vm.is_deleted());
    assert!(!vm.is_subscribed());
    assert_eq!(vm.feed_error(), Some(&FeedError::Closed));
    assert_eq!(harness.alerts.len(), 1);

    assert!(vm.retry_subscription());
    assert!(vm.is_subscribed());
    assert_eq!(harness.feed.active_subscriptions(), 1);
}

#[test]
fn test_teardown_and_drop_release_subscription() {
    let harness = Harness::new(&["repo1"]);

    let mut vm = harness.view("repo1");
    vm.teardown();
    assert_eq!(harness.feed.active_subscriptions(), 0);

    let vm = harness.view("repo1");
    assert_eq!(harness.feed.active_subscriptions(), 1);
    drop(vm);
    assert_eq!(harness.feed.active_subscriptions(), 0);
}

#[test]
fn test_view_model_observes_store_subscription_lifecycle() {
    let harness = Harness::new(&["repo1"]);
    let before = harness.store.subscriber_count();
    let vm = harness.view("repo1");
    assert_eq!(harness.store.subscriber_count(), before + 1);
    drop(vm);
    assert_eq!(harness.store.subscriber_count(), before);
}

#[test]
fn test_parent_chain_filling_the_window_builds_a_tree() {
    let harness = Harness::new(&["repo1"]);
    let limit = MAX_OPERATION_HISTORY;
    let mut vm = RepoViewModel::new("repo1", harness.deps(limit));

    let chain = (1..=limit as i64)
        .map(|id| {
            let record = backup("repo1", id, id);
            if id > 1 { record.with_parent(OperationId(id - 1)) } else { record }
        })
        .collect();
    harness.feed.push(FeedEvent::Upserted(chain));
    assert!(vm.process_feed_events());

    let tree = vm.tree().unwrap();
    assert_eq!(tree.operation_count(), limit);
    assert_eq!(tree.rows().len(), limit + 1);
    assert_eq!(vm.list().unwrap().len(), limit);

    vm.teardown();
    drop(vm);
}

#[test]
fn test_resize_applies_to_tree_created_later() {
    let harness = Harness::new(&["repo1", "repo2"]);
    let mut vm = harness.view("repo1");
    vm.update(RepoViewMsg::Resize { rows: 3 });

    vm.set_repo_id("repo2");
    let batch = (1..=10).map(|id| backup("repo2", id, id)).collect();
    harness.feed.push(FeedEvent::Upserted(batch));
    vm.process_feed_events();
    for _ in 0..6 {
        vm.update(RepoViewMsg::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
    }

    let tree = vm.tree().unwrap();
    assert_eq!(tree.selected_index(), Some(6));
    assert_eq!(tree.scroll_offset(), 4);
}
