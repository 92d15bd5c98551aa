// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository history view model
//!
//! Keeps one repository page consistent with the live configuration:
//!
//! - every observed configuration change or repository id change
//!   re-resolves the repository against the latest snapshot
//! - a repository that cannot be resolved puts the page in
//!   [`ViewState::Deleted`]; no query is built and no feed subscription is
//!   held in that state
//! - a resolved repository gets exactly one [`OperationQuery`], shared by
//!   value with the list and tree projections, and exactly one feed
//!   subscription whose events are fanned out to both
//!
//! The query is memoized by value. Re-resolving to an equal query keeps the
//! live subscription; a different query releases the old subscription before
//! the new one is opened.

use std::collections::HashSet;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use restora_config_types::{HistoryTabSetting, Repository};
use restora_core::repo_resolver::{self, Resolution};
use restora_core::{
    Alert, AlertLevel, AlertSink, ConfigSnapshotStore, ConfigSubscription, FeedError, FeedEvent,
    OperationFeed, OperationSubscription,
};
use restora_domain_types::OperationQuery;
use tracing::{debug, info, warn};

use super::operation_list::OperationListModel;
use super::operation_tree::OperationTreeModel;

const ALERT_SOURCE: &str = "repo_view";

/// Collaborators injected into a [`RepoViewModel`]
#[derive(Clone)]
pub struct RepoViewDependencies {
    pub config: ConfigSnapshotStore,
    pub feed: Arc<dyn OperationFeed>,
    pub alerts: Arc<dyn AlertSink>,
    /// Bound applied to every history query
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Resolved {
        repo: Repository,
        query: OperationQuery,
    },
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryTab {
    #[default]
    Tree,
    List,
}

impl HistoryTab {
    pub const ALL: [HistoryTab; 2] = [HistoryTab::Tree, HistoryTab::List];

    pub fn title(self) -> &'static str {
        match self {
            HistoryTab::Tree => "Tree View",
            HistoryTab::List => "Operation List",
        }
    }

    pub fn index(self) -> usize {
        match self {
            HistoryTab::Tree => 0,
            HistoryTab::List => 1,
        }
    }

    fn other(self) -> Self {
        match self {
            HistoryTab::Tree => HistoryTab::List,
            HistoryTab::List => HistoryTab::Tree,
        }
    }
}

impl From<HistoryTabSetting> for HistoryTab {
    fn from(setting: HistoryTabSetting) -> Self {
        match setting {
            HistoryTabSetting::Tree => HistoryTab::Tree,
            HistoryTabSetting::List => HistoryTab::List,
        }
    }
}

/// Messages processed by [`RepoViewModel::update`]
#[derive(Debug, Clone, PartialEq)]
pub enum RepoViewMsg {
    Key(KeyEvent),
    /// Periodic poll for configuration and feed changes
    Tick,
    /// The history area was resized to `rows` visible lines
    Resize { rows: u16 },
}

/// Both projections of one query and the subscription feeding them
struct HistoryProjections {
    query: OperationQuery,
    subscription: Option<OperationSubscription>,
    list: OperationListModel,
    tree: OperationTreeModel,
}

impl HistoryProjections {
    fn new(query: OperationQuery, viewport_rows: usize) -> Self {
        let mut projections = Self {
            list: OperationListModel::new(query.clone(), true),
            tree: OperationTreeModel::new(query.clone()),
            query,
            subscription: None,
        };
        projections.set_viewport_rows(viewport_rows);
        projections
    }

    fn set_viewport_rows(&mut self, rows: usize) {
        self.list.set_viewport_rows(rows);
        self.tree.set_viewport_rows(rows);
    }
}

pub struct RepoViewModel {
    repo_id: String,
    config: ConfigSubscription,
    feed: Arc<dyn OperationFeed>,
    alerts: Arc<dyn AlertSink>,
    max_results: usize,

    state: ViewState,
    projections: Option<HistoryProjections>,
    /// Ids observed as deleted this session; they never resolve again
    deleted_ids: HashSet<String>,
    feed_error: Option<FeedError>,
    active_tab: HistoryTab,
    viewport_rows: usize,

    pub needs_redraw: bool,
    exit_requested: bool,
}

impl RepoViewModel {
    pub fn new(repo_id: impl Into<String>, deps: RepoViewDependencies) -> Self {
        let config = deps.config.subscribe();
        let active_tab = config
            .peek()
            .ui()
            .default_history_tab
            .map(HistoryTab::from)
            .unwrap_or_default();

        let mut view_model = Self {
            repo_id: repo_id.into(),
            config,
            feed: deps.feed,
            alerts: deps.alerts,
            max_results: deps.max_results,
            state: ViewState::Deleted,
            projections: None,
            deleted_ids: HashSet::new(),
            feed_error: None,
            active_tab,
            viewport_rows: 0,
            needs_redraw: true,
            exit_requested: false,
        };
        view_model.reconcile();
        view_model.process_feed_events();
        view_model
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_deleted(&self) -> bool {
        self.state == ViewState::Deleted
    }

    pub fn repository(&self) -> Option<&Repository> {
        match &self.state {
            ViewState::Resolved { repo, .. } => Some(repo),
            ViewState::Deleted => None,
        }
    }

    pub fn query(&self) -> Option<&OperationQuery> {
        match &self.state {
            ViewState::Resolved { query, .. } => Some(query),
            ViewState::Deleted => None,
        }
    }

    /// Query the list projection was built from
    pub fn list_query(&self) -> Option<&OperationQuery> {
        self.projections.as_ref().map(|p| p.list.query())
    }

    /// Query the tree projection was built from
    pub fn tree_query(&self) -> Option<&OperationQuery> {
        self.projections.as_ref().map(|p| p.tree.query())
    }

    pub fn list(&self) -> Option<&OperationListModel> {
        self.projections.as_ref().map(|p| &p.list)
    }

    pub fn tree(&self) -> Option<&OperationTreeModel> {
        self.projections.as_ref().map(|p| &p.tree)
    }

    /// Whether a feed subscription is currently held
    pub fn is_subscribed(&self) -> bool {
        self.projections.as_ref().is_some_and(|p| p.subscription.is_some())
    }

    /// Last feed failure, cleared when records arrive again
    pub fn feed_error(&self) -> Option<&FeedError> {
        self.feed_error.as_ref()
    }

    pub fn active_tab(&self) -> HistoryTab {
        self.active_tab
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Re-resolve if the configuration changed since the last look.
    /// Returns whether a change was processed.
    pub fn process_config_changes(&mut self) -> bool {
        if !self.config.has_changed() {
            return false;
        }
        self.reconcile();
        true
    }

    /// Re-resolve against the latest configuration unconditionally
    pub fn on_config_changed(&mut self) {
        self.reconcile();
    }

    /// Point the view at another repository
    pub fn set_repo_id(&mut self, repo_id: impl Into<String>) {
        let repo_id = repo_id.into();
        if repo_id == self.repo_id {
            return;
        }
        info!(from = %self.repo_id, to = %repo_id, "Repository view switched");
        self.repo_id = repo_id;
        self.feed_error = None;
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let snapshot = self.config.latest();
        let resolution = if self.deleted_ids.contains(&self.repo_id) {
            Resolution::NotFound
        } else {
            repo_resolver::resolve(&snapshot, &self.repo_id)
        };

        match resolution {
            Resolution::Found(repo) => {
                let query = OperationQuery::new(repo.id.clone(), self.max_results);
                self.ensure_projections(&query);
                self.state = ViewState::Resolved { repo, query };
            }
            Resolution::NotFound => {
                if self.deleted_ids.insert(self.repo_id.clone()) || self.projections.is_some() {
                    info!(
                        repo_id = %self.repo_id,
                        modno = snapshot.modno(),
                        "Repository not found in configuration"
                    );
                }
                self.release_subscription();
                self.state = ViewState::Deleted;
            }
        }
        self.needs_redraw = true;
    }

    /// Keep the current projections when their query equals `query`,
    /// otherwise replace them and resubscribe.
    fn ensure_projections(&mut self, query: &OperationQuery) {
        if let Some(projections) = &self.projections {
            if &projections.query == query {
                if projections.subscription.is_none() {
                    self.subscribe();
                }
                return;
            }
        }

        self.release_subscription();
        self.projections = Some(HistoryProjections::new(query.clone(), self.viewport_rows));
        self.subscribe();
    }

    fn subscribe(&mut self) {
        let Some(projections) = self.projections.as_mut() else {
            return;
        };
        match self.feed.subscribe(&projections.query) {
            Ok(subscription) => {
                debug!(
                    repo_id = projections.query.repo_id(),
                    max_results = projections.query.max_results(),
                    subscription = subscription.id(),
                    feed = self.feed.description(),
                    "Subscribed to operation feed"
                );
                projections.subscription = Some(subscription);
            }
            Err(error) => {
                self.report_feed_failure(error);
            }
        }
    }

    fn release_subscription(&mut self) {
        if let Some(projections) = self.projections.take() {
            if let Some(subscription) = projections.subscription {
                debug!(
                    repo_id = projections.query.repo_id(),
                    subscription = subscription.id(),
                    "Released operation feed subscription"
                );
                subscription.unsubscribe();
            }
        }
    }

    /// Retry a failed subscription for the current query
    pub fn retry_subscription(&mut self) -> bool {
        if self.is_deleted() || self.is_subscribed() {
            return false;
        }
        self.subscribe();
        self.needs_redraw = true;
        self.is_subscribed()
    }

    /// Merge every queued feed event into both projections.
    /// Returns whether anything changed.
    pub fn process_feed_events(&mut self) -> bool {
        let events = match self.projections.as_mut().and_then(|p| p.subscription.as_mut()) {
            Some(subscription) => subscription.drain(),
            None => return false,
        };

        let mut changed = false;
        for event in events {
            if let FeedEvent::Failed(error) = event {
                self.report_feed_failure(error);
                changed = true;
                continue;
            }
            if matches!(event, FeedEvent::Upserted(_)) && self.feed_error.take().is_some() {
                changed = true;
            }
            if let Some(projections) = self.projections.as_mut() {
                let list_changed = projections.list.apply(&event);
                let tree_changed = projections.tree.apply(&event);
                changed |= list_changed || tree_changed;
            }
        }
        if changed {
            self.needs_redraw = true;
        }
        changed
    }

    /// Surface a failure through the alert channel; projections keep their
    /// content. Repeats of the current failure are not re-alerted.
    fn report_feed_failure(&mut self, error: FeedError) {
        if self.feed_error.as_ref() == Some(&error) {
            return;
        }
        warn!(repo_id = %self.repo_id, %error, "Operation feed failed");
        self.alerts.raise(Alert::new(
            AlertLevel::Error,
            ALERT_SOURCE,
            format!("Failed to load operations for {}: {error}", self.repo_id),
        ));
        self.feed_error = Some(error);
        self.needs_redraw = true;
    }

    /// Release the feed subscription and stop tracking the repository.
    pub fn teardown(&mut self) {
        self.release_subscription();
        self.state = ViewState::Deleted;
    }

    pub fn update(&mut self, msg: RepoViewMsg) {
        match msg {
            RepoViewMsg::Key(key) => self.handle_key(key),
            RepoViewMsg::Tick => {
                self.process_config_changes();
                self.process_feed_events();
            }
            RepoViewMsg::Resize { rows } => {
                self.viewport_rows = rows as usize;
                if let Some(projections) = self.projections.as_mut() {
                    projections.set_viewport_rows(self.viewport_rows);
                }
                self.needs_redraw = true;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let changed = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.exit_requested = true;
                false
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.active_tab = self.active_tab.other();
                true
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Enter | KeyCode::Char(' ') => match (self.active_tab, self.projections.as_mut()) {
                (HistoryTab::Tree, Some(projections)) => projections.tree.toggle_selected(),
                _ => false,
            },
            KeyCode::Char('r') => self.retry_subscription(),
            _ => false,
        };
        if changed {
            self.needs_redraw = true;
        }
    }

    fn move_selection(&mut self, forward: bool) -> bool {
        let Some(projections) = self.projections.as_mut() else {
            return false;
        };
        match (self.active_tab, forward) {
            (HistoryTab::Tree, true) => projections.tree.select_next(),
            (HistoryTab::Tree, false) => projections.tree.select_previous(),
            (HistoryTab::List, true) => projections.list.select_next(),
            (HistoryTab::List, false) => projections.list.select_previous(),
        }
    }

    pub fn take_exit_request(&mut self) -> bool {
        std::mem::take(&mut self.exit_requested)
    }
}

impl std::fmt::Debug for RepoViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoViewModel")
            .field("repo_id", &self.repo_id)
            .field("state", &self.state)
            .field("subscribed", &self.is_subscribed())
            .field("active_tab", &self.active_tab)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use restora_config_types::ConfigSnapshot;
    use restora_core::mock_feed::ScriptedOperationFeed;
    use restora_core::RecordingAlertSink;

    fn deps(ids: &[&str]) -> (RepoViewDependencies, Arc<ScriptedOperationFeed>) {
        let repos = ids.iter().map(|id| Repository::new(*id, format!("/srv/{id}"))).collect();
        let feed = Arc::new(ScriptedOperationFeed::new());
        let deps = RepoViewDependencies {
            config: ConfigSnapshotStore::new(ConfigSnapshot::new(repos, vec![]).unwrap()),
            feed: feed.clone(),
            alerts: Arc::new(RecordingAlertSink::new()),
            max_results: 50,
        };
        (deps, feed)
    }

    fn key(code: KeyCode) -> RepoViewMsg {
        RepoViewMsg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn tab_keys_switch_projection() {
        let (deps, _feed) = deps(&["repo1"]);
        let mut vm = RepoViewModel::new("repo1", deps);
        assert_eq!(vm.active_tab(), HistoryTab::Tree);
        vm.update(key(KeyCode::Tab));
        assert_eq!(vm.active_tab(), HistoryTab::List);
        vm.update(key(KeyCode::BackTab));
        assert_eq!(vm.active_tab(), HistoryTab::Tree);
    }

    #[test]
    fn quit_keys_request_exit_once() {
        let (deps, _feed) = deps(&["repo1"]);
        let mut vm = RepoViewModel::new("repo1", deps);
        vm.update(key(KeyCode::Char('q')));
        assert!(vm.take_exit_request());
        assert!(!vm.take_exit_request());
        vm.update(key(KeyCode::Esc));
        assert!(vm.take_exit_request());
    }

    #[test]
    fn default_tab_comes_from_configuration() {
        let (deps, _feed) = deps(&["repo1"]);
        let ui = restora_config_types::UiRoot {
            default_history_tab: Some(HistoryTabSetting::List),
            ..Default::default()
        };
        let snapshot = (*deps.config.current()).clone().with_ui(ui);
        deps.config.replace(snapshot).unwrap();

        let vm = RepoViewModel::new("repo1", deps);
        assert_eq!(vm.active_tab(), HistoryTab::List);
    }

    #[test]
    fn set_repo_id_to_same_id_is_a_no_op() {
        let (deps, feed) = deps(&["repo1"]);
        let mut vm = RepoViewModel::new("repo1", deps);
        vm.set_repo_id("repo1");
        assert_eq!(feed.subscribe_calls().len(), 1);
    }
}
