// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Terminal User Interface for Restora
//!
//! This crate provides the Ratatui-based repository page: a view model that
//! tracks one repository through configuration changes and keeps a list and
//! a tree projection of its operation history live, plus the renderer and
//! event loop that put it on screen.

pub mod config_reload;
pub mod repo_view_loop;
pub mod terminal;
pub mod theme;
pub mod threading;
pub mod view;
pub mod view_model;

pub use config_reload::ConfigReloader;
pub use repo_view_loop::run_repo_view;
pub use theme::Theme;
pub use threading::UiRuntime;
pub use view_model::{
    HistoryTab, OperationListModel, OperationTreeModel, RepoViewDependencies, RepoViewModel,
    RepoViewMsg, ViewState,
};

use ratatui::{Terminal, backend::TestBackend};

/// Helpers for tests/runners to render with a deterministic backend
pub fn create_test_terminal(width: u16, height: u16) -> std::io::Result<Terminal<TestBackend>> {
    Terminal::new(TestBackend::new(width, height))
}
