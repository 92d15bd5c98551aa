// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! ViewModel Layer - UI State and Presentation Models
//!
//! The view models own all state the repository page needs: which
//! repository is shown, whether it still exists, the shared history query,
//! the feed subscription and the two projections of its records. They never
//! draw anything; the `view` module renders them.
//!
//! ## Primary Mission: Headless Testing
//!
//! Everything here is driven by plain method calls and [`RepoViewMsg`]
//! messages, so the page can be exercised end to end with a scripted feed
//! and an in-memory configuration store, without a terminal.

pub mod operation_list;
pub mod operation_tree;
pub mod operation_window;
pub mod repo_view_model;

pub use operation_list::OperationListModel;
pub use operation_tree::{OperationTreeModel, PlanGroup, TreeKey, TreeNode, TreeRow};
pub use operation_window::OperationWindow;
pub use repo_view_model::{
    HistoryTab, RepoViewDependencies, RepoViewModel, RepoViewMsg, ViewState,
};
