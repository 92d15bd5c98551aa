// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! View Layer - Pure Rendering and Presentation
//!
//! This module contains the Ratatui rendering code that transforms
//! view model state into terminal widgets. The view is the last step of
//! the MVVM pipeline and contains no business logic.
//!
//! ## What Belongs Here:
//!
//! - Widget creation and layout
//! - Styling through the shared [`Theme`](crate::theme::Theme)
//! - Pure `&ViewModel -> widgets` transformations
//!
//! ## What Does NOT Belong Here:
//!
//! - Key handling or any other state change
//! - Selection and scroll bookkeeping (owned by the projections)
//! - Configuration or feed access
//!
//! Render functions take the view model by shared reference, so they can be
//! driven against a `TestBackend` in tests exactly as in production.

pub mod repo_view;

pub use repo_view::{history_viewport_rows, render_repo_view};
