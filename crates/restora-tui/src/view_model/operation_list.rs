// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Flat, most-recent-first projection of an operation window

use restora_core::FeedEvent;
use restora_domain_types::{OperationId, OperationQuery, OperationRecord};

use super::operation_window::OperationWindow;

/// Audit-style list of a repository's operations.
///
/// Selection and scroll position survive incremental merges: the selected
/// operation stays selected while it exists, and a scrolled list stays
/// anchored on the operation at its top.
#[derive(Debug, Clone)]
pub struct OperationListModel {
    window: OperationWindow,
    rows: Vec<OperationRecord>,
    show_plan: bool,
    selected: Option<OperationId>,
    scroll_offset: usize,
    viewport_rows: usize,
}

impl OperationListModel {
    pub fn new(query: OperationQuery, show_plan: bool) -> Self {
        Self {
            window: OperationWindow::new(query),
            rows: Vec::new(),
            show_plan,
            selected: None,
            scroll_offset: 0,
            viewport_rows: 0,
        }
    }

    pub fn query(&self) -> &OperationQuery {
        self.window.query()
    }

    /// Merge a feed event. Returns whether the rendered rows changed.
    pub fn apply(&mut self, event: &FeedEvent) -> bool {
        let anchor = (self.scroll_offset > 0)
            .then(|| self.rows.get(self.scroll_offset).map(|r| r.id))
            .flatten();
        let previous_index = self.selected_index();

        if !self.window.apply(event) {
            return false;
        }
        self.rows = self.window.sorted().into_iter().cloned().collect();

        if self.selected.is_some_and(|id| !self.window.contains(id)) {
            // fall back to whatever now occupies the old position
            self.selected = previous_index
                .map(|index| index.min(self.rows.len().saturating_sub(1)))
                .and_then(|index| self.rows.get(index))
                .map(|r| r.id);
        }
        if self.selected.is_none() {
            self.selected = self.rows.first().map(|r| r.id);
        }

        self.scroll_offset = anchor
            .and_then(|id| self.index_of(id))
            .unwrap_or(self.scroll_offset)
            .min(self.rows.len().saturating_sub(1));
        self.keep_selection_visible();
        true
    }

    pub fn rows(&self) -> &[OperationRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.window.is_loaded()
    }

    pub fn show_plan(&self) -> bool {
        self.show_plan
    }

    pub fn selected(&self) -> Option<OperationId> {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.index_of(id))
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    fn index_of(&self, id: OperationId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    pub fn select_next(&mut self) -> bool {
        self.move_selection(1)
    }

    pub fn select_previous(&mut self) -> bool {
        self.move_selection(-1)
    }

    fn move_selection(&mut self, delta: isize) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        let current = self.selected_index().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(self.rows.len() - 1);
        if self.selected == Some(self.rows[next].id) {
            return false;
        }
        self.selected = Some(self.rows[next].id);
        self.keep_selection_visible();
        true
    }

    /// Number of rows the view can show; used to keep the selection visible
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows;
        self.keep_selection_visible();
    }

    fn keep_selection_visible(&mut self) {
        let Some(index) = self.selected_index() else {
            return;
        };
        if index < self.scroll_offset {
            self.scroll_offset = index;
        } else if self.viewport_rows > 0 && index >= self.scroll_offset + self.viewport_rows {
            self.scroll_offset = index + 1 - self.viewport_rows;
        }
    }
}
