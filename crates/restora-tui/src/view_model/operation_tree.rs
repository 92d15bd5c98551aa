// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Hierarchical projection of an operation window
//!
//! Operations are grouped by the plan that produced them (operations without
//! a plan share an "unassigned" group) and nested below the operation that
//! spawned them. An operation whose parent is outside the window is shown as
//! a root. Plan groups are ordered by plan id with the unassigned group last;
//! siblings are ordered most recent first.
//!
//! Nodes live in one flat arena and refer to their children by index, so
//! building, flattening and dropping the tree never recurse. Parent chains
//! may be as long as the window itself.

use std::collections::{BTreeMap, HashMap, HashSet};

use restora_core::FeedEvent;
use restora_domain_types::{OperationId, OperationQuery, OperationRecord};

use super::operation_window::OperationWindow;

pub const UNASSIGNED_GROUP_LABEL: &str = "unassigned";

/// Identity of a tree row, stable across merges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TreeKey {
    Plan(Option<String>),
    Operation(OperationId),
}

/// Arena node; `children` index into [`OperationTreeModel::nodes`]
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub record: OperationRecord,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanGroup {
    pub plan_id: Option<String>,
    /// Arena indices of the group's top-level operations
    pub roots: Vec<usize>,
    /// Operations in the group at any depth
    pub operations: usize,
}

impl PlanGroup {
    pub fn label(&self) -> &str {
        self.plan_id.as_deref().unwrap_or(UNASSIGNED_GROUP_LABEL)
    }

    pub fn key(&self) -> TreeKey {
        TreeKey::Plan(self.plan_id.clone())
    }
}

/// One visible line of the flattened tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeRow {
    Group {
        plan_id: Option<String>,
        operations: usize,
        expanded: bool,
    },
    Operation {
        record: OperationRecord,
        depth: usize,
        has_children: bool,
        expanded: bool,
    },
}

impl TreeRow {
    pub fn key(&self) -> TreeKey {
        match self {
            TreeRow::Group { plan_id, .. } => TreeKey::Plan(plan_id.clone()),
            TreeRow::Operation { record, .. } => TreeKey::Operation(record.id),
        }
    }
}

/// Tree of a repository's operations.
///
/// Like the list, the selection follows its operation across merges and a
/// scrolled tree stays anchored on the row at its top.
#[derive(Debug, Clone)]
pub struct OperationTreeModel {
    window: OperationWindow,
    nodes: Vec<TreeNode>,
    groups: Vec<PlanGroup>,
    rows: Vec<TreeRow>,
    collapsed: HashSet<TreeKey>,
    selected: Option<TreeKey>,
    scroll_offset: usize,
    viewport_rows: usize,
}

impl OperationTreeModel {
    pub fn new(query: OperationQuery) -> Self {
        Self {
            window: OperationWindow::new(query),
            nodes: Vec::new(),
            groups: Vec::new(),
            rows: Vec::new(),
            collapsed: HashSet::new(),
            selected: None,
            scroll_offset: 0,
            viewport_rows: 0,
        }
    }

    pub fn query(&self) -> &OperationQuery {
        self.window.query()
    }

    /// Merge a feed event. Returns whether the tree changed.
    pub fn apply(&mut self, event: &FeedEvent) -> bool {
        let anchor = self.scroll_anchor();
        let previous_index = self.selected_index();
        if !self.window.apply(event) {
            return false;
        }
        (self.nodes, self.groups) = build_tree(&self.window.sorted());
        self.refresh_rows();

        let selection_gone = self
            .selected
            .as_ref()
            .is_some_and(|key| !self.rows.iter().any(|row| &row.key() == key));
        if selection_gone || self.selected.is_none() {
            self.selected = previous_index
                .map(|index| index.min(self.rows.len().saturating_sub(1)))
                .and_then(|index| self.rows.get(index))
                .or_else(|| self.rows.first())
                .map(TreeRow::key);
        }
        self.restore_scroll(anchor);
        true
    }

    fn refresh_rows(&mut self) {
        let mut rows = Vec::with_capacity(self.groups.len() + self.nodes.len());
        let mut pending: Vec<(usize, usize)> = Vec::new();
        for group in &self.groups {
            let expanded = !self.collapsed.contains(&group.key());
            rows.push(TreeRow::Group {
                plan_id: group.plan_id.clone(),
                operations: group.operations,
                expanded,
            });
            if !expanded {
                continue;
            }
            pending.extend(group.roots.iter().rev().map(|&root| (root, 1)));
            while let Some((index, depth)) = pending.pop() {
                let node = &self.nodes[index];
                let expanded = !self.collapsed.contains(&TreeKey::Operation(node.record.id));
                rows.push(TreeRow::Operation {
                    record: node.record.clone(),
                    depth,
                    has_children: !node.children.is_empty(),
                    expanded,
                });
                if expanded {
                    pending.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
                }
            }
        }
        self.rows = rows;
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn groups(&self) -> &[PlanGroup] {
        &self.groups
    }

    /// Visible rows, honoring collapsed nodes
    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    /// Number of operations in the tree (not rows)
    pub fn operation_count(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.window.is_loaded()
    }

    pub fn selected(&self) -> Option<&TreeKey> {
        self.selected.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let key = self.selected.as_ref()?;
        self.index_of(key)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    fn index_of(&self, key: &TreeKey) -> Option<usize> {
        self.rows.iter().position(|row| &row.key() == key)
    }

    pub fn is_expanded(&self, key: &TreeKey) -> bool {
        !self.collapsed.contains(key)
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
        let key = self.rows[next].key();
        if self.selected.as_ref() == Some(&key) {
            return false;
        }
        self.selected = Some(key);
        self.keep_selection_visible();
        true
    }

    /// Expand or collapse the selected node. Leaves cannot be toggled.
    pub fn toggle_selected(&mut self) -> bool {
        let Some(index) = self.selected_index() else {
            return false;
        };
        let toggleable = match &self.rows[index] {
            TreeRow::Group { .. } => true,
            TreeRow::Operation { has_children, .. } => *has_children,
        };
        if !toggleable {
            return false;
        }
        let anchor = self.scroll_anchor();
        let key = self.rows[index].key();
        if !self.collapsed.remove(&key) {
            self.collapsed.insert(key);
        }
        self.refresh_rows();
        self.restore_scroll(anchor);
        true
    }

    /// Number of rows the view can show; used to keep the selection visible
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows;
        self.keep_selection_visible();
    }

    fn scroll_anchor(&self) -> Option<TreeKey> {
        (self.scroll_offset > 0)
            .then(|| self.rows.get(self.scroll_offset).map(TreeRow::key))
            .flatten()
    }

    fn restore_scroll(&mut self, anchor: Option<TreeKey>) {
        self.scroll_offset = anchor
            .and_then(|key| self.index_of(&key))
            .unwrap_or(self.scroll_offset)
            .min(self.rows.len().saturating_sub(1));
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

/// Build the node arena and plan groups from records ordered most recent
/// first. Child lists inherit that order.
fn build_tree(records: &[&OperationRecord]) -> (Vec<TreeNode>, Vec<PlanGroup>) {
    let index: HashMap<OperationId, usize> =
        records.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
    let mut nodes: Vec<TreeNode> = records
        .iter()
        .map(|&record| TreeNode {
            record: record.clone(),
            children: Vec::new(),
        })
        .collect();

    let mut roots = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match record.parent_id.and_then(|parent| index.get(&parent)) {
            Some(&parent) if parent != i => nodes[parent].children.push(i),
            _ => roots.push(i),
        }
    }

    // parent cycles have no root; their first unplaced member becomes one
    let mut placed = vec![false; nodes.len()];
    let mut by_plan: BTreeMap<Option<String>, (Vec<usize>, usize)> = BTreeMap::new();
    let mut pending = Vec::new();
    for root in roots.into_iter().chain(0..records.len()) {
        if placed[root] {
            continue;
        }
        placed[root] = true;
        pending.push(root);
        let mut operations = 0;
        while let Some(current) = pending.pop() {
            operations += 1;
            let mut children = std::mem::take(&mut nodes[current].children);
            children.retain(|&child| !placed[child]);
            for &child in &children {
                placed[child] = true;
                pending.push(child);
            }
            nodes[current].children = children;
        }
        let entry = by_plan.entry(records[root].plan_id.clone()).or_default();
        entry.0.push(root);
        entry.1 += operations;
    }

    let mut groups: Vec<PlanGroup> = by_plan
        .into_iter()
        .map(|(plan_id, (mut roots, operations))| {
            roots.sort_by(|&a, &b| nodes[a].record.cmp_recency(&nodes[b].record));
            PlanGroup {
                plan_id,
                roots,
                operations,
            }
        })
        .collect();
    // BTreeMap puts None first
    groups.sort_by_key(|group| group.plan_id.is_none());
    (nodes, groups)
}
