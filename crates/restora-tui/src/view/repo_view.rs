// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository page: header, projection tabs and the operation history

use ratatui::{prelude::*, widgets::*};
use restora_domain_types::OperationRecord;

use crate::theme::Theme;
use crate::view_model::{
    HistoryTab, OperationListModel, OperationTreeModel, RepoViewModel, TreeRow,
};

pub const DELETED_NOTICE: &str = "Repo was deleted.";
pub const EMPTY_HISTORY_NOTICE: &str = "No operations yet.";
pub const LOADING_NOTICE: &str = "Loading operations...";
pub const LIST_HEADING: &str = "Backup Action History";
pub const TREE_HEADING: &str = "Operations by Plan";

const HEADER_HEIGHT: u16 = 3;
const TABS_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 1;

struct PageLayout {
    header: Rect,
    tabs: Rect,
    history: Rect,
    status: Rect,
}

fn page_layout(area: Rect) -> PageLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(TABS_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);
    PageLayout {
        header: chunks[0],
        tabs: chunks[1],
        history: chunks[2],
        status: chunks[3],
    }
}

/// Rows of history visible inside the bordered history block of `area`
pub fn history_viewport_rows(area: Rect) -> u16 {
    page_layout(area).history.height.saturating_sub(2)
}

/// Render the repository page for `view_model` into `area`
pub fn render_repo_view(frame: &mut Frame<'_>, area: Rect, view_model: &RepoViewModel, theme: &Theme) {
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), area);

    let Some(repo) = view_model.repository() else {
        render_deleted(frame, area, theme);
        return;
    };

    let layout = page_layout(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(repo.id.clone(), theme.header_style()),
        Span::raw("  "),
        Span::styled(repo.uri.clone(), theme.muted_style()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border_style(false)),
    );
    frame.render_widget(header, layout.header);

    let tabs = Tabs::new(HistoryTab::ALL.map(HistoryTab::title))
        .select(view_model.active_tab().index())
        .style(theme.muted_style())
        .highlight_style(theme.header_style())
        .divider("|");
    frame.render_widget(tabs, layout.tabs);

    match view_model.active_tab() {
        HistoryTab::List => {
            if let Some(list) = view_model.list() {
                render_list(frame, layout.history, list, theme);
            }
        }
        HistoryTab::Tree => {
            if let Some(tree) = view_model.tree() {
                render_tree(frame, layout.history, tree, theme);
            }
        }
    }

    render_status(frame, layout.status, view_model, theme);
}

fn render_deleted(frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    let middle = Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    };
    let notice = Paragraph::new(DELETED_NOTICE)
        .style(theme.muted_style())
        .alignment(Alignment::Center);
    frame.render_widget(notice, middle);
}

fn history_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(format!(" {title} "), theme.header_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style(true))
}

fn render_notice(frame: &mut Frame<'_>, area: Rect, block: Block<'_>, text: &str, theme: &Theme) {
    frame.render_widget(Paragraph::new(text).style(theme.muted_style()).block(block), area);
}

fn render_list(frame: &mut Frame<'_>, area: Rect, list: &OperationListModel, theme: &Theme) {
    let block = history_block(LIST_HEADING, theme);
    if !list.is_loaded() {
        return render_notice(frame, area, block, LOADING_NOTICE, theme);
    }
    if list.is_empty() {
        return render_notice(frame, area, block, EMPTY_HISTORY_NOTICE, theme);
    }

    let visible = area.height.saturating_sub(2) as usize;
    let selected = list.selected_index();
    let items: Vec<ListItem> = list
        .rows()
        .iter()
        .enumerate()
        .skip(list.scroll_offset())
        .take(visible)
        .map(|(index, record)| {
            let mut spans = operation_spans(record, theme);
            if list.show_plan() {
                if let Some(plan_id) = &record.plan_id {
                    spans.push(Span::styled(format!(" [{plan_id}]"), theme.muted_style()));
                }
            }
            if let Some(message) = &record.display_message {
                spans.push(Span::styled(format!("  {message}"), Style::default().fg(theme.dim_text)));
            }
            let item = ListItem::new(Line::from(spans));
            if selected == Some(index) {
                item.style(theme.selected_style())
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_tree(frame: &mut Frame<'_>, area: Rect, tree: &OperationTreeModel, theme: &Theme) {
    let block = history_block(TREE_HEADING, theme);
    if !tree.is_loaded() {
        return render_notice(frame, area, block, LOADING_NOTICE, theme);
    }
    if tree.is_empty() {
        return render_notice(frame, area, block, EMPTY_HISTORY_NOTICE, theme);
    }

    let visible = area.height.saturating_sub(2) as usize;
    let selected = tree.selected_index();
    let items: Vec<ListItem> = tree
        .rows()
        .iter()
        .enumerate()
        .skip(tree.scroll_offset())
        .take(visible)
        .map(|(index, row)| {
            let line = match row {
                TreeRow::Group {
                    plan_id,
                    operations,
                    expanded,
                } => {
                    let label = plan_id
                        .as_deref()
                        .unwrap_or(crate::view_model::operation_tree::UNASSIGNED_GROUP_LABEL);
                    Line::from(vec![
                        Span::styled(fold_marker(true, *expanded), theme.muted_style()),
                        Span::styled(label.to_string(), theme.header_style()),
                        Span::styled(format!(" ({operations})"), theme.muted_style()),
                    ])
                }
                TreeRow::Operation {
                    record,
                    depth,
                    has_children,
                    expanded,
                } => {
                    let mut spans = vec![
                        Span::raw("  ".repeat(depth + 1)),
                        Span::styled(fold_marker(*has_children, *expanded), theme.muted_style()),
                    ];
                    spans.extend(operation_spans(record, theme));
                    Line::from(spans)
                }
            };
            let item = ListItem::new(line);
            if selected == Some(index) {
                item.style(theme.selected_style())
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn fold_marker(has_children: bool, expanded: bool) -> &'static str {
    match (has_children, expanded) {
        (false, _) => "· ",
        (true, true) => "▾ ",
        (true, false) => "▸ ",
    }
}

fn operation_spans<'a>(record: &OperationRecord, theme: &Theme) -> Vec<Span<'a>> {
    let mut spans = vec![
        Span::styled(
            record.started_at.format("%Y-%m-%d %H:%M").to_string(),
            theme.muted_style(),
        ),
        Span::raw(" "),
        Span::styled(format!("{:<8}", record.kind.to_string()), theme.text_style()),
        Span::styled(record.status.to_string(), theme.status_style(record.status)),
    ];
    if let Some(duration) = record.duration() {
        spans.push(Span::styled(
            format!(" {}", format_duration(duration)),
            theme.muted_style(),
        ));
    }
    spans
}

fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m{:02}s", secs / 60, secs % 60),
        _ => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
    }
}

fn render_status(frame: &mut Frame<'_>, area: Rect, view_model: &RepoViewModel, theme: &Theme) {
    let line = if let Some(error) = view_model.feed_error() {
        Line::from(vec![
            Span::styled(format!("{error}"), theme.error_style()),
            Span::styled("  r retry · q quit", theme.muted_style()),
        ])
    } else {
        let count = view_model.list().map_or(0, OperationListModel::len);
        Line::from(vec![
            Span::styled(
                format!("{count} operations (limit {})", view_model.max_results()),
                theme.text_style(),
            ),
            Span::styled("  Tab switch view · ↑/↓ select · q quit", theme.muted_style()),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}
