// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared TUI theme definition.
//!
//! The theme maps semantic color roles to concrete Ratatui colors. View
//! functions receive a `Theme` instead of picking colors themselves.

use ratatui::style::{Color, Modifier, Style};
use restora_domain_types::OperationStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub bg: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub primary: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub border_focused: Color,
    pub dim_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Catppuccin-derived palette
            bg: Color::Rgb(20, 20, 30),
            surface: Color::Rgb(30, 30, 45),
            text: Color::Rgb(205, 214, 244),
            muted: Color::Rgb(127, 132, 156),
            primary: Color::Rgb(137, 180, 250),
            accent: Color::Rgb(150, 190, 150),
            success: Color::Rgb(150, 190, 150),
            warning: Color::Rgb(250, 179, 135),
            error: Color::Rgb(225, 105, 110),
            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(137, 180, 250),
            dim_text: Color::Rgb(90, 95, 110),
        }
    }
}

impl Theme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn header_style(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.border_focused } else { self.border })
    }

    pub fn selected_style(&self) -> Style {
        Style::default().bg(self.surface).add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// Color coding for operation statuses
    pub fn status_style(&self, status: OperationStatus) -> Style {
        let color = match status {
            OperationStatus::Success => self.success,
            OperationStatus::Warning => self.warning,
            OperationStatus::Error => self.error,
            OperationStatus::Pending | OperationStatus::InProgress => self.primary,
            OperationStatus::SystemCancelled | OperationStatus::UserCancelled => self.muted,
            OperationStatus::Unknown => self.dim_text,
        };
        Style::default().fg(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_stand_out() {
        let theme = Theme::default();
        assert_eq!(theme.status_style(OperationStatus::Error).fg, Some(theme.error));
        assert_ne!(
            theme.status_style(OperationStatus::Success),
            theme.status_style(OperationStatus::Error)
        );
    }
}
