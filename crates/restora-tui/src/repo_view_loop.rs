// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository view loop - input, polling and rendering
//!
//! Terminal input is read on a dedicated thread and forwarded over a
//! channel. A coalescing tick drives configuration and feed polling. When a
//! reloader is supplied its change signals trigger a configuration reload.
//! The screen is redrawn only when the view model asks for it.

use crossbeam_channel as chan;
use crossterm::event::Event;
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};
use tracing::{debug, warn};

use crate::config_reload::ConfigReloader;
use crate::terminal::{SessionOptions, TerminalSession};
use crate::theme::Theme;
use crate::view::{history_viewport_rows, render_repo_view};
use crate::view_model::{RepoViewModel, RepoViewMsg};

const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Run the repository page until the user quits or Ctrl-C is pressed
pub async fn run_repo_view(
    mut view_model: RepoViewModel,
    reloader: Option<ConfigReloader>,
) -> anyhow::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let session = TerminalSession::enter(SessionOptions::default(), running.clone())?;

    let result = match Terminal::new(CrosstermBackend::new(std::io::stdout())) {
        Ok(terminal) => event_loop(terminal, &mut view_model, reloader, &running),
        Err(error) => Err(error.into()),
    };

    drop(session);
    view_model.teardown();
    result
}

fn event_loop<B: Backend>(
    mut terminal: Terminal<B>,
    view_model: &mut RepoViewModel,
    reloader: Option<ConfigReloader>,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let theme = Theme::default();

    let (tx_ev, rx_ev) = chan::unbounded::<Event>();
    let rx_tick = chan::tick(TICK_INTERVAL);
    let rx_config = reloader
        .as_ref()
        .map(|reloader| reloader.changes().clone())
        .unwrap_or_else(chan::never);

    thread::spawn(move || {
        while let Ok(ev) = crossterm::event::read() {
            if tx_ev.send(ev).is_err() {
                break;
            }
        }
    });

    let size = terminal.size()?;
    view_model.update(RepoViewMsg::Resize {
        rows: history_viewport_rows(Rect::new(0, 0, size.width, size.height)),
    });

    while running.load(Ordering::SeqCst) {
        chan::select_biased! {
            recv(rx_ev) -> msg => {
                let Ok(event) = msg else { break };
                match event {
                    Event::Key(key) => {
                        debug!(key_code = ?key.code, key_kind = ?key.kind, "Key event received");
                        view_model.update(RepoViewMsg::Key(key));
                        if view_model.take_exit_request() {
                            break;
                        }
                    }
                    Event::Resize(width, height) => {
                        terminal.autoresize()?;
                        view_model.update(RepoViewMsg::Resize {
                            rows: history_viewport_rows(Rect::new(0, 0, width, height)),
                        });
                    }
                    _ => {}
                }
            }
            recv(rx_tick) -> _ => {
                view_model.update(RepoViewMsg::Tick);
            }
            recv(rx_config) -> _ => {
                if let Some(reloader) = reloader.as_ref() {
                    if let Err(error) = reloader.reload() {
                        warn!(error = %format!("{error:#}"), "Configuration reload failed");
                    }
                }
            }
        }

        if view_model.needs_redraw {
            terminal.draw(|frame| {
                let area = frame.area();
                render_repo_view(frame, area, view_model, &theme);
            })?;
            view_model.needs_redraw = false;
        }
    }

    Ok(())
}
