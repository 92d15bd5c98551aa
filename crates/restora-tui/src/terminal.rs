// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Terminal session for the repository page
//!
//! [`TerminalSession::enter`] switches the terminal into the modes the page
//! needs and returns a guard. The modes that were actually switched on are
//! recorded in [`TerminalModes`], which is shared with the Ctrl-C handler and
//! the panic hook, so whichever of them runs first restores the terminal and
//! the others do nothing.

use crossterm::{
    ExecutableCommand,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    io, panic,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Ask for key release reporting; the page acts on presses only
    pub keyboard_enhancement: bool,
    /// Restore the terminal on Ctrl-C and on panic
    pub restore_on_interrupt: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            keyboard_enhancement: true,
            restore_on_interrupt: true,
        }
    }
}

/// Terminal modes switched on by a session
#[derive(Debug, Default)]
pub struct TerminalModes {
    raw: AtomicBool,
    alternate_screen: AtomicBool,
    keyboard_flags: AtomicBool,
    restored: AtomicBool,
}

impl TerminalModes {
    /// Undo every recorded mode. Returns false if the modes were already
    /// restored.
    pub fn restore(&self) -> bool {
        if self.restored.swap(true, Ordering::SeqCst) {
            return false;
        }
        let mut stdout = io::stdout();
        // keyboard flags are popped while raw mode is still on
        if self.keyboard_flags.swap(false, Ordering::SeqCst) {
            let _ = stdout.execute(PopKeyboardEnhancementFlags);
        }
        if self.raw.swap(false, Ordering::SeqCst) {
            let _ = crossterm::terminal::disable_raw_mode();
        }
        if self.alternate_screen.swap(false, Ordering::SeqCst) {
            let _ = stdout.execute(LeaveAlternateScreen);
        }
        true
    }
}

/// Restores the terminal when dropped
pub struct TerminalSession {
    modes: Arc<TerminalModes>,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen. `running` is cleared on
    /// Ctrl-C so the event loop can stop.
    pub fn enter(options: SessionOptions, running: Arc<AtomicBool>) -> anyhow::Result<Self> {
        let modes = Arc::new(TerminalModes::default());
        // the guard restores whatever was switched on if a later step fails
        let session = Self {
            modes: modes.clone(),
        };
        let mut stdout = io::stdout();

        crossterm::terminal::enable_raw_mode()?;
        modes.raw.store(true, Ordering::SeqCst);

        stdout.execute(EnterAlternateScreen)?;
        modes.alternate_screen.store(true, Ordering::SeqCst);

        if options.keyboard_enhancement
            && crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false)
        {
            stdout.execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
            modes.keyboard_flags.store(true, Ordering::SeqCst);
        }

        if options.restore_on_interrupt {
            let on_interrupt = modes.clone();
            ctrlc::set_handler(move || {
                on_interrupt.restore();
                running.store(false, Ordering::SeqCst);
            })?;

            let on_panic = modes.clone();
            let previous_hook = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                on_panic.restore();
                previous_hook(info);
            }));
        }

        debug!("Terminal session started");
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.modes.restore() {
            debug!("Terminal restored");
        }
    }
}
