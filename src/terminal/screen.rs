//! Full-screen preview lifecycle.
//!
//! The preview draws on the alternate screen in raw mode with the cursor
//! hidden. [`ScreenGuard`] undoes all three on exit, on drop and on panic, so
//! the user's scrollback comes back intact.

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set while a guard owns the terminal; read by the panic hook.
static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Owns the terminal while the preview runs.
pub struct ScreenGuard {
    active: bool,
}

impl ScreenGuard {
    /// Switch to the alternate screen in raw mode.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        SCREEN_ACTIVE.store(true, Ordering::SeqCst);
        let guard = Self { active: true };
        let mut stdout = io::stdout();
        write_enter(&mut stdout)?;
        stdout.flush()?;
        Ok(guard)
    }

    /// Restore the main screen now. Dropping afterwards does nothing.
    pub fn exit(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        SCREEN_ACTIVE.store(false, Ordering::SeqCst);
        let mut stdout = io::stdout();
        write_leave(&mut stdout)?;
        stdout.flush()?;
        disable_raw_mode()
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        if self.active {
            restore_quietly();
        }
    }
}

fn write_enter(out: &mut impl Write) -> io::Result<()> {
    crossterm::queue!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))
}

fn write_leave(out: &mut impl Write) -> io::Result<()> {
    crossterm::queue!(out, Show, LeaveAlternateScreen)
}

fn restore_quietly() {
    SCREEN_ACTIVE.store(false, Ordering::SeqCst);
    let mut stdout = io::stdout();
    let _ = write_leave(&mut stdout);
    let _ = stdout.flush();
    let _ = disable_raw_mode();
}

/// Put the terminal back before the panic message prints, or it lands on the
/// alternate screen and vanishes.
fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);
    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if SCREEN_ACTIVE.load(Ordering::SeqCst) {
            restore_quietly();
        }
        previous(info);
    }));
}
