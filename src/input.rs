//! Keyboard input handling.
//!
//! Maps crossterm key events onto the try-on controls. The mapping is a pure
//! function so it can be tested without a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::overlay::Direction;

/// A user action on the try-on session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Nudge(Direction),
    /// Scale slider, one step up (+1) or down (-1)
    Scale(i32),
    Reset,
    NextAsset,
    PreviousAsset,
    Capture,
    Download,
    Share,
    Discard,
    ToggleCamera,
    Quit,
}

/// Translate a key event into a control.
///
/// Keys:
/// - Arrows: nudge the frame
/// - `+`/`=` and `-`/`_`: scale up/down
/// - `r`: reset adjustment
/// - `n`/`p` (also Tab/BackTab): next/previous frame
/// - Space: capture, `d`: download, `s`: share, `x`: discard photo
/// - `c`: toggle camera
/// - `q`, Esc, Ctrl+C: quit
pub fn control_for_key(event: KeyEvent) -> Option<Control> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    if kind == KeyEventKind::Release {
        return None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Control::Quit),
            _ => None,
        };
    }

    let control = match code {
        KeyCode::Up => Control::Nudge(Direction::Up),
        KeyCode::Down => Control::Nudge(Direction::Down),
        KeyCode::Left => Control::Nudge(Direction::Left),
        KeyCode::Right => Control::Nudge(Direction::Right),
        KeyCode::Char('+') | KeyCode::Char('=') => Control::Scale(1),
        KeyCode::Char('-') | KeyCode::Char('_') => Control::Scale(-1),
        KeyCode::Tab => Control::NextAsset,
        KeyCode::BackTab => Control::PreviousAsset,
        KeyCode::Char(' ') => Control::Capture,
        KeyCode::Esc => Control::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'r' => Control::Reset,
            'n' => Control::NextAsset,
            'p' => Control::PreviousAsset,
            'd' => Control::Download,
            's' => Control::Share,
            'x' => Control::Discard,
            'c' => Control::ToggleCamera,
            'q' => Control::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(control)
}
