//! Terminal management: the full-screen preview guard and the status bar.

mod screen;
mod status_bar;

pub use screen::ScreenGuard;
pub use status_bar::StatusBar;
