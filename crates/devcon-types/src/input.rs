//! Local-surface input events.
//!
//! A host maps its native keyboard handling to these events and feeds them to
//! the console. The console never sees raw platform input.

use serde::{Deserialize, Serialize};

/// An input event on the local console surface.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Character typed into the input field.
    TextInput(char),
    /// Backspace / delete-left.
    Backspace,
    /// A console key pressed.
    KeyPress(ConsoleKey),
}

/// Keys with a console meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleKey {
    /// Submit the current input line (Enter).
    Submit,
    /// Show or hide the console surface (Tab by default).
    ToggleVisibility,
    /// Step back through history (Up arrow).
    HistoryBack,
    /// Step forward through history (Down arrow).
    HistoryForward,
}
