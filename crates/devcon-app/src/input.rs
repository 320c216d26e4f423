//! Maps terminal input lines to console input events.
//!
//! A cooked terminal only delivers whole lines, so keys with a console
//! meaning are recognised when they make up the entire line: a lone Tab
//! toggles the console, and the Up / Down arrow escape sequences step
//! through history. Anything else is typed in and submitted.

use devcon_types::input::{ConsoleKey, InputEvent};

const ARROW_UP: &str = "\x1b[A";
const ARROW_DOWN: &str = "\x1b[B";

/// Events for one line read from the terminal, without its newline.
pub fn events_for_line(line: &str) -> Vec<InputEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line {
        "\t" => vec![InputEvent::KeyPress(ConsoleKey::ToggleVisibility)],
        ARROW_UP => vec![InputEvent::KeyPress(ConsoleKey::HistoryBack)],
        ARROW_DOWN => vec![InputEvent::KeyPress(ConsoleKey::HistoryForward)],
        _ => line
            .chars()
            .map(InputEvent::TextInput)
            .chain(std::iter::once(InputEvent::KeyPress(ConsoleKey::Submit)))
            .collect(),
    }
}

/// Whether the line only recalls history, so the recalled entry should be
/// shown to the user.
pub fn is_history_key(line: &str) -> bool {
    matches!(line.trim_end_matches(['\r', '\n']), ARROW_UP | ARROW_DOWN)
}
