//! Terminal rendering of console markup.
//!
//! The local surface keeps `<b>`, `<i>` and `<color=...>` tags in its
//! output. This module turns them into ANSI SGR sequences for a terminal.

use std::io::{self, Write};

use devcon_terminal::LocalTransport;
use devcon_terminal::writer::{Span, spans};

const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";
const ITALIC_ON: &str = "\x1b[3m";
const ITALIC_OFF: &str = "\x1b[23m";
const COLOR_OFF: &str = "\x1b[39m";
/// Erase the screen and home the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Convert marked-up text to ANSI-styled text.
pub fn to_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for span in spans(text) {
        match span {
            Span::Text(t) => out.push_str(t),
            Span::BoldOn => out.push_str(BOLD_ON),
            Span::BoldOff => out.push_str(BOLD_OFF),
            Span::ItalicOn => out.push_str(ITALIC_ON),
            Span::ItalicOff => out.push_str(ITALIC_OFF),
            Span::ColorOn(c) => out.push_str(&format!("\x1b[38;2;{};{};{}m", c.r, c.g, c.b)),
            Span::ColorOff => out.push_str(COLOR_OFF),
        }
    }
    out
}

/// Write whatever the transport produced since the last frame, wiping the
/// screen first if the output was cleared.
pub fn draw(transport: &mut LocalTransport, out: &mut impl Write) -> io::Result<()> {
    let cleared = transport.take_cleared();
    let fresh = transport.take_unrendered();
    if !cleared && fresh.is_empty() {
        return Ok(());
    }
    if cleared {
        out.write_all(CLEAR_SCREEN.as_bytes())?;
    }
    out.write_all(to_ansi(&fresh).as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcon_terminal::Transport;

    #[test]
    fn bold_and_italic() {
        assert_eq!(to_ansi("<b>x</b> <i>y</i>"), "\x1b[1mx\x1b[22m \x1b[3my\x1b[23m");
    }

    #[test]
    fn truecolor() {
        assert_eq!(
            to_ansi("<color=#1E62CE>info</color>"),
            "\x1b[38;2;30;98;206minfo\x1b[39m"
        );
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(to_ansi("a < b"), "a < b");
    }

    #[test]
    fn draw_is_incremental() {
        let mut transport = LocalTransport::new();
        let mut screen = Vec::new();
        transport.append_output("\n<b>one</b>");
        draw(&mut transport, &mut screen).unwrap();
        draw(&mut transport, &mut screen).unwrap();
        transport.append_output("\ntwo");
        draw(&mut transport, &mut screen).unwrap();
        assert_eq!(String::from_utf8(screen).unwrap(), "\n\x1b[1mone\x1b[22m\ntwo");
    }

    #[test]
    fn clear_wipes_the_screen() {
        let mut transport = LocalTransport::new();
        let mut screen = Vec::new();
        transport.append_output("old");
        draw(&mut transport, &mut screen).unwrap();
        transport.clear_output();
        draw(&mut transport, &mut screen).unwrap();
        transport.append_output("new");
        draw(&mut transport, &mut screen).unwrap();
        assert_eq!(String::from_utf8(screen).unwrap(), "old\x1b[2J\x1b[Hnew");
    }
}
