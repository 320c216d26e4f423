//! Formatted output on top of a transport's raw append.
//!
//! Text is written with lightweight markup (`<b>`, `<i>`, `<color=#RRGGBB>`).
//! Markup transports keep it for their renderer; plain transports get bold
//! as `'...'`, no italics or colors, and a sigil in front of error and
//! warning lines.

use devcon_types::color::{Color, parse_hex_color};
use devcon_types::config::OutputColors;

use crate::transport::Transport;

/// Prefix shared by plain-text error and warning lines.
const SIGIL_BASE: &str = "#>>";
const SIGIL_ERROR: &str = "x";
const SIGIL_WARNING: &str = "!";

/// How a transport wants its output text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// Keep markup tags for a rich display.
    Markup,
    /// Line-oriented text for the network protocol.
    Plain,
}

/// Writes formatted text to a transport.
pub struct Writer<'a> {
    sink: &'a mut dyn Transport,
    colors: OutputColors,
    style: OutputStyle,
}

impl<'a> Writer<'a> {
    pub fn new(sink: &'a mut dyn Transport, colors: OutputColors) -> Self {
        let style = sink.style();
        Self {
            sink,
            colors,
            style,
        }
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn write(&mut self, text: &str) {
        match self.style {
            OutputStyle::Markup => self.sink.append_output(text),
            OutputStyle::Plain => self.sink.append_output(&to_plain(text)),
        }
    }

    /// Write `text` on its own line.
    ///
    /// Markup output starts a new line before the text (the display keeps
    /// the cursor at the end of the last line); plain output ends the line.
    pub fn write_line(&mut self, text: &str) {
        match self.style {
            OutputStyle::Markup => self.write(&format!("\n{text}")),
            OutputStyle::Plain => self.write(&format!("{text}\n")),
        }
    }

    pub fn write_bold(&mut self, text: &str) {
        self.write(&format!("<b>{text}</b>"));
    }

    pub fn write_line_bold(&mut self, text: &str) {
        self.write_line(&format!("<b>{text}</b>"));
    }

    pub fn write_italic(&mut self, text: &str) {
        self.write(&format!("<i>{text}</i>"));
    }

    pub fn write_line_italic(&mut self, text: &str) {
        self.write_line(&format!("<i>{text}</i>"));
    }

    pub fn write_error(&mut self, text: &str) {
        self.write_flagged(text, self.colors.error, Some(SIGIL_ERROR));
    }

    pub fn write_warning(&mut self, text: &str) {
        self.write_flagged(text, self.colors.warning, Some(SIGIL_WARNING));
    }

    pub fn write_info(&mut self, text: &str) {
        self.write_flagged(text, self.colors.info, None);
    }

    pub fn open_bold(&mut self) {
        self.write("<b>");
    }

    pub fn close_bold(&mut self) {
        self.write("</b>");
    }

    pub fn open_color(&mut self, color: Color) {
        if self.style == OutputStyle::Markup {
            self.write(&format!("<color=#{}>", color.to_hex_rgb()));
        }
    }

    pub fn close_color(&mut self) {
        if self.style == OutputStyle::Markup {
            self.write("</color>");
        }
    }

    pub fn next_line(&mut self) {
        self.write("\n");
    }

    /// Drop everything the transport has accumulated.
    pub fn clear(&mut self) {
        self.sink.clear_output();
    }

    fn write_flagged(&mut self, text: &str, color: Color, sigil: Option<&str>) {
        match self.style {
            OutputStyle::Markup => {
                self.open_color(color);
                self.write_line(text);
                self.close_color();
            },
            OutputStyle::Plain => match sigil {
                Some(sigil) => self.write_line(&format!("{SIGIL_BASE}{sigil}{text}")),
                None => self.write_line(text),
            },
        }
    }
}

/// One piece of marked-up text.
#[derive(Debug, Clone, PartialEq)]
pub enum Span<'t> {
    Text(&'t str),
    BoldOn,
    BoldOff,
    ItalicOn,
    ItalicOff,
    ColorOn(Color),
    ColorOff,
}

/// Split marked-up text into spans.
///
/// Anything that is not a recognised tag, including a `<color=...>` with an
/// unparsable value, stays literal text.
pub fn spans(text: &str) -> Vec<Span<'_>> {
    const TAGS: [(&str, Span<'static>); 5] = [
        ("<b>", Span::BoldOn),
        ("</b>", Span::BoldOff),
        ("<i>", Span::ItalicOn),
        ("</i>", Span::ItalicOff),
        ("</color>", Span::ColorOff),
    ];

    let mut out = Vec::new();
    let mut rest = text;
    let mut pos = 0;

    while let Some(offset) = rest[pos..].find('<') {
        let at = pos + offset;
        let tail = &rest[at..];
        let tag = TAGS
            .iter()
            .find(|(t, _)| tail.starts_with(t))
            .map(|(t, span)| (t.len(), span.clone()))
            .or_else(|| color_tag(tail));

        match tag {
            Some((len, span)) => {
                if at > 0 {
                    out.push(Span::Text(&rest[..at]));
                }
                out.push(span);
                rest = &rest[at + len..];
                pos = 0;
            },
            None => pos = at + 1,
        }
    }
    if !rest.is_empty() {
        out.push(Span::Text(rest));
    }
    out
}

fn color_tag(tail: &str) -> Option<(usize, Span<'static>)> {
    let body = tail.strip_prefix("<color=")?;
    let end = body.find('>')?;
    let color = parse_hex_color(&body[..end]).or_else(|| Color::from_name(&body[..end]))?;
    Some(("<color=".len() + end + 1, Span::ColorOn(color)))
}

/// Render markup for a plain transport: bold becomes `'`, other tags vanish.
pub fn to_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for span in spans(text) {
        match span {
            Span::Text(t) => out.push_str(t),
            Span::BoldOn | Span::BoldOff => out.push('\''),
            _ => {},
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalTransport;

    /// Collects output in plain style.
    #[derive(Default)]
    struct PlainSink {
        input: String,
        output: String,
    }

    impl Transport for PlainSink {
        fn input(&self) -> &str {
            &self.input
        }
        fn set_input(&mut self, text: &str) {
            self.input = text.to_string();
        }
        fn append_output(&mut self, text: &str) {
            self.output.push_str(text);
        }
        fn clear_output(&mut self) {
            self.output.clear();
        }
        fn style(&self) -> OutputStyle {
            OutputStyle::Plain
        }
    }

    #[test]
    fn markup_error_is_colored_line() {
        let mut sink = LocalTransport::new();
        let mut w = Writer::new(&mut sink, OutputColors::default());
        w.write_error("boom");
        assert_eq!(sink.output(), "<color=#FF0000>\nboom</color>");
    }

    #[test]
    fn plain_error_has_sigil() {
        let mut sink = PlainSink::default();
        let mut w = Writer::new(&mut sink, OutputColors::default());
        w.write_error("boom");
        w.write_warning("careful");
        w.write_info("fyi");
        assert_eq!(sink.output, "#>>xboom\n#>>!careful\nfyi\n");
    }

    #[test]
    fn plain_bold_becomes_quotes() {
        let mut sink = PlainSink::default();
        let mut w = Writer::new(&mut sink, OutputColors::default());
        w.write("Command <b>warp</b> not found.");
        w.write_italic("quiet");
        assert_eq!(sink.output, "Command 'warp' not found.quiet");
    }

    #[test]
    fn markup_bold_and_italic() {
        let mut sink = LocalTransport::new();
        let mut w = Writer::new(&mut sink, OutputColors::default());
        w.write_bold("a");
        w.write_line_italic("b");
        assert_eq!(sink.output(), "<b>a</b>\n<i>b</i>");
    }

    #[test]
    fn clear_empties_sink() {
        let mut sink = LocalTransport::new();
        let mut w = Writer::new(&mut sink, OutputColors::default());
        w.write("x");
        w.clear();
        assert_eq!(sink.output(), "");
    }

    #[test]
    fn spans_recognise_tags() {
        assert_eq!(
            spans("a<b>b</b><color=#00FF00>c</color>"),
            vec![
                Span::Text("a"),
                Span::BoldOn,
                Span::Text("b"),
                Span::BoldOff,
                Span::ColorOn(Color::GREEN),
                Span::Text("c"),
                Span::ColorOff,
            ]
        );
    }

    #[test]
    fn spans_keep_unknown_tags_literal() {
        assert_eq!(spans("1 < 2 <x>"), vec![Span::Text("1 < 2 <x>")]);
        assert_eq!(
            spans("<color=nope>z"),
            vec![Span::Text("<color=nope>z")]
        );
    }

    #[test]
    fn plain_drops_color() {
        assert_eq!(to_plain("<color=#1E62CE>\ninfo</color>"), "\ninfo");
    }
}
