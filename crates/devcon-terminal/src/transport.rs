//! The I/O boundary between a console and whoever is typing into it.
//!
//! A transport owns the current input value and the accumulated output
//! text. Lines reach the console either through [`Transport::poll_input`]
//! (queued transports, drained once per tick) or through key events that
//! the host feeds to the console directly (local surfaces).

use crate::writer::OutputStyle;

/// Contract shared by every console transport.
pub trait Transport {
    /// The current input value.
    fn input(&self) -> &str;

    fn set_input(&mut self, text: &str);

    fn clear_input(&mut self) {
        self.set_input("");
    }

    /// Append raw text to the output.
    fn append_output(&mut self, text: &str);

    /// Drop all accumulated output.
    fn clear_output(&mut self);

    fn style(&self) -> OutputStyle {
        OutputStyle::Markup
    }

    /// Whether the transport has a visual surface that can be shown or
    /// hidden.
    fn has_surface(&self) -> bool {
        false
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn set_visible(&mut self, _visible: bool) {}

    /// Next line submitted by the remote side, if one is waiting.
    ///
    /// Called once per host tick. The line counts as in flight until
    /// [`input_handled`](Self::input_handled) is called.
    fn poll_input(&mut self) -> Option<String> {
        None
    }

    /// The line returned by the last `poll_input` has been fully executed
    /// and its output written.
    fn input_handled(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn input(&self) -> &str {
        (**self).input()
    }
    fn set_input(&mut self, text: &str) {
        (**self).set_input(text);
    }
    fn clear_input(&mut self) {
        (**self).clear_input();
    }
    fn append_output(&mut self, text: &str) {
        (**self).append_output(text);
    }
    fn clear_output(&mut self) {
        (**self).clear_output();
    }
    fn style(&self) -> OutputStyle {
        (**self).style()
    }
    fn has_surface(&self) -> bool {
        (**self).has_surface()
    }
    fn is_visible(&self) -> bool {
        (**self).is_visible()
    }
    fn set_visible(&mut self, visible: bool) {
        (**self).set_visible(visible);
    }
    fn poll_input(&mut self) -> Option<String> {
        (**self).poll_input()
    }
    fn input_handled(&mut self) {
        (**self).input_handled();
    }
}

/// Synchronous in-process transport backing a local console surface.
///
/// Input arrives as key events on the same thread that renders the output,
/// so nothing here is shared. Output is kept as markup; a renderer reads it
/// with [`output`](Self::output) or incrementally with
/// [`take_unrendered`](Self::take_unrendered).
#[derive(Debug, Default)]
pub struct LocalTransport {
    input: String,
    output: String,
    rendered: usize,
    cleared: bool,
    visible: bool,
}

impl LocalTransport {
    /// A hidden surface with empty input and output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written since the last clear.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Output appended since the previous call.
    pub fn take_unrendered(&mut self) -> String {
        let fresh = self.output[self.rendered..].to_string();
        self.rendered = self.output.len();
        fresh
    }

    /// Whether the output was cleared since the previous call.
    pub fn take_cleared(&mut self) -> bool {
        std::mem::take(&mut self.cleared)
    }
}

impl Transport for LocalTransport {
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
        self.rendered = 0;
        self.cleared = true;
    }

    fn has_surface(&self) -> bool {
        true
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::debug!("Console {}", if visible { "shown" } else { "hidden" });
        }
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_starts_hidden_and_empty() {
        let t = LocalTransport::new();
        assert!(!t.is_visible());
        assert!(t.has_surface());
        assert_eq!(t.input(), "");
        assert_eq!(t.output(), "");
        assert_eq!(t.style(), OutputStyle::Markup);
    }

    #[test]
    fn take_unrendered_is_incremental() {
        let mut t = LocalTransport::new();
        t.append_output("one");
        assert_eq!(t.take_unrendered(), "one");
        t.append_output("two");
        assert_eq!(t.take_unrendered(), "two");
        assert_eq!(t.take_unrendered(), "");
        assert_eq!(t.output(), "onetwo");
    }

    #[test]
    fn clear_resets_render_position() {
        let mut t = LocalTransport::new();
        t.append_output("old");
        t.take_unrendered();
        t.clear_output();
        t.append_output("new");
        assert_eq!(t.take_unrendered(), "new");
        assert!(t.take_cleared());
        assert!(!t.take_cleared());
    }

    #[test]
    fn boxed_transport_delegates() {
        let mut t: Box<dyn Transport> = Box::new(LocalTransport::new());
        t.set_input("help");
        t.set_visible(true);
        assert_eq!(t.input(), "help");
        assert!(t.is_visible());
        t.clear_input();
        assert_eq!(t.input(), "");
        assert!(t.poll_input().is_none());
    }
}
