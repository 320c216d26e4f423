//! The dispatcher: turns submitted lines into command invocations.
//!
//! A [`Console`] owns its transport, the command and converter registries,
//! the live provider scene, and the input history. Everything runs on the
//! host's tick thread; handlers never run concurrently.

use devcon_types::config::{ConsoleConfig, OutputColors};
use devcon_types::error::{ConsoleError, Result};
use devcon_types::input::{ConsoleKey, InputEvent};

use crate::convert::{Args, Converter, ConverterRegistry, ParamType, Value, coerce};
use crate::history::History;
use crate::parser;
use crate::registry::{
    Binding, Builtin, Call, CommandDescriptor, CommandProvider, CommandRegistry, Param, Scene,
};
use crate::transport::Transport;
use crate::writer::Writer;

/// Dispatcher stage, used to tag debug logs.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Parsing,
    Resolving,
    Converting,
    Invoking,
}

/// A console bound to one transport.
pub struct Console<T: Transport> {
    transport: T,
    registry: CommandRegistry,
    converters: ConverterRegistry,
    scene: Scene,
    history: History,
    colors: OutputColors,
    toggle_key_name: String,
    quit_requested: bool,
}

impl<T: Transport> Console<T> {
    /// Create a console with the built-in commands and the default
    /// converters registered.
    pub fn new(transport: T, config: &ConsoleConfig) -> Self {
        let mut registry = CommandRegistry::new();
        for descriptor in builtin_commands() {
            registry.register(descriptor);
        }
        Self {
            transport,
            registry,
            converters: ConverterRegistry::with_defaults(),
            scene: Scene::new(),
            history: History::new(config.history_capacity),
            colors: config.colors,
            toggle_key_name: config.toggle_key_name.clone(),
            quit_requested: false,
        }
    }

    pub fn register_provider<P: CommandProvider>(&mut self) {
        self.registry.register_provider::<P>();
    }

    pub fn register_command(&mut self, descriptor: CommandDescriptor) {
        self.registry.register(descriptor);
    }

    pub fn register_converter<C: Converter>(&mut self, converter: C) {
        self.converters.register(converter);
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Live provider instances. The host spawns and despawns here.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Writer over the transport, for host-side output.
    pub fn writer(&mut self) -> Writer<'_> {
        Writer::new(&mut self.transport, self.colors)
    }

    /// Whether `quit` has been executed.
    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    /// Write the welcome message.
    pub fn start(&mut self) {
        let surface = self.transport.has_surface();
        let toggle = self.toggle_key_name.clone();
        let mut out = self.writer();
        out.write_info("Console has been initialized");
        out.write_info("Write <b>help</b> for a list of all commands.");
        out.write_info("Write <b>chelp command</b> to get further info on a specific command.");
        if surface {
            out.write_info(&format!("Press <b>{toggle}</b> to close console window."));
        }
        log::info!("Console started with {} commands", self.registry.len());
    }

    /// Drain at most one queued line from the transport and run it.
    ///
    /// Returns `true` if a line was handled.
    pub fn tick(&mut self) -> bool {
        let Some(line) = self.transport.poll_input() else {
            return false;
        };
        self.submit(&line);
        self.transport.input_handled();
        true
    }

    /// Echo `line`, execute it, and clear the input.
    pub fn submit(&mut self, line: &str) {
        self.writer().write_line_italic(&format!("> {line}"));
        self.execute(line);
        self.transport.clear_input();
    }

    /// Feed one local-surface input event.
    ///
    /// While the surface is hidden only the visibility toggle is handled.
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPress(ConsoleKey::ToggleVisibility) => {
                if !self.transport.has_surface() {
                    return;
                }
                let visible = !self.transport.is_visible();
                self.transport.set_visible(visible);
                if visible {
                    self.transport.clear_input();
                }
            },
            _ if !self.transport.is_visible() => {},
            InputEvent::TextInput(ch) => {
                let mut input = self.transport.input().to_string();
                input.push(ch);
                self.transport.set_input(&input);
            },
            InputEvent::Backspace => {
                let mut input = self.transport.input().to_string();
                if input.pop().is_some() {
                    self.transport.set_input(&input);
                }
            },
            InputEvent::KeyPress(ConsoleKey::Submit) => {
                let line = self.transport.input().to_string();
                self.submit(&line);
            },
            InputEvent::KeyPress(ConsoleKey::HistoryBack) => {
                let entry = self.history.back();
                if !entry.is_empty() {
                    self.transport.set_input(&entry);
                }
            },
            InputEvent::KeyPress(ConsoleKey::HistoryForward) => {
                let entry = self.history.forward();
                if !entry.is_empty() {
                    self.transport.set_input(&entry);
                }
            },
        }
    }

    /// Parse, resolve, convert and invoke one line, reporting the outcome to
    /// the transport. The line enters history only if the command succeeds.
    pub fn execute(&mut self, raw: &str) {
        match self.dispatch(raw) {
            Ok(()) => self.history.record(raw.trim()),
            Err(e) if e.is_silent() => {},
            Err(e) => {
                let mut out = self.writer();
                out.write_error(&e.to_string());
                if let ConsoleError::ArityMismatch { usage, .. } = &e {
                    out.write_line(&format!("Usage: {usage}"));
                }
            },
        }
    }

    fn dispatch(&mut self, raw: &str) -> Result<()> {
        let tokens = parser::parse(raw).inspect_err(|e| trace(Stage::Parsing, e))?;
        let Some((name, rest)) = tokens.split_first() else {
            return Err(ConsoleError::EmptyInput);
        };

        let descriptor = self
            .registry
            .resolve_live(name, &self.scene)
            .ok_or_else(|| ConsoleError::CommandNotFound(name.clone()))
            .inspect_err(|e| trace(Stage::Resolving, e))?;

        if rest.len() != descriptor.params().len() {
            return Err(ConsoleError::ArityMismatch {
                given: rest.len(),
                expected: descriptor.params().len(),
                usage: descriptor.usage(),
            });
        }

        let args = convert_args(&self.converters, descriptor.params(), rest)?;

        if let Binding::Builtin(builtin) = descriptor.binding {
            return self.run_builtin(builtin, &args);
        }
        let Binding::Provider { key, handler } = &descriptor.binding else {
            return Err(ConsoleError::NoInstance);
        };

        let mut out = Writer::new(&mut self.transport, self.colors);
        let id = self
            .registry
            .find_instance(&self.scene, *key, &mut out)
            .inspect_err(|e| trace(Stage::Invoking, e))?;
        let (instance, target) = self
            .scene
            .target_mut(id)
            .ok_or(ConsoleError::NoInstance)?;
        log::debug!("Running {name} on {instance}");
        let mut call = Call {
            out,
            args,
            instance,
        };
        handler(target, &mut call).inspect_err(|e| trace(Stage::Invoking, e))
    }

    fn run_builtin(&mut self, builtin: Builtin, args: &Args) -> Result<()> {
        match builtin {
            Builtin::Help => {
                let names: Vec<&str> = self
                    .registry
                    .list_commands(&self.scene)
                    .iter()
                    .map(|d| d.name())
                    .collect();
                let mut out = Writer::new(&mut self.transport, self.colors);
                out.write_line("");
                out.write_bold("Available commands");
                out.write(": ");
                out.write(&names.join(", "));
            },
            Builtin::CHelp => {
                let name = args.text(0)?;
                let descriptor = self
                    .registry
                    .resolve_live(name, &self.scene)
                    .ok_or_else(|| ConsoleError::handler(format!("Invalid command <b>{name}</b>.")))?;
                let mut out = Writer::new(&mut self.transport, self.colors);
                out.write_line(descriptor.description());
                out.write_line(&format!("Usage: {}", descriptor.usage()));
            },
            Builtin::Quit => {
                log::info!("Quit requested from console");
                self.quit_requested = true;
            },
            Builtin::Close => {
                if self.transport.has_surface() {
                    self.transport.set_visible(false);
                }
            },
            Builtin::Clear => self.transport.clear_output(),
        }
        Ok(())
    }
}

/// Convert every token for its declared parameter.
///
/// Any failure collapses to [`ConsoleError::ParameterConversion`]; the
/// underlying cause only goes to the debug log.
fn convert_args(converters: &ConverterRegistry, params: &[Param], tokens: &[String]) -> Result<Args> {
    let mut values = Vec::with_capacity(params.len());
    for (param, token) in params.iter().zip(tokens) {
        let value = match coerce(param.ty, token) {
            Some(result) => result,
            None => match param.ty {
                ParamType::Typed(key) => {
                    let pieces: Vec<&str> = token.split(',').map(str::trim).collect();
                    let converted = match converters.convert(key, &pieces) {
                        // No overload for the split arity: take the token whole.
                        Err(ConsoleError::NoConversionOverload { .. }) if pieces.len() > 1 => {
                            converters.convert(key, &[token.as_str()])
                        },
                        result => result,
                    };
                    converted.map(Value::Typed)
                },
                _ => Err(ConsoleError::ParameterConversion),
            },
        };
        match value {
            Ok(v) => values.push(v),
            Err(e) => {
                log::debug!(
                    "{:?} '{token}' for {} ({}) failed: {e}",
                    Stage::Converting,
                    param.name,
                    param.ty.name()
                );
                return Err(ConsoleError::ParameterConversion);
            },
        }
    }
    Ok(Args::new(values))
}

fn trace(stage: Stage, err: &ConsoleError) {
    log::debug!("{stage:?} failed: {err}");
}

fn builtin_commands() -> Vec<CommandDescriptor> {
    let command = Param {
        name: "command".to_string(),
        ty: ParamType::Text,
        hint: None,
    };
    vec![
        CommandDescriptor::builtin("help", "Lists all available commands.", Vec::new(), Builtin::Help),
        CommandDescriptor::builtin(
            "chelp",
            "Shows the description and usage of a command.",
            vec![command],
            Builtin::CHelp,
        ),
        CommandDescriptor::builtin("quit", "Quits the application.", Vec::new(), Builtin::Quit),
        CommandDescriptor::builtin("close", "Closes the console window.", Vec::new(), Builtin::Close),
        CommandDescriptor::builtin("clear", "Clears the console output.", Vec::new(), Builtin::Clear),
    ]
}
