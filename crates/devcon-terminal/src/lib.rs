//! Developer console core.
//!
//! Lines typed into a transport are parsed into tokens, resolved against
//! the command registry, converted to typed arguments, and dispatched to a
//! live provider instance. Output flows back through the same transport as
//! lightly marked-up text.

pub mod console;
pub mod convert;
pub mod history;
pub mod parser;
pub mod registry;
pub mod transport;
pub mod writer;

/// Dispatcher bound to one transport.
pub use console::Console;
/// Converter trait, typed converter registry, and parameter kinds.
pub use convert::{Args, Converter, ConverterRegistry, EntityConverter, EntityRef, Overload, ParamType};
/// Bounded input history.
pub use history::History;
/// Split a raw line into tokens.
pub use parser::parse;
/// Command descriptors, providers, and live instances.
pub use registry::{Call, CommandDescriptor, CommandProvider, CommandRegistry, InstanceId, Scene};
/// Transport contract and the in-process local transport.
pub use transport::{LocalTransport, Transport};
/// Formatted output.
pub use writer::{OutputStyle, Writer};
