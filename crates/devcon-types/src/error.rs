//! Error types for devcon.
//!
//! Display strings are user-facing: the dispatcher writes them to the output
//! sink verbatim, so they may carry `<b>` markup that plain transports
//! rewrite.

use std::io;

/// Errors produced by the console.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Empty input.")]
    EmptyInput,

    #[error("Unterminated quote in input.")]
    MalformedQuoting,

    #[error("Command <b>{0}</b> not found.")]
    CommandNotFound(String),

    #[error("{given} parameters given but {expected} expected.")]
    ArityMismatch {
        given: usize,
        expected: usize,
        usage: String,
    },

    #[error("Parameter conversion error.")]
    ParameterConversion,

    #[error("No conversion found for type '{type_name}' that takes {arity} parameters.")]
    NoConversionOverload { type_name: String, arity: usize },

    #[error("{0}")]
    Conversion(String),

    #[error("Object with name <b>{0}</b> not found.")]
    ReferenceNotFound(String),

    #[error("No executable instance found.")]
    NoInstance,

    /// Raised by a command handler. An empty message means the handler has
    /// already written its own error text.
    #[error("{0}")]
    Handler(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ConsoleError {
    /// Handler failure with a message for the user.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Handler failure that has already been reported.
    pub fn silent() -> Self {
        Self::Handler(String::new())
    }

    /// Whether this error should produce no output at the dispatcher.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Handler(msg) if msg.is_empty())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_not_found_display() {
        let e = ConsoleError::CommandNotFound("warp".into());
        assert_eq!(format!("{e}"), "Command <b>warp</b> not found.");
    }

    #[test]
    fn arity_display_has_both_counts() {
        let e = ConsoleError::ArityMismatch {
            given: 3,
            expected: 1,
            usage: "<b>scale</b> [factor]".into(),
        };
        assert_eq!(format!("{e}"), "3 parameters given but 1 expected.");
    }

    #[test]
    fn conversion_display() {
        assert_eq!(
            format!("{}", ConsoleError::ParameterConversion),
            "Parameter conversion error."
        );
    }

    #[test]
    fn no_overload_display() {
        let e = ConsoleError::NoConversionOverload {
            type_name: "Color".into(),
            arity: 2,
        };
        assert_eq!(
            format!("{e}"),
            "No conversion found for type 'Color' that takes 2 parameters."
        );
    }

    #[test]
    fn no_instance_display() {
        assert_eq!(
            format!("{}", ConsoleError::NoInstance),
            "No executable instance found."
        );
    }

    #[test]
    fn silent_handler_error() {
        assert!(ConsoleError::silent().is_silent());
        assert!(!ConsoleError::handler("boom").is_silent());
        assert!(!ConsoleError::NoInstance.is_silent());
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: ConsoleError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: ConsoleError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }
}
