//! Foundation types for the devcon console.
//!
//! This crate holds the types shared by every devcon crate: the error enum,
//! colors and vectors produced by argument conversion, local-surface input
//! events, and the TOML configuration.

pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod math;
