//! Network transport for the developer console.
//!
//! Serves one TCP client at a time. The client sends newline-terminated
//! command lines; every response is zero or more newline-terminated output
//! lines followed by a NUL byte. Sending `exit` ends the session.

mod server;
mod transport;

pub use transport::NetworkTransport;
