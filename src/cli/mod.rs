#![forbid(unsafe_code)]

//! Command-line support: configuration file handling and command-stream
//! replay.

/// TOML configuration for the `arbor` binary.
pub mod config;

/// Applies JSON-lines command streams to a session.
pub mod replay;
