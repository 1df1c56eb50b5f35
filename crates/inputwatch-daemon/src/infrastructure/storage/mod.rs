//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from an explicit path or the
//!   platform-appropriate directory.
//! - Providing sensible defaults when the file does not exist yet (first run).
//! - Writing a default file for users who want a starting point.

pub mod config;
