//! Infrastructure layer for the daemon.
//!
//! Contains OS-facing adapters: raw input sources and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `inputwatch_core`, but MUST
//! NOT be imported by the core crate.

pub mod input_source;
pub mod storage;
