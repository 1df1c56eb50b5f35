//! Input sources for the daemon.
//!
//! A source produces [`RawInputEvent`]s on its own thread and hands them to
//! the dispatcher through an `mpsc` channel.  The dispatcher thread is the
//! only place where key and activity state is mutated.
//!
//! # Available sources
//!
//! - [`json_lines::JsonLinesInputSource`] – newline-delimited JSON replay from a
//!   file or stdin, with optional per-line delays to reproduce real pacing.
//! - [`mock::MockInputSource`] – tests inject synthetic events directly.
//!
//! # Testability
//!
//! The `InputSource` trait allows the session to be driven without any
//! platform hooks.

use std::sync::mpsc;

use inputwatch_core::RawInputEvent;

pub mod json_lines;
pub mod mock;

/// Error type for input source operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("input source has already been started")]
    AlreadyStarted,
    #[error("input source has already been stopped")]
    AlreadyStopped,
    #[error("failed to spawn input reader thread: {0}")]
    Spawn(String),
    #[error("failed to open input {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait abstracting raw input event production.
pub trait InputSource: Send {
    /// Starts the source and returns a receiver for produced events.
    ///
    /// The channel disconnects when the source is exhausted or stopped.
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError>;
    /// Stops the source and releases its resources.
    fn stop(&self);
}
