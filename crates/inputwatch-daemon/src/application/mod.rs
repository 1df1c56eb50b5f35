//! Application layer of the daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The core crate knows *what* key state and activity mean, but it never reads
//! a clock, never owns a thread and never writes output.  The application
//! layer wires those pure services into something that runs:
//!
//! - **Orchestrate** the hub and both services for the lifetime of a session.
//! - **Depend on abstractions** ([`session::Clock`], the
//!   `InputSource` trait) so tests can drive everything deterministically.
//! - **Contain no file system access**; sinks and sources are handed in.
//!
//! # Sub-modules
//!
//! - **`session`** – [`session::MonitorSession`] owns the hub, the
//!   [`KeyStateTracker`](inputwatch_core::KeyStateTracker) and the
//!   [`ActivityMonitor`](inputwatch_core::ActivityMonitor), stamps incoming
//!   events with the clock, and runs the dispatcher loop that fires the
//!   inactivity timer on time.
//!
//! - **`chords`** – Named chord watches evaluated on every key-down edge.
//!
//! - **`report`** – Turns notifications into one JSON object per line.

pub mod chords;
pub mod report;
pub mod session;
