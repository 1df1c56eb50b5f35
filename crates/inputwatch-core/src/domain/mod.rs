//! Input-derived services.
//!
//! # What lives here? (for beginners)
//!
//! Everything in this module is pure state-machine logic.  None of it reads a
//! clock, spawns a thread, or talks to the OS:
//!
//! - Raw events arrive through an [`InputHub`](crate::input::hub::InputHub)
//!   listener (or a direct method call in tests).
//! - Time arrives as an explicit `Instant` argument.
//! - Results leave through [`Notifier`](crate::event::notifier::Notifier)
//!   channels.
//!
//! That makes each service testable with synthetic timelines, and lets the
//! daemon decide how to wait for the next deadline.

/// Rolling ACTIVE/INACTIVE detection.
pub mod activity;

/// Per-key pressed state with edge detection and chord queries.
pub mod key_state;

/// Single-deadline timer used by the activity monitor.
pub mod timer;
