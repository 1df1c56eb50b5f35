//! # inputwatch-core
//!
//! Shared library for InputWatch containing the notification primitive, the
//! raw input vocabulary, and the two input-derived services.
//!
//! This crate has zero dependencies on OS APIs, timers, or threads.  Time is
//! always passed in as an [`std::time::Instant`] by the caller, which makes
//! every behaviour here deterministic under test.
//!
//! # Architecture overview (for beginners)
//!
//! InputWatch observes a user's keyboard and mouse and turns the raw event
//! stream into two higher-level signals:
//!
//! - **`event`** – [`Notifier`], a tiny publish/subscribe channel.  Listeners
//!   are invoked synchronously, in subscription order, on the thread that
//!   calls `trigger`.
//!
//! - **`input`** – The raw event types ([`RawInputEvent`]) and the
//!   [`InputHub`], the in-process registry that platform adapters publish to
//!   and that services attach to.
//!
//! - **`domain`** – The two services:
//!   - [`KeyStateTracker`]: per-key pressed/released state with edge
//!     detection (down, up, repeat) and chord queries.
//!   - [`ActivityMonitor`]: an ACTIVE/INACTIVE state driven by a rolling
//!     inactivity deadline.
//!
//! ```text
//! platform adapter ──publish──▶ InputHub ──▶ KeyStateTracker ──▶ on_key_down / on_key_up / on_key_pressed
//!                                        └──▶ ActivityMonitor ──▶ on_activity / on_change_activity_state
//! ```

pub mod domain;
pub mod event;
pub mod input;

// Re-export the most-used types at the crate root so callers can write
// `inputwatch_core::KeyStateTracker` instead of the full module path.
pub use domain::activity::{ActivityMonitor, ActivityState, DEFAULT_ACTIVITY_TIMEOUT};
pub use domain::key_state::{KeyStateTracker, KeyTransition};
pub use domain::timer::InactivityTimer;
pub use event::notifier::{ListenerId, Notifier};
pub use input::hub::{AttachError, Attachment, InputHub, StampedInput};
pub use input::raw::{MouseButton, RawInputEvent};
