//! ActivityMonitor: rolling ACTIVE/INACTIVE detection.
//!
//! # State machine
//!
//! ```text
//!            qualifying signal (re-arms timer)
//!          ┌──────────────────────────────┐
//!          ▼                              │
//!   (unset) ──signal──▶ ACTIVE ───────────┘
//!                        │   ▲
//!         timer elapsed  │   │ qualifying signal
//!                        ▼   │
//!                      INACTIVE
//! ```
//!
//! Qualifying signals are pointer moves, pointer button presses, and key
//! releases.  Key presses do not qualify, so a held key's auto-repeat does not
//! keep the user "active".
//!
//! Every qualifying signal re-arms the inactivity timer, so INACTIVE is only
//! reached after a contiguous quiet period of [`ActivityMonitor::timeout_duration`].
//!
//! The monitor never reads a clock.  Callers pass the current `Instant` and
//! call [`ActivityMonitor::poll`] when [`ActivityMonitor::next_deadline`] has
//! been reached.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::timer::InactivityTimer;
use crate::event::notifier::Notifier;
use crate::input::hub::{AttachError, Attachment, InputHub};
use crate::input::raw::RawInputEvent;

/// Inactivity window used when none is configured.
pub const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_millis(3000);

/// Whether the user is currently interacting with the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
    Active,
    Inactive,
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityState::Active => f.write_str("active"),
            ActivityState::Inactive => f.write_str("inactive"),
        }
    }
}

/// Tracks user activity with a debounced inactivity timeout.
///
/// Intended to be shared as `Rc<ActivityMonitor>`.
#[derive(Debug)]
pub struct ActivityMonitor {
    state: Cell<Option<ActivityState>>,
    timeout: Cell<Duration>,
    timer: Cell<InactivityTimer>,
    on_activity: Notifier<()>,
    on_change_activity_state: Notifier<ActivityState>,
    attached: Rc<Cell<bool>>,
}

impl ActivityMonitor {
    /// Creates a monitor with the default 3000 ms timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ACTIVITY_TIMEOUT)
    }

    /// Creates a monitor with a custom timeout.  No timer is armed until the
    /// first qualifying signal or timeout change.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Cell::new(None),
            timeout: Cell::new(timeout),
            timer: Cell::new(InactivityTimer::new()),
            on_activity: Notifier::new(),
            on_change_activity_state: Notifier::new(),
            attached: Rc::new(Cell::new(false)),
        }
    }

    /// Attaches the monitor to `hub`; qualifying events are timed with the
    /// instant the hub stamped them with.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::AlreadyAttached`] if the monitor already listens
    /// on a hub and has not been detached.
    pub fn start(self: &Rc<Self>, hub: &Rc<InputHub>) -> Result<Attachment, AttachError> {
        let monitor = Rc::downgrade(self);
        hub.attach("activity", &self.attached, move |input| {
            if let Some(monitor) = monitor.upgrade() {
                monitor.handle_event(&input.event, input.at);
            }
        })
    }

    /// Returns `true` while the monitor is attached to a hub.
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    // ── State & configuration ─────────────────────────────────────────────────

    /// Current state, or `None` before the first qualifying signal.
    pub fn activity_state(&self) -> Option<ActivityState> {
        self.state.get()
    }

    /// Returns `true` if the current state is [`ActivityState::Active`].
    pub fn is_active(&self) -> bool {
        self.state.get() == Some(ActivityState::Active)
    }

    /// The inactivity window.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.get()
    }

    /// Changes the inactivity window and re-arms the timer at `now + timeout`.
    ///
    /// The timer is re-armed whatever the current state, so this can postpone
    /// an INACTIVE transition that was about to happen.
    pub fn set_timeout_duration(&self, timeout: Duration, now: Instant) {
        self.timeout.set(timeout);
        self.rearm(now);
        debug!(timeout_ms = timeout.as_millis() as u64, "activity timeout changed");
    }

    /// The instant at which the pending inactivity timer elapses, if armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.get().deadline()
    }

    // ── Channels ──────────────────────────────────────────────────────────────

    /// Fires on every qualifying signal, whatever the current state.
    ///
    /// Expect bursts: pointer movement produces one signal per reported move.
    pub fn on_activity(&self) -> &Notifier<()> {
        &self.on_activity
    }

    /// Fires with the new state whenever the state actually changes.
    pub fn on_change_activity_state(&self) -> &Notifier<ActivityState> {
        &self.on_change_activity_state
    }

    // ── Event handling ────────────────────────────────────────────────────────

    /// Returns `true` for the event kinds that count as user activity.
    pub fn is_qualifying(event: &RawInputEvent) -> bool {
        matches!(
            event,
            RawInputEvent::MouseMove { .. }
                | RawInputEvent::MouseDown { .. }
                | RawInputEvent::KeyUp { .. }
        )
    }

    /// Feeds one raw event observed at `now`.  Returns `true` if it qualified.
    pub fn handle_event(&self, event: &RawInputEvent, now: Instant) -> bool {
        if !Self::is_qualifying(event) {
            return false;
        }
        trace!(kind = event.kind(), "qualifying activity");
        self.record_activity(now);
        true
    }

    /// Records one qualifying signal at `now`.
    pub fn record_activity(&self, now: Instant) {
        self.transition_to(ActivityState::Active, now);
        self.on_activity.notify();
    }

    /// Fires the inactivity timer if it is due at `now`.
    ///
    /// Returns the state change it caused, if any.
    pub fn poll(&self, now: Instant) -> Option<ActivityState> {
        let mut timer = self.timer.get();
        if !timer.take_due(now) {
            return None;
        }
        self.timer.set(timer);

        if self.transition_to(ActivityState::Inactive, now) {
            Some(ActivityState::Inactive)
        } else {
            None
        }
    }

    /// Stores `next`, announces it if it differs from the previous state (an
    /// unset state counts as inactive), and re-arms the timer when entering
    /// or staying ACTIVE.  Returns `true` if a change was announced.
    fn transition_to(&self, next: ActivityState, now: Instant) -> bool {
        let previous = self
            .state
            .replace(Some(next))
            .unwrap_or(ActivityState::Inactive);

        let changed = previous != next;
        if changed {
            debug!(from = %previous, to = %next, "activity state changed");
            self.on_change_activity_state.trigger(&next);
        }

        if next == ActivityState::Active {
            self.rearm(now);
        }
        changed
    }

    fn rearm(&self, now: Instant) {
        let mut timer = self.timer.get();
        timer.arm(now, self.timeout.get());
        self.timer.set(timer);
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
