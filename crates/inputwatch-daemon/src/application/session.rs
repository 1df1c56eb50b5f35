//! MonitorSession: the single-threaded dispatcher around the core services.
//!
//! Every raw event enters through [`MonitorSession::dispatch`], which stamps
//! it with the session [`Clock`] and publishes it through the [`InputHub`].
//! Both services listen on that hub, so the key tracker and the activity
//! monitor always observe events in the same order.
//!
//! The inactivity timer is a deadline, not a thread.  [`MonitorSession::run`]
//! bounds each wait on the event channel by that deadline and calls
//! [`MonitorSession::poll_timers`] after every wake-up.
//!
//! ```text
//! InputSource thread ──mpsc──▶ run() ──dispatch──▶ InputHub ──▶ KeyStateTracker
//!                               │                          └──▶ ActivityMonitor
//!                               └──poll_timers (deadline / idle poll)
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use inputwatch_core::{
    ActivityMonitor, ActivityState, AttachError, Attachment, InputHub, KeyStateTracker,
    RawInputEvent,
};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::infrastructure::input_source::{CaptureError, InputSource};
use crate::infrastructure::storage::config::MonitorConfig;

/// Upper bound on a single wait for input, so the running flag is re-checked.
pub const IDLE_POLL: Duration = Duration::from_millis(100);

/// Source of the current instant.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Attach(#[from] AttachError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Counters collected by [`MonitorSession::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Raw events dispatched.
    pub events: u64,
    /// ACTIVE/INACTIVE changes announced while running.
    pub activity_changes: u64,
    /// `true` if the loop ended because the source disconnected.
    pub source_exhausted: bool,
}

/// Owns the hub, both services and their attachments.
pub struct MonitorSession {
    hub: Rc<InputHub>,
    keys: Rc<KeyStateTracker>,
    activity: Rc<ActivityMonitor>,
    attachments: RefCell<Vec<Attachment>>,
    clock: Box<dyn Clock>,
}

impl MonitorSession {
    /// Builds the hub and starts both services on it.
    ///
    /// No inactivity timer is armed until the first qualifying signal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Attach`] if a service refuses to attach.
    pub fn new(config: &MonitorConfig, clock: Box<dyn Clock>) -> Result<Self, SessionError> {
        let hub = InputHub::new();
        let keys = Rc::new(KeyStateTracker::new());
        let activity = Rc::new(ActivityMonitor::with_timeout(config.activity_timeout()));

        let attachments = vec![keys.start(&hub)?, activity.start(&hub)?];
        info!(
            timeout_ms = config.activity_timeout_ms,
            "monitor session started"
        );

        Ok(Self {
            hub,
            keys,
            activity,
            attachments: RefCell::new(attachments),
            clock,
        })
    }

    pub fn hub(&self) -> &Rc<InputHub> {
        &self.hub
    }

    pub fn keys(&self) -> &Rc<KeyStateTracker> {
        &self.keys
    }

    pub fn activity(&self) -> &Rc<ActivityMonitor> {
        &self.activity
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) has run.
    pub fn is_attached(&self) -> bool {
        !self.attachments.borrow().is_empty()
    }

    /// Publishes one raw event stamped with the current instant.
    ///
    /// An overdue inactivity timer fires first, so a late event can never be
    /// reported before the INACTIVE transition that preceded it.
    pub fn dispatch(&self, event: RawInputEvent) {
        let now = self.clock.now();
        self.activity.poll(now);
        trace!(kind = event.kind(), "dispatching raw event");
        self.hub.publish(event, now);
    }

    /// Fires the inactivity timer if it is due.  Returns the change it caused.
    pub fn poll_timers(&self) -> Option<ActivityState> {
        self.activity.poll(self.clock.now())
    }

    /// Instant at which the pending inactivity timer elapses, if armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.activity.next_deadline()
    }

    /// Changes the inactivity window and re-arms the timer from now.
    pub fn set_activity_timeout(&self, timeout: Duration) {
        self.activity
            .set_timeout_duration(timeout, self.clock.now());
    }

    /// How long the loop may block before a timer needs attention.
    fn wait_budget(&self) -> Duration {
        match self.next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(self.clock.now())
                .min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    /// Dispatches events from `events` until `running` clears or the sender
    /// side disconnects.
    ///
    /// After a disconnect the loop keeps waiting for a pending inactivity
    /// deadline (unless `running` clears) so the final transition is still
    /// announced.
    pub fn run(&self, events: &Receiver<RawInputEvent>, running: &AtomicBool) -> RunSummary {
        let changes = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&changes);
        let listener = self
            .activity
            .on_change_activity_state()
            .subscribe(move |_| counter.set(counter.get() + 1));

        let mut summary = RunSummary::default();
        while running.load(Ordering::Relaxed) {
            match events.recv_timeout(self.wait_budget()) {
                Ok(event) => {
                    self.dispatch(event);
                    summary.events += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("input source disconnected");
                    summary.source_exhausted = true;
                    break;
                }
            }
            self.poll_timers();
        }

        if summary.source_exhausted {
            self.wait_out_deadline(running);
        }

        self.activity.on_change_activity_state().unsubscribe(listener);
        summary.activity_changes = changes.get();
        info!(
            events = summary.events,
            activity_changes = summary.activity_changes,
            "dispatcher stopped"
        );
        summary
    }

    /// Starts `source`, runs the loop on its channel and stops it again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Capture`] if the source fails to start.
    pub fn run_source(
        &self,
        source: &dyn InputSource,
        running: &AtomicBool,
    ) -> Result<RunSummary, SessionError> {
        let events = source.start()?;
        let summary = self.run(&events, running);
        source.stop();
        Ok(summary)
    }

    /// Sleeps in `IDLE_POLL` steps until the pending deadline fires.
    ///
    /// The number of steps is fixed up front from the remaining time, so a
    /// clock that does not advance cannot keep the loop alive.
    fn wait_out_deadline(&self, running: &AtomicBool) {
        let Some(deadline) = self.next_deadline() else {
            return;
        };
        let remaining = deadline.saturating_duration_since(self.clock.now());
        let max_steps = remaining.as_millis() / IDLE_POLL.as_millis() + 2;

        for _ in 0..max_steps {
            if !running.load(Ordering::Relaxed) || self.next_deadline().is_none() {
                return;
            }
            let now = self.clock.now();
            if now >= deadline {
                self.poll_timers();
            } else {
                thread::sleep((deadline - now).min(IDLE_POLL));
            }
        }

        if self.next_deadline().is_some() {
            debug!("clock never reached the inactivity deadline; giving up");
        }
    }

    /// Detaches both services from the hub.  Safe to call more than once.
    pub fn shutdown(&self) {
        let attachments: Vec<Attachment> = self.attachments.borrow_mut().drain(..).collect();
        if attachments.is_empty() {
            return;
        }
        for attachment in attachments {
            attachment.detach();
        }
        info!("monitor session shut down");
    }
}
