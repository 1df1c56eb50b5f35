//! Reporter: one JSON object per notification, one object per line.
//!
//! ```text
//! {"event":"key_down","key":"Shift"}
//! {"event":"key_repeat","key":"Shift"}
//! {"event":"key_up","key":"Shift"}
//! {"event":"activity"}
//! {"event":"activity_state","state":"inactive"}
//! {"event":"chord","name":"save","keys":["Control","s"]}
//! ```
//!
//! Write failures are logged and swallowed; they must not interrupt the
//! dispatcher that is notifying us.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use inputwatch_core::{ActivityMonitor, ActivityState, KeyStateTracker, ListenerId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::chords::{ChordMatch, ChordWatcher};
use crate::application::session::MonitorSession;
use crate::infrastructure::storage::config::ReportConfig;

/// One line of the report stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    KeyDown { key: String },
    KeyUp { key: String },
    KeyRepeat { key: String },
    Activity,
    ActivityState { state: ActivityState },
    Chord { name: String, keys: Vec<String> },
}

impl From<&ChordMatch> for ReportEvent {
    fn from(m: &ChordMatch) -> Self {
        ReportEvent::Chord {
            name: m.name.clone(),
            keys: m.keys.clone(),
        }
    }
}

type Sink = Rc<RefCell<dyn Write>>;

/// Which channel a subscription lives on, so it can be removed again.
#[derive(Debug)]
enum Subscription {
    KeyDown(ListenerId),
    KeyUp(ListenerId),
    KeyRepeat(ListenerId),
    Activity(ListenerId),
    ActivityState(ListenerId),
    Chord(Rc<ChordWatcher>, ListenerId),
}

/// Writes notifications of a [`MonitorSession`] to a sink.
pub struct Reporter {
    keys: Rc<KeyStateTracker>,
    activity: Rc<ActivityMonitor>,
    sink: Sink,
    subscriptions: Vec<Subscription>,
}

impl Reporter {
    /// Subscribes to the channels enabled in `config`.
    pub fn attach<W: Write + 'static>(
        session: &MonitorSession,
        sink: Rc<RefCell<W>>,
        config: &ReportConfig,
    ) -> Self {
        let mut reporter = Self {
            keys: Rc::clone(session.keys()),
            activity: Rc::clone(session.activity()),
            sink,
            subscriptions: Vec::new(),
        };

        if config.key_events {
            let keys = Rc::clone(&reporter.keys);
            let down = keys.on_key_down().subscribe(reporter.emitter(|key: &str| {
                ReportEvent::KeyDown { key: key.to_string() }
            }));
            let up = keys.on_key_up().subscribe(reporter.emitter(|key: &str| {
                ReportEvent::KeyUp { key: key.to_string() }
            }));
            let repeat = keys.on_key_pressed().subscribe(reporter.emitter(|key: &str| {
                ReportEvent::KeyRepeat { key: key.to_string() }
            }));
            reporter.subscriptions.extend([
                Subscription::KeyDown(down),
                Subscription::KeyUp(up),
                Subscription::KeyRepeat(repeat),
            ]);
        }

        if config.activity_pulses {
            let id = reporter
                .activity
                .on_activity()
                .subscribe(reporter.emitter(|_: &()| ReportEvent::Activity));
            reporter.subscriptions.push(Subscription::Activity(id));
        }

        if config.activity_changes {
            let id = reporter
                .activity
                .on_change_activity_state()
                .subscribe(reporter.emitter(|state: &ActivityState| {
                    ReportEvent::ActivityState { state: *state }
                }));
            reporter.subscriptions.push(Subscription::ActivityState(id));
        }

        reporter
    }

    /// Forwards every match of `watcher` to the sink.
    pub fn forward_chords(&mut self, watcher: &Rc<ChordWatcher>) {
        let id = watcher
            .on_chord()
            .subscribe(self.emitter(|m: &ChordMatch| ReportEvent::from(m)));
        self.subscriptions
            .push(Subscription::Chord(Rc::clone(watcher), id));
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Writes `event` directly.
    pub fn emit(&self, event: &ReportEvent) {
        write_event(&self.sink, event);
    }

    /// Removes every subscription.
    pub fn detach(self) {
        for subscription in self.subscriptions {
            match subscription {
                Subscription::KeyDown(id) => self.keys.on_key_down().unsubscribe(id),
                Subscription::KeyUp(id) => self.keys.on_key_up().unsubscribe(id),
                Subscription::KeyRepeat(id) => self.keys.on_key_pressed().unsubscribe(id),
                Subscription::Activity(id) => self.activity.on_activity().unsubscribe(id),
                Subscription::ActivityState(id) => {
                    self.activity.on_change_activity_state().unsubscribe(id)
                }
                Subscription::Chord(watcher, id) => watcher.on_chord().unsubscribe(id),
            };
        }
    }

    fn emitter<T: ?Sized + 'static, F>(&self, to_event: F) -> impl Fn(&T) + 'static
    where
        F: Fn(&T) -> ReportEvent + 'static,
    {
        let sink = Rc::clone(&self.sink);
        move |payload| write_event(&sink, &to_event(payload))
    }
}

fn write_event(sink: &RefCell<dyn Write>, event: &ReportEvent) {
    let result = match sink.try_borrow_mut() {
        Ok(mut sink) => write_line(&mut *sink, event),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "report sink is busy",
        )),
    };
    if let Err(e) = result {
        warn!("failed to write report line: {e}");
    }
}

fn write_line(sink: &mut dyn Write, event: &ReportEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *sink, event)?;
    sink.write_all(b"\n")?;
    sink.flush()
}
