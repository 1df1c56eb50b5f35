//! Named chord watches.
//!
//! A watch is evaluated on every key-down edge of the [`KeyStateTracker`].
//! It fires when the key that just went down belongs to the chord and the
//! whole chord is now held (with no other key held, for exclusive chords).
//! Auto-repeat never fires a watch because repeats are not down edges.

use std::cell::Cell;
use std::rc::Rc;

use inputwatch_core::{KeyStateTracker, ListenerId, Notifier};
use serde::Serialize;
use tracing::debug;

use crate::infrastructure::storage::config::ChordConfig;

/// Payload of a fired chord watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordMatch {
    pub name: String,
    pub keys: Vec<String>,
}

/// Evaluates configured chords against a key tracker.
#[derive(Debug)]
pub struct ChordWatcher {
    keys: Rc<KeyStateTracker>,
    chords: Vec<ChordConfig>,
    on_chord: Notifier<ChordMatch>,
    listener: Cell<Option<ListenerId>>,
}

impl ChordWatcher {
    /// Subscribes a watcher for `chords` to `keys.on_key_down()`.
    pub fn attach(keys: &Rc<KeyStateTracker>, chords: Vec<ChordConfig>) -> Rc<Self> {
        let watcher = Rc::new(Self {
            keys: Rc::clone(keys),
            chords,
            on_chord: Notifier::new(),
            listener: Cell::new(None),
        });

        let weak = Rc::downgrade(&watcher);
        let listener = keys.on_key_down().subscribe(move |key| {
            if let Some(watcher) = weak.upgrade() {
                watcher.evaluate(key);
            }
        });
        watcher.listener.set(Some(listener));
        debug!(chords = watcher.chords.len(), "chord watches attached");
        watcher
    }

    /// Configured chords, in evaluation order.
    pub fn chords(&self) -> &[ChordConfig] {
        &self.chords
    }

    /// Fires for every chord completed by a key-down edge.
    pub fn on_chord(&self) -> &Notifier<ChordMatch> {
        &self.on_chord
    }

    /// Checks every chord containing `key`; returns how many fired.
    pub fn evaluate(&self, key: &str) -> usize {
        let mut fired = 0;
        for chord in self.chords.iter().filter(|chord| chord.keys.iter().any(|k| k == key)) {
            let held = if chord.exclusive {
                self.keys.is_chord_pressed_exclusively(&chord.keys)
            } else {
                self.keys.is_chord_pressed(&chord.keys)
            };
            if held {
                debug!(chord = %chord.name, "chord matched");
                self.on_chord.trigger(&ChordMatch {
                    name: chord.name.clone(),
                    keys: chord.keys.clone(),
                });
                fired += 1;
            }
        }
        fired
    }

    /// Stops evaluating chords.  Returns `false` if already detached.
    pub fn detach(&self) -> bool {
        match self.listener.take() {
            Some(listener) => self.keys.on_key_down().unsubscribe(listener),
            None => false,
        }
    }
}
