//! KeyStateTracker: per-key pressed state with edge detection.
//!
//! The tracker keeps a map from key identifier to "is down".  Every raw
//! key event runs the same four steps:
//!
//! 1. Read the previous state for the key (unseen keys are up).
//! 2. Compute the new state: `true` for key-down, `false` for key-up.
//! 3. Write the new state into the map.
//! 4. Fire at most one notification:
//!
//! | previous | new   | notification      |
//! |----------|-------|-------------------|
//! | down     | up    | `on_key_up`       |
//! | up       | down  | `on_key_down`     |
//! | down     | down  | `on_key_pressed`  |
//! | up       | up    | none              |
//!
//! Because step 3 happens before step 4, listeners that query the tracker
//! always see the state that includes the event they are being told about.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::event::notifier::Notifier;
use crate::input::hub::{AttachError, Attachment, InputHub};
use crate::input::raw::RawInputEvent;

/// Classification of a single key event, matching the channel that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTransition {
    /// Up → down.  `on_key_down` fired.
    Down,
    /// Down → up.  `on_key_up` fired.
    Up,
    /// Down → down (auto-repeat).  `on_key_pressed` fired.
    Repeat,
}

/// Tracks which keys are currently held down.
///
/// Intended to be shared as `Rc<KeyStateTracker>`; every method takes `&self`
/// so listeners can query the tracker while it is notifying them.
#[derive(Debug, Default)]
pub struct KeyStateTracker {
    keys: RefCell<HashMap<String, bool>>,
    on_key_down: Notifier<str>,
    on_key_up: Notifier<str>,
    on_key_pressed: Notifier<str>,
    attached: Rc<Cell<bool>>,
}

impl KeyStateTracker {
    /// Creates a tracker with no known keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the tracker to `hub` so every raw key event updates it.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::AlreadyAttached`] if the tracker already listens
    /// on a hub and has not been detached.
    pub fn start(self: &Rc<Self>, hub: &Rc<InputHub>) -> Result<Attachment, AttachError> {
        let tracker = Rc::downgrade(self);
        hub.attach("key_state", &self.attached, move |input| {
            if let Some(tracker) = tracker.upgrade() {
                tracker.handle_event(&input.event);
            }
        })
    }

    /// Returns `true` while the tracker is attached to a hub.
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Whether `key` is currently pressed.  Unseen keys are not pressed.
    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.keys.borrow().get(key).copied().unwrap_or(false)
    }

    /// Whether `key` is currently up.  Always `!is_key_pressed(key)`, so
    /// unseen keys are up.
    pub fn is_key_up(&self, key: &str) -> bool {
        !self.is_key_pressed(key)
    }

    /// Whether every key in `keys` is pressed.  Other keys may be pressed too.
    ///
    /// An empty chord is vacuously pressed.
    pub fn is_chord_pressed<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().all(|key| self.is_key_pressed(key.as_ref()))
    }

    /// Whether every key in `keys` is pressed and no other key is.
    ///
    /// The check compares the number of pressed keys with `keys.len()`.
    /// Duplicate identifiers are not collapsed, so passing the same key twice
    /// can never match exclusively; callers should pass distinct keys.
    pub fn is_chord_pressed_exclusively<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        self.is_chord_pressed(keys) && self.pressed_count() == keys.len()
    }

    /// Number of keys currently pressed.
    pub fn pressed_count(&self) -> usize {
        self.keys.borrow().values().filter(|down| **down).count()
    }

    /// Sorted snapshot of the keys currently pressed.
    pub fn pressed_keys(&self) -> Vec<String> {
        let mut pressed: Vec<String> = self
            .keys
            .borrow()
            .iter()
            .filter(|(_, down)| **down)
            .map(|(key, _)| key.clone())
            .collect();
        pressed.sort();
        pressed
    }

    // ── Channels ──────────────────────────────────────────────────────────────

    /// Fires once when a key goes from up to down.
    pub fn on_key_down(&self) -> &Notifier<str> {
        &self.on_key_down
    }

    /// Fires once when a key goes from down to up.
    pub fn on_key_up(&self) -> &Notifier<str> {
        &self.on_key_up
    }

    /// Fires for every repeated key-down while the key is already down.
    pub fn on_key_pressed(&self) -> &Notifier<str> {
        &self.on_key_pressed
    }

    // ── Event handling ────────────────────────────────────────────────────────

    /// Feeds one raw event.  Non-key events are ignored.
    pub fn handle_event(&self, event: &RawInputEvent) -> Option<KeyTransition> {
        match event {
            RawInputEvent::KeyDown { key } => self.apply_key(key, true),
            RawInputEvent::KeyUp { key } => self.apply_key(key, false),
            _ => None,
        }
    }

    /// Runs edge detection for one key event and fires the matching channel.
    pub fn apply_key(&self, key: &str, is_down: bool) -> Option<KeyTransition> {
        let was_down = {
            let mut keys = self.keys.borrow_mut();
            match keys.get_mut(key) {
                Some(state) => std::mem::replace(state, is_down),
                None => {
                    keys.insert(key.to_string(), is_down);
                    false
                }
            }
        };

        let transition = match (was_down, is_down) {
            (true, false) => KeyTransition::Up,
            (false, true) => KeyTransition::Down,
            (true, true) => KeyTransition::Repeat,
            (false, false) => {
                trace!(key, "release of a key not recorded as pressed");
                return None;
            }
        };

        trace!(key, ?transition, "key transition");
        match transition {
            KeyTransition::Up => self.on_key_up.trigger(key),
            KeyTransition::Down => self.on_key_down.trigger(key),
            KeyTransition::Repeat => self.on_key_pressed.trigger(key),
        }
        Some(transition)
    }

    // ── Test support ──────────────────────────────────────────────────────────

    /// Writes a key's state directly, without edge detection or notifications.
    ///
    /// Meant for tests and for restoring a known state after focus changes.
    pub fn seed_key_state(&self, key: impl Into<String>, is_down: bool) {
        self.keys.borrow_mut().insert(key.into(), is_down);
    }

    /// Forgets every key, without notifications.
    pub fn reset(&self) {
        self.keys.borrow_mut().clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
