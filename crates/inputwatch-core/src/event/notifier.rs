//! Notifier: a typed, synchronous publish/subscribe channel.
//!
//! Producers call [`Notifier::trigger`] with a payload; every listener that is
//! subscribed at that moment is invoked immediately, in the order it was
//! subscribed, on the calling thread.  There is no queue, no buffering, and no
//! async boundary.
//!
//! # Why `Rc` and `RefCell`? (for beginners)
//!
//! InputWatch services are single-threaded by construction: raw events and
//! timer wake-ups are handled one at a time on the dispatcher thread.  Using
//! `Rc`/`RefCell` instead of `Arc`/`Mutex` makes that explicit in the type
//! system (`Notifier` is `!Send`) and avoids any locking on the hot path.
//!
//! Listeners are snapshotted before delivery, so a listener may subscribe or
//! unsubscribe (itself or others) while a trigger is in progress.  Such changes
//! take effect from the next trigger.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle identifying one subscription on one [`Notifier`].
///
/// Ids are unique per notifier and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<T> = Rc<dyn Fn(&T)>;

/// A typed synchronous publish/subscribe channel.
///
/// `T` may be unsized, so `Notifier<str>` delivers `&str` payloads without
/// allocating.
pub struct Notifier<T: ?Sized> {
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    next_id: Cell<u64>,
}

impl<T: ?Sized> Notifier<T> {
    /// Creates a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers `listener`; it is invoked by every subsequent [`trigger`](Self::trigger).
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe_shared(Rc::new(listener))
    }

    /// Registers an already shared listener.
    ///
    /// Subscribing the same `Rc` twice creates two registrations, and the
    /// listener is invoked twice per trigger.
    pub fn subscribe_shared(&self, listener: Rc<dyn Fn(&T)>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes the subscription identified by `id`.
    ///
    /// Returns `false` (and does nothing) if `id` is not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|(existing, _)| *existing == id) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes the earliest registration of `listener`, compared by identity.
    ///
    /// Returns `false` (and does nothing) if the listener is not subscribed.
    pub fn unsubscribe_listener(&self, listener: &Rc<dyn Fn(&T)>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners
            .iter()
            .position(|(_, existing)| same_listener(existing, listener))
        {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Synchronously invokes every current listener, in subscription order.
    pub fn trigger(&self, payload: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(payload);
        }
    }

    /// Number of active registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns `true` if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl Notifier<()> {
    /// Triggers a payload-less signal.
    pub fn notify(&self) {
        self.trigger(&());
    }
}

impl<T: ?Sized> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Identity comparison on the data pointer only; vtable pointers for the same
/// closure may differ between codegen units.
fn same_listener<T: ?Sized>(a: &Listener<T>, b: &Listener<T>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Rc<dyn Fn(&str)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_for_factory = Rc::clone(&log);
        let factory = move |tag: &str| -> Rc<dyn Fn(&str)> {
            let log = Rc::clone(&log_for_factory);
            let tag = tag.to_string();
            Rc::new(move |payload: &str| log.borrow_mut().push(format!("{tag}:{payload}")))
        };
        (log, factory)
    }

    #[test]
    fn test_trigger_invokes_listeners_in_subscription_order() {
        // Arrange
        let notifier: Notifier<str> = Notifier::new();
        let (log, listener) = recorder();
        notifier.subscribe_shared(listener("first"));
        notifier.subscribe_shared(listener("second"));
        notifier.subscribe_shared(listener("third"));

        // Act
        notifier.trigger("A");

        // Assert
        assert_eq!(*log.borrow(), vec!["first:A", "second:A", "third:A"]);
    }

    #[test]
    fn test_trigger_without_listeners_is_a_no_op() {
        let notifier: Notifier<str> = Notifier::new();
        notifier.trigger("ignored");
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_subscribing_same_listener_twice_invokes_it_twice() {
        // Arrange
        let notifier: Notifier<str> = Notifier::new();
        let (log, listener) = recorder();
        let shared = listener("dup");
        notifier.subscribe_shared(Rc::clone(&shared));
        notifier.subscribe_shared(shared);

        // Act
        notifier.trigger("x");

        // Assert
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(notifier.listener_count(), 2);
    }

    #[test]
    fn test_unsubscribe_by_id_stops_delivery() {
        let notifier: Notifier<str> = Notifier::new();
        let (log, listener) = recorder();
        let id = notifier.subscribe_shared(listener("gone"));
        notifier.subscribe_shared(listener("kept"));

        assert!(notifier.unsubscribe(id));
        notifier.trigger("y");

        assert_eq!(*log.borrow(), vec!["kept:y"]);
    }

    #[test]
    fn test_unsubscribe_unknown_id_is_a_no_op() {
        let notifier: Notifier<str> = Notifier::new();
        let id = notifier.subscribe(|_| {});
        assert!(notifier.unsubscribe(id));

        // Second removal of the same id does nothing.
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_listener_removes_one_registration_at_a_time() {
        // Arrange
        let notifier: Notifier<str> = Notifier::new();
        let (log, listener) = recorder();
        let shared = listener("dup");
        notifier.subscribe_shared(Rc::clone(&shared));
        notifier.subscribe_shared(Rc::clone(&shared));

        // Act
        assert!(notifier.unsubscribe_listener(&shared));
        notifier.trigger("z");

        // Assert – one registration remains
        assert_eq!(*log.borrow(), vec!["dup:z"]);
    }

    #[test]
    fn test_unsubscribe_listener_never_subscribed_is_a_no_op() {
        let notifier: Notifier<str> = Notifier::new();
        let (_log, listener) = recorder();
        notifier.subscribe_shared(listener("subscribed"));

        let stranger = listener("stranger");
        assert!(!notifier.unsubscribe_listener(&stranger));
        assert_eq!(notifier.listener_count(), 1);
    }

    #[test]
    fn test_listener_subscribed_during_trigger_runs_from_next_trigger() {
        // Arrange
        let notifier: Rc<Notifier<()>> = Rc::new(Notifier::new());
        let late_calls = Rc::new(Cell::new(0u32));

        let notifier_in_listener = Rc::clone(&notifier);
        let late_calls_in_listener = Rc::clone(&late_calls);
        let armed = Cell::new(false);
        notifier.subscribe(move |_| {
            if !armed.replace(true) {
                let counter = Rc::clone(&late_calls_in_listener);
                notifier_in_listener.subscribe(move |_| counter.set(counter.get() + 1));
            }
        });

        // Act
        notifier.notify();
        assert_eq!(late_calls.get(), 0, "new listener must not see the in-flight trigger");
        notifier.notify();

        // Assert
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_while_triggered() {
        let notifier: Rc<Notifier<u32>> = Rc::new(Notifier::new());
        let calls = Rc::new(Cell::new(0u32));
        let own_id = Rc::new(Cell::new(None));

        let notifier_in_listener = Rc::clone(&notifier);
        let calls_in_listener = Rc::clone(&calls);
        let own_id_in_listener = Rc::clone(&own_id);
        let id = notifier.subscribe(move |_| {
            calls_in_listener.set(calls_in_listener.get() + 1);
            if let Some(id) = own_id_in_listener.get() {
                notifier_in_listener.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        notifier.trigger(&1);
        notifier.trigger(&2);

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_clear_removes_all_listeners() {
        let notifier: Notifier<()> = Notifier::default();
        notifier.subscribe(|_| {});
        notifier.subscribe(|_| {});
        notifier.clear();
        assert!(notifier.is_empty());
        assert_eq!(format!("{notifier:?}"), "Notifier { listeners: 0 }");
    }
}
