//! InputHub: the in-process registry of raw input listeners.
//!
//! The hub plays the role a windowing system's `addEventListener` plays in a
//! browser: platform adapters [`publish`](InputHub::publish) every raw event,
//! and services attach exactly one listener each.
//!
//! Attaching goes through [`InputHub::attach`], which enforces the
//! one-listener-per-service rule via a shared "attached" flag owned by the
//! service and hands back an [`Attachment`].  Calling
//! [`Attachment::detach`] removes the listener again and allows a later
//! restart.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::event::notifier::{ListenerId, Notifier};
use crate::input::raw::RawInputEvent;

/// Error type for attaching a service to the hub.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    /// The service already has a live listener on a hub.
    #[error("{service} is already attached to an input hub")]
    AlreadyAttached { service: &'static str },
}

/// A raw event together with the instant the platform observed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedInput {
    pub event: RawInputEvent,
    pub at: Instant,
}

/// Registry of raw input listeners.
#[derive(Debug, Default)]
pub struct InputHub {
    listeners: Notifier<StampedInput>,
}

impl InputHub {
    /// Creates an empty hub.  Services hold a weak reference to it, so it is
    /// usually created behind an `Rc`.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Delivers `event` to every attached listener, stamped with `at`.
    pub fn publish(&self, event: RawInputEvent, at: Instant) {
        self.listeners.trigger(&StampedInput { event, at });
    }

    /// Registers a raw listener outside the attach protocol (diagnostics, taps).
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StampedInput) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }

    /// Attaches a service listener, guarded by the service's `attached` flag.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::AlreadyAttached`] if `attached` is already set;
    /// no listener is registered in that case.
    pub fn attach<F>(
        self: &Rc<Self>,
        service: &'static str,
        attached: &Rc<Cell<bool>>,
        listener: F,
    ) -> Result<Attachment, AttachError>
    where
        F: Fn(&StampedInput) + 'static,
    {
        if attached.get() {
            return Err(AttachError::AlreadyAttached { service });
        }

        let listener = self.listeners.subscribe(listener);
        attached.set(true);
        debug!(service, "attached to input hub");

        Ok(Attachment {
            hub: Rc::downgrade(self),
            listener,
            attached: Rc::clone(attached),
            service,
        })
    }
}

/// Handle for a service listener registered on an [`InputHub`].
///
/// Dropping an attachment detaches the service, exactly like
/// [`detach`](Self::detach), so the service can be started again afterwards.
#[derive(Debug)]
#[must_use = "dropping an attachment detaches the service immediately"]
pub struct Attachment {
    hub: Weak<InputHub>,
    listener: ListenerId,
    attached: Rc<Cell<bool>>,
    service: &'static str,
}

impl Attachment {
    /// Name of the attached service, for logging.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Removes the listener from the hub and clears the service's attached flag.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.listener);
        }
        self.attached.set(false);
        debug!(service = self.service, "detached from input hub");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_publish_delivers_stamped_event() {
        // Arrange
        let hub = InputHub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_listener = Rc::clone(&seen);
        hub.subscribe(move |input| seen_in_listener.borrow_mut().push(input.clone()));
        let at = Instant::now();

        // Act
        hub.publish(RawInputEvent::key_down("a"), at);

        // Assert
        assert_eq!(
            *seen.borrow(),
            vec![StampedInput {
                event: RawInputEvent::key_down("a"),
                at
            }]
        );
    }

    #[test]
    fn test_attach_twice_is_rejected() {
        let hub = InputHub::new();
        let flag = Rc::new(Cell::new(false));

        let first = hub.attach("svc", &flag, |_| {}).expect("first attach");
        let second = hub.attach("svc", &flag, |_| {});

        assert_eq!(
            second.unwrap_err(),
            AttachError::AlreadyAttached { service: "svc" }
        );
        assert_eq!(hub.listener_count(), 1);
        assert_eq!(first.service(), "svc");
    }

    #[test]
    fn test_detach_removes_listener_and_allows_reattach() {
        // Arrange
        let hub = InputHub::new();
        let flag = Rc::new(Cell::new(false));
        let calls = Rc::new(Cell::new(0u32));
        let calls_in_listener = Rc::clone(&calls);
        let attachment = hub
            .attach("svc", &flag, move |_| calls_in_listener.set(calls_in_listener.get() + 1))
            .expect("attach");

        // Act
        attachment.detach();
        hub.publish(RawInputEvent::MouseMove { x: 0, y: 0 }, Instant::now());

        // Assert
        assert_eq!(calls.get(), 0);
        assert!(!flag.get());
        assert!(hub.attach("svc", &flag, |_| {}).is_ok());
    }

    #[test]
    fn test_dropping_attachment_detaches_and_allows_restart() {
        // Arrange
        let hub = InputHub::new();
        let flag = Rc::new(Cell::new(false));
        let attachment = hub.attach("svc", &flag, |_| {}).expect("attach");

        // Act
        drop(attachment);

        // Assert
        assert!(!flag.get());
        assert_eq!(hub.listener_count(), 0);
        let again = hub.attach("svc", &flag, |_| {}).expect("re-attach after drop");
        assert_eq!(again.service(), "svc");
    }

    #[test]
    fn test_detach_after_hub_dropped_still_clears_flag() {
        let hub = InputHub::new();
        let flag = Rc::new(Cell::new(false));
        let attachment = hub.attach("svc", &flag, |_| {}).expect("attach");

        drop(hub);
        attachment.detach();

        assert!(!flag.get());
    }
}
