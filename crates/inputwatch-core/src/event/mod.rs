//! Synchronous publish/subscribe primitive shared by every service.
//!
//! See [`notifier::Notifier`] for the main type.

pub mod notifier;
