//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without a replay file
//! or platform hooks.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use inputwatch_core::RawInputEvent;

use super::{CaptureError, InputSource};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawInputEvent>>>>,
    stop_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            stop_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic event, as if produced by a platform adapter.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: RawInputEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockInputSource::inject_event called before start()");
        }
    }

    /// Injects every event of `script` in order.
    pub fn inject_all(&self, script: impl IntoIterator<Item = RawInputEvent>) {
        for event in script {
            self.inject_event(event);
        }
    }

    /// Returns the number of times [`InputSource::stop`] was called.
    pub fn stop_count(&self) -> u32 {
        *self.stop_count.lock().expect("lock poisoned")
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
        *self.stop_count.lock().expect("lock poisoned") += 1;
    }
}
