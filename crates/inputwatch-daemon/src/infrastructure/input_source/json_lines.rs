//! Newline-delimited JSON input source.
//!
//! Each line holds one [`RawInputEvent`] in its JSON form, optionally with a
//! `delay_ms` field that the reader sleeps before delivering the event:
//!
//! ```text
//! {"type":"keydown","key":"Control"}
//! {"type":"keydown","key":"s","delay_ms":40}
//! {"type":"keyup","key":"s","delay_ms":90}
//! {"type":"mousemove","x":640,"y":380,"delay_ms":1500}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.  Lines that are not
//! valid events are logged and skipped; they never stop the replay.
//!
//! The reader runs on its own thread so a slow or blocking input (a pipe, a
//! terminal) never stalls the dispatcher's timers.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use inputwatch_core::RawInputEvent;
use tracing::{debug, warn};

use super::{CaptureError, InputSource};

/// One parsed replay line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayLine {
    /// Pause before delivering `event`.
    pub delay: Duration,
    pub event: RawInputEvent,
}

/// Parses a single replay line.
///
/// A `delay_ms` that is not a non-negative integer is logged and treated as
/// zero; the event itself is still delivered.
///
/// # Errors
///
/// Returns the `serde_json` error if the line is not a JSON object describing
/// an event.
pub fn parse_replay_line(line: &str) -> Result<ReplayLine, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(line)?;
    let delay_ms = match value
        .as_object_mut()
        .and_then(|fields| fields.remove("delay_ms"))
    {
        None => 0,
        Some(delay) => delay.as_u64().unwrap_or_else(|| {
            warn!("ignoring invalid delay_ms {delay}: expected a non-negative integer");
            0
        }),
    };
    let event = serde_json::from_value(value)?;
    Ok(ReplayLine {
        delay: Duration::from_millis(delay_ms),
        event,
    })
}

type LineReader = Box<dyn BufRead + Send>;

/// Replays newline-delimited JSON events from any buffered reader.
pub struct JsonLinesInputSource {
    reader: Mutex<Option<LineReader>>,
    stopped: Arc<AtomicBool>,
    label: String,
}

impl JsonLinesInputSource {
    /// Wraps `reader`; `label` names the input in logs.
    pub fn new(reader: impl BufRead + Send + 'static, label: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            stopped: Arc::new(AtomicBool::new(false)),
            label: label.into(),
        }
    }

    /// Replays the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Open`] if the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|source| CaptureError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }

    /// Replays standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), "<stdin>")
    }
}

impl InputSource for JsonLinesInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        if self.stopped.load(Ordering::Relaxed) {
            return Err(CaptureError::AlreadyStopped);
        }
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CaptureError::AlreadyStarted)?;

        let (tx, rx) = mpsc::channel();
        let stopped = Arc::clone(&self.stopped);
        let label = self.label.clone();

        thread::Builder::new()
            .name("inputwatch-reader".to_string())
            .spawn(move || pump_lines(reader, &tx, &stopped, &label))
            .map_err(|e| CaptureError::Spawn(e.to_string()))?;

        Ok(rx)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// Reads lines until EOF, a read error, a stop request, or the receiver hanging up.
fn pump_lines(reader: LineReader, tx: &Sender<RawInputEvent>, stopped: &AtomicBool, label: &str) {
    let mut delivered = 0u64;

    for (index, line) in reader.lines().enumerate() {
        if stopped.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("{label}: read failed: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let replay = match parse_replay_line(trimmed) {
            Ok(replay) => replay,
            Err(e) => {
                warn!("{label}:{}: skipping malformed input line: {e}", index + 1);
                continue;
            }
        };

        if !replay.delay.is_zero() {
            thread::sleep(replay.delay);
            if stopped.load(Ordering::Relaxed) {
                break;
            }
        }

        if tx.send(replay.event).is_err() {
            debug!("{label}: dispatcher hung up; stopping reader");
            return;
        }
        delivered += 1;
    }

    debug!("{label}: input exhausted after {delivered} events");
}
