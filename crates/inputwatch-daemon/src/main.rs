//! InputWatch daemon entry point.
//!
//! Reads raw input events (newline-delimited JSON from a file or stdin),
//! feeds them through the key state tracker and the activity monitor, and
//! writes one JSON notification per line to stdout.  Logs go to stderr.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config (--config or platform default) + CLI overrides
//!  └─ Ctrl+C task            -- clears the shared `running` flag
//!  └─ dispatcher (blocking)  -- MonitorSession + Reporter + ChordWatcher
//!       └─ JsonLinesInputSource reader thread
//! ```
//!
//! Example:
//!
//! ```text
//! inputwatch --input session.jsonl --timeout-ms 1500
//! ```

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inputwatch_daemon::application::chords::ChordWatcher;
use inputwatch_daemon::application::report::Reporter;
use inputwatch_daemon::application::session::{MonitorSession, RunSummary, SystemClock};
use inputwatch_daemon::infrastructure::input_source::json_lines::JsonLinesInputSource;
use inputwatch_daemon::infrastructure::storage::config::{self, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// InputWatch: key state and user activity notifications from raw input.
#[derive(Debug, Parser)]
#[command(
    name = "inputwatch",
    about = "Reports key transitions, chords and ACTIVE/INACTIVE changes from raw input events",
    version
)]
struct Cli {
    /// Path to a TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "INPUTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Newline-delimited JSON input events, or `-` for stdin.
    #[arg(long, default_value = "-", env = "INPUTWATCH_INPUT")]
    input: String,

    /// Inactivity window in milliseconds.  Overrides `monitor.activity_timeout_ms`.
    #[arg(long, env = "INPUTWATCH_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Log level when `RUST_LOG` is unset.  Overrides `monitor.log_level`.
    #[arg(long, env = "INPUTWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Do not report key down / up / repeat events.
    #[arg(long)]
    quiet_keys: bool,

    /// Write a default config file (to `--config` or the platform path) and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// Applies CLI overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.monitor.activity_timeout_ms = timeout_ms;
        }
        if let Some(ref level) = self.log_level {
            config.monitor.log_level = level.clone();
        }
        if self.quiet_keys {
            config.report.key_events = false;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        return init_config(cli.config.as_deref());
    }

    let mut app_config =
        config::load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut app_config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the configured level.  Stdout carries the
    // report stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.monitor.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        "InputWatch starting: input={}, timeout={}ms, chords={}",
        cli.input,
        app_config.monitor.activity_timeout_ms,
        app_config.chords.len()
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, stopping");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Dispatcher ────────────────────────────────────────────────────────────
    //
    // The session is single-threaded (`Rc`-based), so it lives entirely on
    // one blocking thread.
    let input = cli.input.clone();
    let summary = tokio::task::spawn_blocking(move || run_dispatcher(&app_config, &input, &running))
        .await
        .context("dispatcher task panicked")??;

    info!(
        "InputWatch stopped: {} events, {} activity changes",
        summary.events, summary.activity_changes
    );
    Ok(())
}

/// Builds the session, the reporter and the chord watches, then runs until
/// the input is exhausted or `running` clears.
fn run_dispatcher(
    app_config: &AppConfig,
    input: &str,
    running: &AtomicBool,
) -> anyhow::Result<RunSummary> {
    let source = if input == "-" {
        JsonLinesInputSource::stdin()
    } else {
        JsonLinesInputSource::from_path(Path::new(input))?
    };

    let session = MonitorSession::new(&app_config.monitor, Box::new(SystemClock))
        .context("failed to start monitor session")?;

    let sink = Rc::new(RefCell::new(io::stdout()));
    let mut reporter = Reporter::attach(&session, sink, &app_config.report);
    let watcher = ChordWatcher::attach(session.keys(), app_config.chords.clone());
    reporter.forward_chords(&watcher);

    let summary = session
        .run_source(&source, running)
        .context("input source failed")?;

    watcher.detach();
    reporter.detach();
    session.shutdown();
    Ok(summary)
}

/// Writes `AppConfig::default()` to `path` or the platform config path.
fn init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_file_path().context("no config path available")?,
    };
    if path.exists() {
        bail!("refusing to overwrite existing config at {}", path.display());
    }
    config::save_config(&AppConfig::default(), &path)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    println!("wrote default config to {}", path.display());
    Ok(())
}
