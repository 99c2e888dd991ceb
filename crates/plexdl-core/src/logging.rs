//! Diagnostic tracing: a file under the XDG state dir, or stderr as fallback.
//!
//! This is the developer-facing trace. The per-run audit log is
//! [`crate::run_log::RunLog`].

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,plexdl=debug,plexdl_core=debug";
const LOG_FILE: &str = "plexdl.log";

/// Per-event writer: a handle to the trace file, or stderr when the handle
/// cannot be duplicated.
enum TraceSink {
    File(File),
    Stderr,
}

impl io::Write for TraceSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceSink::File(f) => f.write(buf),
            TraceSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceSink::File(f) => f.flush(),
            TraceSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct TraceFile(File);

impl<'a> MakeWriter<'a> for TraceFile {
    type Writer = TraceSink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => TraceSink::File(f),
            Err(_) => TraceSink::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/plexdl/plexdl.log`, parent created.
pub fn trace_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plexdl")?;
    xdg_dirs
        .place_state_file(LOG_FILE)
        .context("failed to create plexdl state directory")
}

/// Install the file subscriber. Errors (unwritable state dir, subscriber
/// already set) are returned so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = trace_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(TraceFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init: {}", e))?;

    tracing::info!("plexdl tracing to {}", path.display());
    Ok(())
}

/// Stderr-only subscriber; never fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
