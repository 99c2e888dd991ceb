//! Append-only audit log for one run.
//!
//! One line per event: `timestamp - LEVEL - message`. The file is opened in
//! append mode and never truncated. A `RunLog` is opened once per run and
//! shared with every worker; each line goes out in a single locked write so
//! concurrent workers never interleave within a line.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// Open (or create) the log at `path` for appending. Parent directories are created.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(RunLog {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::INFO, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Level::WARN, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::ERROR, message.as_ref());
    }

    /// Append one line. Write errors are reported through `tracing` and
    /// otherwise ignored: losing an audit line must not fail a download.
    pub fn record(&self, level: Level, message: &str) {
        let message = message.replace(['\r', '\n'], " ");
        let line = format!(
            "{} - {} - {}\n",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            level,
            message
        );

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!(path = %self.path.display(), "could not append to run log: {}", e);
        }
    }

    /// Current contents of the log file (for "review the log" prompts).
    pub fn read_to_string(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}
