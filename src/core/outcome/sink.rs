//! Outcome sinks
//!
//! An [`OutcomeSink`] is an append-only destination for outcome lines. Files are
//! the production sinks; [`MemorySink`] keeps lines in memory so tests can
//! inspect what a run reported.

use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Append-only line destination
pub trait OutcomeSink: Send {
    /// Appends one line (without trailing newline)
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flushes buffered lines, if any
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Human-readable destination, used in diagnostics
    fn describe(&self) -> String;
}

/// Sink appending to a file, creating it when missing
pub struct FileSink {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl FileSink {
    /// Opens `path` for appending
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SyncError::Io(format!(
                    "Failed to open outcome log {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            path,
            writer: LineWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutcomeSink for FileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Sink collecting lines in shared memory
///
/// Clones share the same line buffer, so a test can keep one handle and give
/// the other to a reporter.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl OutcomeSink for MemorySink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.guard().push(line.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
