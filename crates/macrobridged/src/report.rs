//! Bounded, timestamped report log shared by every command handler.
//!
//! The log keeps the most recent lines in memory for `get_report` and mirrors
//! each line to a file when one is configured. Mirror failures are logged and
//! swallowed; they never fail the command that produced the line.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

const REPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::report");

/// Severity recorded alongside each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Error,
}

impl Level {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

/// In-memory report buffer with an optional file mirror.
#[derive(Debug)]
pub struct ReportLog {
    lines: Mutex<VecDeque<String>>,
    max_lines: usize,
    mirror: Option<Utf8PathBuf>,
}

impl ReportLog {
    /// Creates a log holding at most `max_lines` lines, mirrored to `mirror`.
    #[must_use]
    pub fn new(max_lines: usize, mirror: Option<Utf8PathBuf>) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(max_lines.min(1024))),
            max_lines: max_lines.max(1),
            mirror,
        }
    }

    /// Creates a log with no file mirror.
    #[must_use]
    pub fn in_memory(max_lines: usize) -> Self {
        Self::new(max_lines, None)
    }

    /// Path of the file mirror, if any.
    #[must_use]
    pub fn mirror_path(&self) -> Option<&Utf8Path> {
        self.mirror.as_deref()
    }

    /// Appends an informational line.
    pub fn append(&self, message: impl AsRef<str>) {
        self.push(Level::Info, message.as_ref());
    }

    /// Appends an error line.
    pub fn append_error(&self, message: impl AsRef<str>) {
        self.push(Level::Error, message.as_ref());
    }

    /// Returns the retained lines, oldest first, joined by newlines.
    #[must_use]
    pub fn read_all(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Drops every retained line. The file mirror is left untouched.
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no lines are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, level: Level, message: &str) {
        let stamp = timestamp();
        let formatted: Vec<String> = message
            .lines()
            .map(|line| format!("{stamp} {} {line}", level.as_str()))
            .collect();
        if formatted.is_empty() {
            return;
        }

        {
            let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            for line in &formatted {
                if lines.len() == self.max_lines {
                    lines.pop_front();
                }
                lines.push_back(line.clone());
            }
        }

        if let Some(path) = self.mirror.as_deref() {
            mirror_lines(path, &formatted);
        }
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("-"))
}

fn mirror_lines(path: &Utf8Path, lines: &[String]) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| {
            for line in lines {
                writeln!(file, "{line}")?;
            }
            Ok(())
        });
    if let Err(error) = result {
        warn!(
            target: REPORT_TARGET,
            path = %path,
            error = %error,
            "failed to mirror report line"
        );
    }
}
