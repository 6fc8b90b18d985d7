// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Append-only sink for one instance's captured stdout/stderr.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Appends non-empty, non-whitespace chunks to the instance's log file and
/// mirrors them to the launcher's own stdout for operator visibility.
///
/// Each call opens, writes, and closes the file — matching the low write
/// frequency of a log line and avoiding a held-open fd that would outlive
/// the supervisor's view of the child.
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    pub fn new(path: PathBuf) -> Self {
        LogWriter { path }
    }

    /// Write one captured line. Silently drops empty-or-whitespace-only
    /// input — this keeps the many blank lines framework loggers emit from
    /// polluting byte offsets that clients range-read against.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;

        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{line}");

        Ok(())
    }
}
