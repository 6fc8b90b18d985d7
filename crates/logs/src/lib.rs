// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Per-instance log capture and ranged retrieval.
//!
//! The child's stdout/stderr are forwarded line-by-line into one append-only
//! file per instance. Readers pull byte windows out of that file following
//! HTTP Range semantics, capped at [`MAX_LOG_RESPONSE_BYTES`].

mod range;
mod writer;

pub use range::RangeHeader;
pub use writer::LogWriter;

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use vllm_core::LauncherError;

/// Upper bound on a single ranged-log response, regardless of what the
/// caller asked for.
pub const MAX_LOG_RESPONSE_BYTES: u64 = 1024 * 1024;

/// The per-instance append-only sink at `<log_dir>/<instance_id>.log`.
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(log_dir: &Path, instance_id: &str) -> Self {
        LogFile {
            path: log_dir.join(format!("{instance_id}.log")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A writer that appends non-empty, non-whitespace chunks to this file
    /// and mirrors them to the launcher's own stdout.
    pub fn writer(&self) -> LogWriter {
        LogWriter::new(self.path.clone())
    }

    /// Read the byte window `[start, end]` (end inclusive, `None` means "to
    /// EOF"), capped at [`MAX_LOG_RESPONSE_BYTES`]. Returns the bytes plus
    /// the file's total length at read time.
    pub fn get_log_bytes(
        &self,
        start: u64,
        end: Option<u64>,
    ) -> Result<(Vec<u8>, u64), LauncherError> {
        let metadata = fs::metadata(&self.path);

        let total_length = match &metadata {
            Ok(m) => m.len(),
            Err(_) => 0,
        };

        if start == 0 && (metadata.is_err() || total_length == 0) {
            return Ok((Vec::new(), total_length));
        }

        if start > total_length {
            return Err(LauncherError::LogRangeNotAvailable {
                start,
                available: total_length,
            });
        }

        let last = end.unwrap_or(total_length.saturating_sub(1)).min(
            total_length.saturating_sub(1),
        );
        if last < start {
            return Ok((Vec::new(), total_length));
        }

        let want = last - start + 1;
        let capped = want.min(MAX_LOG_RESPONSE_BYTES);

        let mut file = fs::File::open(&self.path).map_err(|e| {
            LauncherError::Internal(format!("failed to open log file: {e}"))
        })?;
        file.seek(SeekFrom::Start(start))
            .map_err(|e| LauncherError::Internal(format!("failed to seek log file: {e}")))?;

        let mut buf = vec![0u8; capped as usize];
        let mut read_total = 0usize;
        while read_total < buf.len() {
            let n = file
                .read(&mut buf[read_total..])
                .map_err(|e| LauncherError::Internal(format!("failed to read log file: {e}")))?;
            if n == 0 {
                break;
            }
            read_total += n;
        }
        buf.truncate(read_total);

        Ok((buf, total_length))
    }

    /// Remove the log file. A missing file is not an error.
    pub fn cleanup(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove log file");
            }
        }
    }
}
