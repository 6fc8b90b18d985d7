// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! HTTP `Range: bytes=<start>-<end>` header parsing.

use vllm_core::LauncherError;

/// A parsed byte range: an inclusive start and an optional inclusive end.
/// `None` for the end means "to EOF".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeHeader {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeHeader {
    /// Parse `bytes=<start>-` or `bytes=<start>-<end>`. Rejects any other
    /// unit, suffix ranges (`bytes=-N`), non-integer or negative values, and
    /// inverted ranges (`end < start`).
    pub fn parse(header: &str) -> Result<Self, LauncherError> {
        let spec = header.trim().strip_prefix("bytes=").ok_or_else(|| {
            LauncherError::BadRequest(format!("unsupported Range unit: {header}"))
        })?;

        let (start_str, end_str) = spec
            .split_once('-')
            .ok_or_else(|| LauncherError::BadRequest(format!("malformed Range: {header}")))?;

        if start_str.is_empty() {
            return Err(LauncherError::BadRequest(
                "suffix ranges are not supported".to_string(),
            ));
        }

        let start = parse_nonnegative(start_str)
            .ok_or_else(|| LauncherError::BadRequest(format!("malformed Range: {header}")))?;

        let end = if end_str.is_empty() {
            None
        } else {
            let end = parse_nonnegative(end_str)
                .ok_or_else(|| LauncherError::BadRequest(format!("malformed Range: {header}")))?;
            Some(end)
        };

        if let Some(end) = end {
            if end < start {
                return Err(LauncherError::BadRequest(format!(
                    "inverted Range: {header}"
                )));
            }
        }

        Ok(RangeHeader { start, end })
    }
}

/// Parse a plain non-negative integer, rejecting signs and whitespace that
/// `u64::from_str` would otherwise accept via surrounding context.
fn parse_nonnegative(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok()
}
