// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Domain error type shared by the registry, supervisor, and log subsystems.
//!
//! Mirrors the `{NotFound, AlreadyExists, BadRequest, RangeNotSatisfiable,
//! Internal}` split the spec calls for; the REST layer maps each variant to
//! its HTTP status rather than guessing from a string.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("instance not found: {0}")]
    NotFound(String),

    #[error("instance already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("unknown GPU device: {0}")]
    UnknownDevice(String),

    #[error("log range not available: start={start} available={available}")]
    LogRangeNotAvailable { start: u64, available: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl LauncherError {
    pub fn unknown_device(requested: &str, available: &[String]) -> Self {
        LauncherError::UnknownDevice(format!(
            "'{requested}' not found. Available UUIDs: {available:?}"
        ))
    }
}
