// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Centralized environment variable access for the server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Resolve the state directory: `VLLM_LAUNCHER_STATE_DIR` >
/// `XDG_STATE_HOME/vllm-launcher` > `~/.local/state/vllm-launcher`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("VLLM_LAUNCHER_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("vllm-launcher"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/vllm-launcher"))
}

/// Address the REST API listens on. Defaults to every interface on port
/// 8000, matching the reference launcher's default bind.
pub fn bind_addr() -> SocketAddr {
    std::env::var("VLLM_LAUNCHER_BIND_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)))
}

/// Graceful-stop grace period override, in milliseconds.
pub fn stop_grace_ms() -> Option<u64> {
    std::env::var("VLLM_LAUNCHER_STOP_GRACE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
}
