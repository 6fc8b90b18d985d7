// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Server configuration: where state lives and what address to bind.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set VLLM_LAUNCHER_STATE_DIR or HOME")]
    NoStateDir,
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub server_log_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// How long `stop()` waits for a graceful exit before escalating to
    /// `SIGKILL`. Defaults to [`vllm_supervisor::GRACEFUL_STOP_TIMEOUT`].
    pub stop_grace: Duration,
}

impl Config {
    /// Load configuration from the environment, creating the state and log
    /// directories if they don't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = env::state_dir()?;
        let log_dir = state_dir.join("logs");
        let server_log_path = state_dir.join("server.log");

        std::fs::create_dir_all(&log_dir).map_err(|e| ConfigError::CreateDir {
            path: log_dir.clone(),
            source: e,
        })?;

        let stop_grace = env::stop_grace_ms()
            .map(Duration::from_millis)
            .unwrap_or(vllm_supervisor::GRACEFUL_STOP_TIMEOUT);

        Ok(Config {
            state_dir,
            log_dir,
            server_log_path,
            bind_addr: env::bind_addr(),
            stop_grace,
        })
    }
}
