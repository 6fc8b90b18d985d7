// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Instance lifecycle state.

use serde::Serialize;

/// Where an instance sits in its lifecycle.
///
/// `NotStarted` → `Running` on a successful spawn. `Running` → `Stopped`
/// when the child exits on its own or is brought down cleanly via
/// `stop()`. `Running` → `Terminated` when `stop()` had to escalate to
/// `SIGKILL` because the child ignored `SIGTERM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    NotStarted,
    Running,
    Stopped,
    Terminated,
}

impl InstanceState {
    pub fn is_running(self) -> bool {
        matches!(self, InstanceState::Running)
    }
}
