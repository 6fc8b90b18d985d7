// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lifecycle management for one vLLM worker process.
//!
//! [`InstanceSupervisor`] owns the child's [`tokio::process::Child`] handle,
//! forwards its stdout/stderr into a [`vllm_logs::LogFile`], and implements
//! the graceful-then-forceful shutdown sequence: `SIGTERM` to the child's
//! process group, a bounded wait, then `SIGKILL` to the group if it's still
//! alive.

mod state;

pub use state::InstanceState;

use std::os::unix::process::CommandExt as _;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use vllm_core::{InstanceId, LauncherError, VllmConfig};
use vllm_gpu::GpuTranslator;
use vllm_logs::LogFile;

/// How long `stop()` waits for a graceful exit before escalating to
/// `SIGKILL`.
pub const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the worker executable to spawn, overridable for test doubles and
/// alternate deployments. Follows the `<NS>_<VAR>` env convention the rest
/// of the launcher uses for its own knobs.
fn worker_binary() -> String {
    std::env::var("VLLM_LAUNCHER_WORKER_BINARY").unwrap_or_else(|_| "vllm".to_string())
}

/// A point-in-time snapshot of one instance, suitable for the status
/// endpoints. `pid` is populated as soon as one has ever been assigned and
/// is never cleared, even after the child exits — callers can always tell
/// which process a stopped instance used to be.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstanceStatus {
    pub instance_id: String,
    pub status: InstanceState,
    pub pid: Option<u32>,
    pub options: String,
    pub gpu_uuids: Vec<String>,
}

struct Inner {
    state: InstanceState,
    child: Option<Child>,
    pid: Option<u32>,
}

/// Owns and drives the lifecycle of a single worker process.
pub struct InstanceSupervisor {
    id: InstanceId,
    config: VllmConfig,
    log_file: LogFile,
    inner: Mutex<Inner>,
}

impl InstanceSupervisor {
    pub fn new(id: InstanceId, config: VllmConfig, log_file: LogFile) -> Self {
        InstanceSupervisor {
            id,
            config,
            log_file,
            inner: Mutex::new(Inner {
                state: InstanceState::NotStarted,
                child: None,
                pid: None,
            }),
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn config(&self) -> &VllmConfig {
        &self.config
    }

    /// Resolve GPU UUIDs to indices, spawn the worker in its own session
    /// (so it heads its own process group), and start the stdout/stderr
    /// forwarding tasks.
    pub async fn start(&self, gpu: &GpuTranslator) -> Result<(), LauncherError> {
        let mut guard = self.inner.lock().await;
        self.reap(&mut guard).await;
        if guard.state == InstanceState::Running {
            return Ok(());
        }
        if guard.state != InstanceState::NotStarted {
            return Err(LauncherError::Internal(format!(
                "instance {} already started",
                self.id
            )));
        }

        let mut cmd = Command::new(worker_binary());
        cmd.args(self.config.option_tokens());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        if let Some(env_vars) = &self.config.env_vars {
            for (key, value) in env_vars {
                cmd.env(key, value);
            }
        }
        // Applied after the caller's own env_vars so the resolved mask always
        // wins if a caller also happened to set CUDA_VISIBLE_DEVICES directly.
        if let Some(gpu_uuids) = &self.config.gpu_uuids {
            let visible = gpu.resolve_visible_devices(gpu_uuids)?;
            cmd.env("CUDA_VISIBLE_DEVICES", visible);
        }

        // New session so the child becomes its own process group leader;
        // stop() signals that group rather than just the one pid, which
        // also reaps any subprocesses the worker itself forks.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| LauncherError::Internal(format!("failed to spawn worker: {e}")))?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        guard.child = Some(child);
        guard.pid = pid;
        guard.state = InstanceState::Running;
        drop(guard);

        if let Some(stdout) = stdout {
            self.spawn_forwarder(stdout);
        }
        if let Some(stderr) = stderr {
            self.spawn_forwarder(stderr);
        }

        Ok(())
    }

    /// Forward a child output stream into the log file line by line,
    /// splitting on raw bytes rather than `AsyncBufReadExt::lines()`. The
    /// worker's stdout/stderr is an arbitrary byte stream, not guaranteed
    /// UTF-8 at every write boundary; decoding lossily per line (instead of
    /// erroring the whole stream on one bad byte) keeps capturing output for
    /// the rest of the child's life.
    fn spawn_forwarder<R>(&self, mut reader: R)
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let writer = self.log_file.writer();
        tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            let mut pending = Vec::new();
            loop {
                let n = match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(error = %e, "error reading instance output stream");
                        break;
                    }
                };
                pending.extend_from_slice(&chunk[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line_bytes = pending.drain(..=pos).collect::<Vec<u8>>();
                    let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]);
                    if let Err(e) = writer.write_line(&line) {
                        tracing::warn!(error = %e, "failed to write instance log line");
                    }
                }
            }
            if !pending.is_empty() {
                let line = String::from_utf8_lossy(&pending);
                if let Err(e) = writer.write_line(&line) {
                    tracing::warn!(error = %e, "failed to write instance log line");
                }
            }
        });
    }

    /// Is the child process still alive?
    pub async fn is_running(&self) -> bool {
        let mut guard = self.inner.lock().await;
        self.reap(&mut guard).await;
        guard.state.is_running()
    }

    /// Non-blocking check for the child having exited on its own, updating
    /// state to `Stopped` if so.
    async fn reap(&self, guard: &mut Inner) {
        if guard.state != InstanceState::Running {
            return;
        }
        if let Some(child) = guard.child.as_mut() {
            match child.try_wait() {
                Ok(Some(_status)) => {
                    guard.state = InstanceState::Stopped;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(instance = %self.id, error = %e, "failed to poll worker status");
                }
            }
        }
    }

    /// Bring the worker down: `SIGTERM` to its process group, wait up to
    /// `grace`, then `SIGKILL` the group if it's still alive.
    pub async fn stop(&self, grace: Duration) -> Result<(), LauncherError> {
        let mut guard = self.inner.lock().await;
        self.reap(&mut guard).await;

        let Some(pid) = guard.pid else {
            guard.state = InstanceState::Terminated;
            return Ok(());
        };
        if !guard.state.is_running() {
            guard.state = InstanceState::Terminated;
            return Ok(());
        }

        send_signal(pid, libc::SIGTERM);

        let exited_gracefully = match guard.child.as_mut() {
            Some(child) => matches!(timeout(grace, child.wait()).await, Ok(Ok(_))),
            None => false,
        };

        if exited_gracefully {
            guard.state = InstanceState::Stopped;
        } else {
            send_signal(pid, libc::SIGKILL);
            if let Some(child) = guard.child.as_mut() {
                let _ = child.wait().await;
            }
            guard.state = InstanceState::Terminated;
        }

        Ok(())
    }

    pub async fn status(&self) -> InstanceStatus {
        let mut guard = self.inner.lock().await;
        self.reap(&mut guard).await;
        InstanceStatus {
            instance_id: self.id.to_string(),
            status: guard.state,
            pid: guard.pid,
            options: self.config.options.clone(),
            gpu_uuids: self.config.gpu_uuids.clone().unwrap_or_default(),
        }
    }

    pub fn get_log_bytes(
        &self,
        start: u64,
        end: Option<u64>,
    ) -> Result<(Vec<u8>, u64), LauncherError> {
        self.log_file.get_log_bytes(start, end)
    }

    pub fn cleanup_log(&self) {
        self.log_file.cleanup();
    }
}

/// Signal the child's whole process group. `setsid()` at spawn time made
/// the child its own group leader, so its pid doubles as the pgid.
fn send_signal(pid: u32, signal: libc::c_int) {
    let result = unsafe { libc::killpg(pid as libc::pid_t, signal) };
    if result != 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::NotFound && err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pid, signal, error = %err, "failed to signal worker process group");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(options: &str) -> VllmConfig {
        serde_json::from_value(serde_json::json!({ "options": options })).unwrap()
    }

    #[tokio::test]
    async fn not_started_instance_reports_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path(), "inst-1");
        let sup = InstanceSupervisor::new(InstanceId::new("inst-1"), config("--help"), log);
        assert!(!sup.is_running().await);
    }

    #[tokio::test]
    async fn start_and_stop_a_short_lived_process() {
        std::env::set_var("VLLM_LAUNCHER_WORKER_BINARY", "true");
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path(), "inst-2");
        let sup = InstanceSupervisor::new(InstanceId::new("inst-2"), config(""), log);
        let gpu = GpuTranslator::new();

        sup.start(&gpu).await.unwrap();
        sup.stop(Duration::from_secs(1)).await.unwrap();

        let status = sup.status().await;
        assert!(matches!(
            status.status,
            InstanceState::Stopped | InstanceState::Terminated
        ));
        std::env::remove_var("VLLM_LAUNCHER_WORKER_BINARY");
    }

    #[tokio::test]
    async fn starting_an_already_running_instance_is_a_no_op() {
        std::env::set_var("VLLM_LAUNCHER_WORKER_BINARY", "sleep");
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path(), "inst-4");
        let sup = InstanceSupervisor::new(InstanceId::new("inst-4"), config("5"), log);
        let gpu = GpuTranslator::new();

        sup.start(&gpu).await.unwrap();
        let pid_first = sup.status().await.pid;
        sup.start(&gpu).await.unwrap();
        let pid_second = sup.status().await.pid;
        assert_eq!(pid_first, pid_second);

        sup.stop(Duration::from_secs(1)).await.unwrap();
        std::env::remove_var("VLLM_LAUNCHER_WORKER_BINARY");
    }

    #[tokio::test]
    async fn stopping_a_never_started_instance_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path(), "inst-3");
        let sup = InstanceSupervisor::new(InstanceId::new("inst-3"), config("--help"), log);
        sup.stop(Duration::from_secs(1)).await.unwrap();
        assert!(!sup.is_running().await);
        assert_eq!(sup.status().await.status, InstanceState::Terminated);
    }
}
