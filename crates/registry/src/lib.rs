// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Concurrent registry of running vLLM instances.
//!
//! One [`InstanceRegistry`] per process owns every live
//! [`InstanceSupervisor`], keyed by [`InstanceId`]. The map itself is a
//! `parking_lot::Mutex<HashMap<_, _>>` — short critical sections just to
//! clone an `Arc` out, never held across an `.await`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use vllm_core::{IdGen, InstanceId, LauncherError, RandomHexIdGen, VllmConfig};
use vllm_gpu::GpuTranslator;
use vllm_logs::LogFile;
use vllm_supervisor::{InstanceStatus, InstanceSupervisor, GRACEFUL_STOP_TIMEOUT};

pub struct InstanceRegistry {
    log_dir: PathBuf,
    gpu: GpuTranslator,
    id_gen: Box<dyn IdGen>,
    stop_grace: Duration,
    instances: Mutex<HashMap<InstanceId, Arc<InstanceSupervisor>>>,
}

impl InstanceRegistry {
    pub fn new(log_dir: PathBuf) -> Self {
        Self::with_id_gen(log_dir, Box::new(RandomHexIdGen))
    }

    pub fn with_id_gen(log_dir: PathBuf, id_gen: Box<dyn IdGen>) -> Self {
        InstanceRegistry {
            log_dir,
            gpu: GpuTranslator::new(),
            id_gen,
            stop_grace: GRACEFUL_STOP_TIMEOUT,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Override the grace period `stop()` waits before escalating to
    /// `SIGKILL`. Defaults to [`GRACEFUL_STOP_TIMEOUT`].
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Create, register, and start a new instance. `requested_id` lets a
    /// caller pin a specific id (the v2 PUT-style create); `None` generates
    /// one (the POST-style create).
    ///
    /// A duplicate id is rejected before the process is ever spawned. A
    /// spawn failure unregisters the instance rather than leaving a dead
    /// entry behind.
    pub async fn create_instance(
        &self,
        requested_id: Option<InstanceId>,
        config: VllmConfig,
    ) -> Result<InstanceStatus, LauncherError> {
        config.validate()?;

        let id = requested_id.unwrap_or_else(|| self.id_gen.next());

        let supervisor = {
            let mut guard = self.instances.lock();
            if guard.contains_key(&id) {
                return Err(LauncherError::AlreadyExists(id.to_string()));
            }
            let log_file = LogFile::new(&self.log_dir, id.as_str());
            let supervisor = Arc::new(InstanceSupervisor::new(id.clone(), config, log_file));
            guard.insert(id.clone(), supervisor.clone());
            supervisor
        };

        if let Err(e) = supervisor.start(&self.gpu).await {
            self.instances.lock().remove(&id);
            supervisor.cleanup_log();
            return Err(e);
        }

        Ok(supervisor.status().await)
    }

    /// Stop an instance and deregister it. A missing id is `NotFound`, not
    /// a silent no-op.
    pub async fn stop_instance(&self, id: &InstanceId) -> Result<InstanceStatus, LauncherError> {
        let supervisor = {
            let mut guard = self.instances.lock();
            guard
                .remove(id)
                .ok_or_else(|| LauncherError::NotFound(id.to_string()))?
        };
        supervisor.stop(self.stop_grace).await?;
        let status = supervisor.status().await;
        supervisor.cleanup_log();
        Ok(status)
    }

    /// Stop and deregister every instance. Best-effort: one failure doesn't
    /// stop the sweep over the rest.
    pub async fn stop_all_instances(&self) -> Vec<(InstanceId, Result<InstanceStatus, LauncherError>)> {
        let ids: Vec<InstanceId> = self.instances.lock().keys().cloned().collect();
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let result = self.stop_instance(&id).await;
            results.push((id, result));
        }
        results
    }

    pub async fn get_instance_status(
        &self,
        id: &InstanceId,
    ) -> Result<InstanceStatus, LauncherError> {
        Ok(self.get(id)?.status().await)
    }

    pub async fn list_instances(&self) -> Vec<InstanceStatus> {
        let supervisors: Vec<_> = self.instances.lock().values().cloned().collect();
        let mut statuses = Vec::with_capacity(supervisors.len());
        for supervisor in supervisors {
            statuses.push(supervisor.status().await);
        }
        statuses
    }

    pub fn get_log_bytes(
        &self,
        id: &InstanceId,
        start: u64,
        end: Option<u64>,
    ) -> Result<(Vec<u8>, u64), LauncherError> {
        self.get(id)?.get_log_bytes(start, end)
    }

    fn get(&self, id: &InstanceId) -> Result<Arc<InstanceSupervisor>, LauncherError> {
        self.instances
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| LauncherError::NotFound(id.to_string()))
    }
}
