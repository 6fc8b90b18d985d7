// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! GPU UUID ⇄ ordinal index translation.
//!
//! Device UUIDs are stable across reboots and driver reorderings; the
//! worker's `CUDA_VISIBLE_DEVICES` mask wants ordinal indices. [`GpuTranslator`]
//! bridges the two, enumerating local devices through NVML exactly once per
//! process.

use std::collections::HashMap;
use std::sync::OnceLock;

use nvml_wrapper::Nvml;
use vllm_core::LauncherError;

/// Bidirectional UUID/index mapping, built once and shared by every
/// [`GpuTranslator`] handle in the process.
struct GpuMapping {
    uuid_to_index: HashMap<String, u32>,
    index_to_uuid: HashMap<u32, String>,
}

impl GpuMapping {
    /// Enumerate local devices. A driver init failure yields an empty
    /// mapping rather than a panic — subsequent lookups fail with
    /// `UnknownDevice` instead of the process refusing to start.
    fn enumerate() -> Self {
        let uuid_to_index = Nvml::init()
            .and_then(|nvml| {
                let count = nvml.device_count()?;
                let mut map = HashMap::with_capacity(count as usize);
                for index in 0..count {
                    let device = nvml.device_by_index(index)?;
                    let uuid = device.uuid()?;
                    map.insert(uuid, index);
                }
                Ok(map)
            })
            .unwrap_or_else(|err| {
                tracing::error!(error = %err, "NVML initialization failed; GPU lookups will fail");
                HashMap::new()
            });

        let index_to_uuid = uuid_to_index.iter().map(|(u, i)| (*i, u.clone())).collect();

        GpuMapping {
            uuid_to_index,
            index_to_uuid,
        }
    }
}

fn mapping() -> &'static GpuMapping {
    static MAPPING: OnceLock<GpuMapping> = OnceLock::new();
    MAPPING.get_or_init(GpuMapping::enumerate)
}

/// Translates between GPU UUIDs and the ordinal indices the driver assigns.
#[derive(Clone, Default)]
pub struct GpuTranslator;

impl GpuTranslator {
    /// Triggers device enumeration on first call; subsequent construction
    /// reuses the process-wide mapping.
    pub fn new() -> Self {
        mapping();
        GpuTranslator
    }

    pub fn uuid_to_index(&self, uuid: &str) -> Result<u32, LauncherError> {
        mapping()
            .uuid_to_index
            .get(uuid)
            .copied()
            .ok_or_else(|| {
                let available: Vec<String> = mapping().uuid_to_index.keys().cloned().collect();
                LauncherError::unknown_device(uuid, &available)
            })
    }

    pub fn index_to_uuid(&self, index: u32) -> Result<String, LauncherError> {
        mapping().index_to_uuid.get(&index).cloned().ok_or_else(|| {
            let available: Vec<String> = mapping()
                .index_to_uuid
                .keys()
                .map(|i| i.to_string())
                .collect();
            LauncherError::unknown_device(&index.to_string(), &available)
        })
    }

    /// The whole forward UUID → index mapping.
    pub fn uuid_index_map(&self) -> HashMap<String, u32> {
        mapping().uuid_to_index.clone()
    }

    /// Resolve `gpu_uuids` into the comma-joined index list the worker's
    /// `CUDA_VISIBLE_DEVICES` expects.
    pub fn resolve_visible_devices(&self, gpu_uuids: &[String]) -> Result<String, LauncherError> {
        let indices = gpu_uuids
            .iter()
            .map(|uuid| self.uuid_to_index(uuid))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(indices
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(","))
    }
}
