// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Inbound configuration for one instance.

use std::collections::HashMap;

use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

/// Configuration for one vLLM instance, as received from a client.
///
/// `env_vars` accepts any JSON scalar as a value (string, number, bool) and
/// stringifies it on the way in, mirroring the Python launcher's
/// `str(value)` coercion so callers can pass `{"PORT": 8000}` as readily as
/// `{"PORT": "8000"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VllmConfig {
    pub options: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_uuids: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_env_vars"
    )]
    pub env_vars: Option<HashMap<String, String>>,
}

impl VllmConfig {
    /// Validate the shape the spec requires of inbound configuration:
    /// `options` must be present and non-blank. GPU UUID resolution is the
    /// supervisor's job, not the parser's.
    pub fn validate(&self) -> Result<(), LauncherError> {
        if self.options.trim().is_empty() {
            return Err(LauncherError::BadRequest(
                "options must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }

    /// Tokenize `options` by whitespace, the way the worker's argv is built.
    pub fn option_tokens(&self) -> Vec<String> {
        self.options.split_whitespace().map(str::to_string).collect()
    }
}

fn deserialize_env_vars<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };

    let mut out = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let as_str = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => {
                if b {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
            other => {
                return Err(DeError::custom(format!(
                    "env_vars[{key}] must be a string, number, or bool, got {other}"
                )))
            }
        };
        out.insert(key, as_str);
    }
    Ok(Some(out))
}
