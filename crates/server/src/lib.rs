// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! REST surface for the vLLM instance launcher.

pub mod config;
mod env;
mod error;
mod routes;

pub use config::Config;
pub use routes::router;
