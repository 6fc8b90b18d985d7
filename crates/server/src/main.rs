// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! `vllmd` — the vLLM instance launcher's control plane binary.

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use vllm_registry::InstanceRegistry;
use vllm_server::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("vllmd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("vllmd {}", env!("CARGO_PKG_VERSION"));
                println!("Control plane for multi-instance vLLM worker processes.");
                println!();
                println!("USAGE:");
                println!("    vllmd");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                println!();
                println!("ENVIRONMENT:");
                println!("    VLLM_LAUNCHER_STATE_DIR     state directory (default ~/.local/state/vllm-launcher)");
                println!("    VLLM_LAUNCHER_BIND_ADDR     listen address (default 0.0.0.0:8000)");
                println!("    VLLM_LAUNCHER_WORKER_BINARY worker executable to spawn (default vllm)");
                println!("    VLLM_LAUNCHER_STOP_GRACE_MS graceful-stop timeout before SIGKILL (default 10000)");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: vllmd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let log_guard = setup_logging(&config)?;

    info!("starting vllm-launcher control plane");

    let registry = Arc::new(
        InstanceRegistry::new(config.log_dir.clone()).with_stop_grace(config.stop_grace),
    );
    let app = vllm_server::router(Arc::clone(&registry));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let serve = axum::serve(listener, app.into_make_service());
    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                error!(error = %e, "server exited with error");
            }
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
        }
    }

    info!("stopping all instances");
    for (id, result) in registry.stop_all_instances().await {
        if let Err(e) = result {
            error!(instance = %id, error = %e, "failed to stop instance during shutdown");
        }
    }

    drop(log_guard);
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let parent = config
        .server_log_path
        .parent()
        .ok_or("server log path has no parent directory")?;
    let file_name = config
        .server_log_path
        .file_name()
        .ok_or("server log path has no file name")?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
