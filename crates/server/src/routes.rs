// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! The `/v2/vllm` REST surface.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use vllm_core::{InstanceId, LauncherError, VllmConfig};
use vllm_registry::InstanceRegistry;
use vllm_supervisor::InstanceStatus;

use crate::error::ApiError;

pub fn router(registry: Arc<InstanceRegistry>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/v2/vllm/instances", post(create_instance))
        .route("/v2/vllm/instances", get(list_instances))
        .route("/v2/vllm/instances", delete(stop_all_instances))
        .route("/v2/vllm/instances/:id", put(create_instance_with_id))
        .route("/v2/vllm/instances/:id", delete(stop_instance))
        .route("/v2/vllm/instances/:id", get(get_instance_status))
        .route("/v2/vllm/instances/:id/log", get(get_instance_log))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "vllm-launcher",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

#[derive(Serialize)]
struct StartResponse {
    status: &'static str,
    instance_id: String,
    pid: Option<u32>,
}

impl From<InstanceStatus> for StartResponse {
    fn from(s: InstanceStatus) -> Self {
        StartResponse {
            status: "started",
            instance_id: s.instance_id,
            pid: s.pid,
        }
    }
}

async fn create_instance(
    State(registry): State<Arc<InstanceRegistry>>,
    Json(config): Json<VllmConfig>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let status = registry.create_instance(None, config).await?;
    Ok((StatusCode::CREATED, Json(status.into())))
}

async fn create_instance_with_id(
    State(registry): State<Arc<InstanceRegistry>>,
    Path(id): Path<String>,
    Json(config): Json<VllmConfig>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let status = registry
        .create_instance(Some(InstanceId::new(id)), config)
        .await?;
    Ok((StatusCode::CREATED, Json(status.into())))
}

#[derive(Serialize)]
struct StopResponse {
    status: &'static str,
    instance_id: String,
    pid: Option<u32>,
}

async fn stop_instance(
    State(registry): State<Arc<InstanceRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let status = registry.stop_instance(&InstanceId::new(id)).await?;
    Ok(Json(StopResponse {
        status: "terminated",
        instance_id: status.instance_id,
        pid: status.pid,
    }))
}

#[derive(Serialize)]
struct StopAllResponse {
    status: &'static str,
    stopped_instances: Vec<String>,
    total_stopped: usize,
}

async fn stop_all_instances(
    State(registry): State<Arc<InstanceRegistry>>,
) -> Json<StopAllResponse> {
    let results = registry.stop_all_instances().await;
    let stopped_instances: Vec<String> = results
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(id, _)| id.to_string())
        .collect();
    for (id, result) in &results {
        if let Err(e) = result {
            tracing::warn!(instance = %id, error = %e, "failed to stop instance during stop-all");
        }
    }
    Json(StopAllResponse {
        status: "all_stopped",
        total_stopped: stopped_instances.len(),
        stopped_instances,
    })
}

async fn get_instance_status(
    State(registry): State<Arc<InstanceRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<InstanceStatus>, ApiError> {
    let status = registry.get_instance_status(&InstanceId::new(id)).await?;
    Ok(Json(status))
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    detail: bool,
}

#[derive(Serialize)]
struct DetailedList {
    total_instances: usize,
    running_instances: usize,
    instances: Vec<InstanceStatus>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ListResponse {
    Ids(Vec<String>),
    Detailed(DetailedList),
}

async fn list_instances(
    State(registry): State<Arc<InstanceRegistry>>,
    Query(params): Query<ListParams>,
) -> Json<ListResponse> {
    let statuses = registry.list_instances().await;
    if params.detail {
        let running_instances = statuses.iter().filter(|s| s.status.is_running()).count();
        Json(ListResponse::Detailed(DetailedList {
            total_instances: statuses.len(),
            running_instances,
            instances: statuses,
        }))
    } else {
        let ids: Vec<String> = statuses.into_iter().map(|s| s.instance_id).collect();
        Json(ListResponse::Ids(ids))
    }
}

async fn get_instance_log(
    State(registry): State<Arc<InstanceRegistry>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let parsed = match &range_header {
        Some(h) => Some(vllm_logs::RangeHeader::parse(h).map_err(ApiError::from)?),
        None => None,
    };
    let (start, end) = match parsed {
        Some(r) => (r.start, r.end),
        None => (0, None),
    };

    let (bytes, total) = match registry.get_log_bytes(&InstanceId::new(id), start, end) {
        Ok(v) => v,
        Err(LauncherError::LogRangeNotAvailable { available, .. }) => {
            let mut response = StatusCode::RANGE_NOT_SATISFIABLE.into_response();
            if let Ok(value) = header::HeaderValue::from_str(&format!("bytes */{available}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
            return Ok(response);
        }
        Err(e) => return Err(e.into()),
    };

    let status = if range_header.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let last = if bytes.is_empty() {
        start
    } else {
        start + bytes.len() as u64 - 1
    };

    let mut response = (status, bytes).into_response();
    let headers_mut = response.headers_mut();
    headers_mut.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/octet-stream"),
    );

    if range_header.is_some() {
        let content_range = format!("bytes {start}-{last}/{total}");
        if let Ok(value) = header::HeaderValue::from_str(&content_range) {
            headers_mut.insert(header::CONTENT_RANGE, value);
        }
    }

    Ok(response)
}
