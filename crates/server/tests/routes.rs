// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! HTTP-level integration tests for the `/v2/vllm` REST surface.
//!
//! Exercises the router end to end with `tower::ServiceExt::oneshot`
//! instead of a bound socket, so every scenario in the spec's end-to-end
//! list runs without a real network hop. The worker binary is swapped for
//! `true`/`sleep` via `VLLM_LAUNCHER_WORKER_BINARY` so no actual inference
//! server needs to be present.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vllm_registry::InstanceRegistry;

fn app(log_dir: &std::path::Path) -> axum::Router {
    std::env::set_var("VLLM_LAUNCHER_WORKER_BINARY", "true");
    let registry = Arc::new(InstanceRegistry::new(log_dir.to_path_buf()));
    vllm_server::router(registry)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "OK" }));
}

#[tokio::test]
async fn auto_id_creation_then_status_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let create = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v2/vllm/instances")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "options": "--model m --port 8000" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);
    let created = body_json(create).await;
    let id = created["instance_id"].as_str().unwrap().to_string();
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(created["status"], "started");

    let status = router
        .oneshot(
            Request::builder()
                .uri(format!("/v2/vllm/instances/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::OK);
    let status = body_json(status).await;
    assert_eq!(status["instance_id"], id);
}

#[tokio::test]
async fn duplicate_put_id_is_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let body = || Body::from(json!({ "options": "--model m --port 8001" }).to_string());

    let first = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/v2/vllm/instances/x")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/v2/vllm/instances/x")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_instance_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/v2/vllm/instances/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_then_second_stop_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let create = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v2/vllm/instances")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "options": "--model m" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = body_json(create).await["instance_id"].as_str().unwrap().to_string();

    let stop = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v2/vllm/instances/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stop.status(), StatusCode::OK);
    assert_eq!(body_json(stop).await["status"], "terminated");

    let second_stop = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v2/vllm/instances/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second_stop.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_all_sweeps_every_instance() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    for _ in 0..3 {
        let create = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v2/vllm/instances")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "options": "--model m" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create.status(), StatusCode::CREATED);
    }

    let stop_all = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v2/vllm/instances")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stop_all.status(), StatusCode::OK);
    assert_eq!(body_json(stop_all).await["total_stopped"], 3);

    let listed = router
        .oneshot(
            Request::builder()
                .uri("/v2/vllm/instances")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(listed).await, json!([]));
}

#[tokio::test]
async fn ranged_log_read_returns_partial_content() {
    let dir = tempfile::tempdir().unwrap();
    let router = app(dir.path());

    let create = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/v2/vllm/instances/logged")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "options": "--model m" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let content = [vec![b'A'; 20], vec![b'B'; 20], vec![b'C'; 20]].concat();
    std::fs::write(dir.path().join("logged.log"), &content).unwrap();

    let ranged = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v2/vllm/instances/logged/log")
                .header(header::RANGE, "bytes=10-39")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ranged.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        ranged.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes 10-39/60"
    );
    let body = ranged.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..10], &vec![b'A'; 10][..]);
    assert_eq!(&body[10..], &vec![b'B'; 20][..]);

    let malformed = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v2/vllm/instances/logged/log")
                .header(header::RANGE, "bytes=-500")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let past_eof = router
        .oneshot(
            Request::builder()
                .uri("/v2/vllm/instances/logged/log")
                .header(header::RANGE, "bytes=100-")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(past_eof.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        past_eof.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes */60"
    );
}
