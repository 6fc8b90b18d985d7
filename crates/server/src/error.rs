// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Maps the domain error type onto HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vllm_core::LauncherError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(pub LauncherError);

impl From<LauncherError> for ApiError {
    fn from(err: LauncherError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LauncherError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            LauncherError::AlreadyExists(_) => (StatusCode::CONFLICT, self.0.to_string()),
            LauncherError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            LauncherError::UnknownDevice(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            LauncherError::LogRangeNotAvailable { .. } => {
                (StatusCode::RANGE_NOT_SATISFIABLE, self.0.to_string())
            }
            LauncherError::Internal(_) => {
                tracing::error!(error = %self.0, "internal launcher error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
