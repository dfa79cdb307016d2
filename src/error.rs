// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recorder error types with consistent API responses.

use crate::models::RecordingState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Which half of the two-phase upload failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    CreateActivity,
    AttachTrack,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::CreateActivity => write!(f, "create-activity"),
            UploadStage::AttachTrack => write!(f, "attach-track"),
        }
    }
}

/// Recorder error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Not enough GPS data: {points} point(s), need at least {required}")]
    InsufficientData { points: usize, required: usize },

    #[error("Upload failed during {stage}: {message}")]
    UploadFailed {
        stage: UploadStage,
        /// Set when the metadata record was created before the failure.
        activity_id: Option<u64>,
        message: String,
    },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: RecordingState,
    },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Recorder engine is not running")]
    EngineStopped,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RecorderError {
    pub const API_RATE_LIMIT: &'static str = "Activity API rate limit exceeded";
    pub const API_TOKEN_ERROR: &'static str = "Activity API rejected the access token";

    /// True when the failure left a metadata record without a track.
    pub fn is_partial_upload(&self) -> bool {
        matches!(
            self,
            RecorderError::UploadFailed {
                stage: UploadStage::AttachTrack,
                activity_id: Some(_),
                ..
            }
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for RecorderError {
    fn into_response(self) -> Response {
        let details = Some(self.to_string());
        let (status, error, details) = match &self {
            RecorderError::PermissionDenied => {
                (StatusCode::FORBIDDEN, "permission_denied", details)
            }
            RecorderError::InsufficientData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_data", details)
            }
            RecorderError::UploadFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "upload_failed", details)
            }
            RecorderError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, "invalid_transition", details)
            }
            RecorderError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            RecorderError::EngineStopped => {
                (StatusCode::SERVICE_UNAVAILABLE, "engine_stopped", None)
            }
            RecorderError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, RecorderError>;
