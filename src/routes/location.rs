// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry points for the platform shell: raw fixes and permission decisions.

use crate::error::{RecorderError, Result};
use crate::models::GeoSample;
use crate::services::{PermissionOutcome, PermissionStatus, PushOutcome};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest batch of fixes accepted in one request.
const MAX_SAMPLES_PER_BATCH: usize = 1000;

/// Location routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/location/samples", post(push_samples))
        .route(
            "/location/permission",
            get(get_permission).post(set_permission),
        )
        .route("/location/request-permission", post(request_permission))
}

#[derive(Debug, Deserialize)]
pub struct SamplesRequest {
    pub samples: Vec<GeoSample>,
}

/// Per-batch delivery counts.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SamplesResponse {
    pub delivered: usize,
    pub throttled: usize,
    pub dropped: usize,
    /// No live subscription, e.g. while paused.
    pub ignored: usize,
}

async fn push_samples(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SamplesRequest>,
) -> Result<Json<SamplesResponse>> {
    if body.samples.len() > MAX_SAMPLES_PER_BATCH {
        return Err(RecorderError::BadRequest(format!(
            "At most {} samples per request",
            MAX_SAMPLES_PER_BATCH
        )));
    }

    let mut counts = SamplesResponse::default();
    for sample in body.samples {
        match state.location_feed.push(sample) {
            PushOutcome::Delivered => counts.delivered += 1,
            PushOutcome::Throttled => counts.throttled += 1,
            PushOutcome::Dropped => counts.dropped += 1,
            PushOutcome::NoSubscriber => counts.ignored += 1,
        }
    }

    tracing::debug!(
        delivered = counts.delivered,
        throttled = counts.throttled,
        dropped = counts.dropped,
        ignored = counts.ignored,
        "Location batch pushed"
    );
    Ok(Json(counts))
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub status: PermissionStatus,
    /// A request is waiting for the user's answer.
    pub requested: bool,
}

fn permission_response(state: &AppState) -> PermissionResponse {
    PermissionResponse {
        status: state.location_feed.permission(),
        requested: state.location_feed.permission_requested(),
    }
}

async fn get_permission(State(state): State<Arc<AppState>>) -> Json<PermissionResponse> {
    Json(permission_response(&state))
}

#[derive(Debug, Deserialize)]
pub struct PermissionDecision {
    pub granted: bool,
}

/// The shell reports the OS permission dialog result here.
async fn set_permission(
    State(state): State<Arc<AppState>>,
    Json(decision): Json<PermissionDecision>,
) -> Json<PermissionResponse> {
    state.location_feed.set_permission(decision.granted);
    Json(permission_response(&state))
}

#[derive(Debug, Serialize)]
pub struct RequestPermissionResponse {
    pub granted: bool,
    /// No decision arrived before the timeout.
    pub timed_out: bool,
}

async fn request_permission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RequestPermissionResponse>> {
    let outcome = state.recorder.request_permission().await?;
    Ok(Json(RequestPermissionResponse {
        granted: outcome == PermissionOutcome::Granted,
        timed_out: outcome == PermissionOutcome::TimedOut,
    }))
}
