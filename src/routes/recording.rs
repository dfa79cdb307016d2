// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording control and read-only route/metrics for the renderer.

use crate::error::{RecorderError, Result};
use crate::models::{FinishRequest, MetricsSnapshot, RecorderView, RecordingState, TrackPoint};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Recording routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recording", get(get_status))
        .route("/recording/route", get(get_route))
        .route("/recording/route.geojson", get(get_route_geojson))
        .route("/recording/start", post(start))
        .route("/recording/pause", post(pause))
        .route("/recording/resume", post(resume))
        .route("/recording/discard", post(discard))
        .route("/recording/finish", post(finish))
        .route("/recording/retry-unsent", post(retry_unsent))
}

// ─── Status ──────────────────────────────────────────────────

/// Current state and metrics.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub state: RecordingState,
    pub metrics: MetricsSnapshot,
    pub point_count: usize,
    pub segment_count: usize,
    pub unsent_uploads: usize,
}

impl From<&RecorderView> for StatusResponse {
    fn from(view: &RecorderView) -> Self {
        Self {
            state: view.state,
            metrics: view.metrics.clone(),
            point_count: view.point_count,
            segment_count: view.route.segments().len(),
            unsent_uploads: view.unsent_uploads,
        }
    }
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&state.recorder.view()))
}

// ─── Route ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub points: Vec<TrackPoint>,
    /// Encoded polyline, precision 5
    pub polyline: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub segments: Vec<SegmentResponse>,
}

async fn get_route(State(state): State<Arc<AppState>>) -> Result<Json<RouteResponse>> {
    let view = state.recorder.view();
    let segments = view
        .route
        .segments()
        .iter()
        .map(|segment| {
            let polyline = segment
                .encoded_polyline()
                .map_err(|e| RecorderError::Internal(anyhow::anyhow!("Polyline error: {}", e)))?;
            Ok(SegmentResponse {
                points: segment.points().to_vec(),
                polyline,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(RouteResponse { segments }))
}

async fn get_route_geojson(State(state): State<Arc<AppState>>) -> Json<geojson::Feature> {
    Json(state.recorder.view().route.to_geojson())
}

// ─── Transitions ─────────────────────────────────────────────

async fn start(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    state.recorder.start().await?;
    Ok(Json(StatusResponse::from(&state.recorder.view())))
}

async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    state.recorder.pause().await?;
    Ok(Json(StatusResponse::from(&state.recorder.view())))
}

async fn resume(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    state.recorder.resume().await?;
    Ok(Json(StatusResponse::from(&state.recorder.view())))
}

async fn discard(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    state.recorder.discard().await?;
    Ok(Json(StatusResponse::from(&state.recorder.view())))
}

#[derive(Debug, Serialize)]
pub struct FinishResponse {
    pub activity_id: u64,
    pub status: StatusResponse,
}

/// Finalize and upload. Failures leave the recording paused.
async fn finish(
    State(state): State<Arc<AppState>>,
    Json(details): Json<FinishRequest>,
) -> Result<Json<FinishResponse>> {
    details
        .validate()
        .map_err(|e| RecorderError::BadRequest(e.to_string()))?;

    let activity_id = state.recorder.finish(details).await?;
    Ok(Json(FinishResponse {
        activity_id,
        status: StatusResponse::from(&state.recorder.view()),
    }))
}

#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub queued: usize,
}

async fn retry_unsent(State(state): State<Arc<AppState>>) -> Result<Json<RetryResponse>> {
    let queued = state.recorder.retry_unsent().await?;
    Ok(Json(RetryResponse { queued }))
}
