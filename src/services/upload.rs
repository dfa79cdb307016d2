// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity API client and the two-phase upload of a finalized track.
//!
//! Upload is create-activity (metadata) followed by attach-track (points).
//! The track is only attached once the metadata record exists. If the
//! second call fails, the server keeps a record without a track; nothing
//! here deletes it, and a retry runs both calls again.

use crate::error::{RecorderError, Result, UploadStage};
use crate::models::{
    ActivityResponse, ActivitySummary, CreateActivityRequest, TrackPoint, TrackRequest,
};
use anyhow::Context;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Per-request timeout for the activity API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Remote collaborator that stores finished activities.
pub trait ActivityApi: Send + Sync + 'static {
    /// Create the metadata record; returns the new activity ID.
    fn create_activity(
        &self,
        request: &CreateActivityRequest,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Attach the ordered point sequence to an existing activity.
    fn attach_track(
        &self,
        activity_id: u64,
        points: &[TrackPoint],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Run the two-phase upload and return the created activity ID.
pub async fn upload_activity<A: ActivityApi>(
    api: &A,
    request: &CreateActivityRequest,
    summary: &ActivitySummary,
) -> Result<u64> {
    let activity_id = api.create_activity(request).await?;
    tracing::info!(activity_id, "Activity record created");

    if let Err(e) = api.attach_track(activity_id, &summary.points).await {
        tracing::warn!(
            activity_id,
            error = %e,
            "Track attach failed; activity record is left without a track"
        );
        return Err(match e {
            RecorderError::UploadFailed { message, .. } => RecorderError::UploadFailed {
                stage: UploadStage::AttachTrack,
                activity_id: Some(activity_id),
                message,
            },
            other => other,
        });
    }

    tracing::info!(activity_id, points = summary.points.len(), "Track uploaded");
    Ok(activity_id)
}

/// HTTP client for the activity API.
#[derive(Clone)]
pub struct ActivityApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ActivityApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        stage: UploadStage,
        activity_id: Option<u64>,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = match status.as_u16() {
            429 => {
                tracing::warn!("Activity API rate limit hit (429)");
                RecorderError::API_RATE_LIMIT.to_string()
            }
            401 => RecorderError::API_TOKEN_ERROR.to_string(),
            _ => format!("HTTP {}: {}", status, body),
        };

        Err(RecorderError::UploadFailed {
            stage,
            activity_id,
            message,
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        stage: UploadStage,
        activity_id: Option<u64>,
        response: reqwest::Response,
    ) -> Result<T> {
        self.check_response(stage, activity_id, response)
            .await?
            .json()
            .await
            .map_err(|e| RecorderError::UploadFailed {
                stage,
                activity_id,
                message: format!("JSON parse error: {}", e),
            })
    }
}

fn transport_error(stage: UploadStage, activity_id: Option<u64>, e: reqwest::Error) -> RecorderError {
    RecorderError::UploadFailed {
        stage,
        activity_id,
        message: e.to_string(),
    }
}

impl ActivityApi for ActivityApiClient {
    async fn create_activity(&self, request: &CreateActivityRequest) -> Result<u64> {
        let stage = UploadStage::CreateActivity;
        let url = format!("{}/api/activities", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(stage, None, e))?;

        let created: ActivityResponse = self.check_response_json(stage, None, response).await?;
        Ok(created.id)
    }

    async fn attach_track(&self, activity_id: u64, points: &[TrackPoint]) -> Result<()> {
        let stage = UploadStage::AttachTrack;
        let url = format!("{}/api/activities/{}/track", self.base_url, activity_id);
        let body = TrackRequest {
            points: points.to_vec(),
        };

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(stage, Some(activity_id), e))?;

        self.check_response(stage, Some(activity_id), response).await?;
        Ok(())
    }
}
