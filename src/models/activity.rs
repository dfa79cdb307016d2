// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Finalized activity summary and the activity API request/response bodies.

use crate::models::TrackPoint;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name used when the user leaves the name blank.
pub const DEFAULT_ACTIVITY_NAME: &str = "Workout";

/// Sport type of a recorded activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    Run,
    Walk,
    Bike,
}

/// Immutable result of finalizing a session, ready for upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    /// Timestamp of the first accepted point (ISO 8601)
    pub started_at: String,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub points: Vec<TrackPoint>,
}

/// User-entered details supplied when finishing a recording.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FinishRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "name must be at most 100 characters"))]
    pub name: String,
    #[serde(default, rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    #[validate(length(max = 500, message = "note must be at most 500 characters"))]
    pub note: Option<String>,
}

impl FinishRequest {
    /// Name sent to the API: blank names get a default and a non-blank
    /// note is appended as `"{name} - {note}"`.
    pub fn display_name(&self) -> String {
        let name = match self.name.trim() {
            "" => DEFAULT_ACTIVITY_NAME,
            name => name,
        };
        match self.note.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => format!("{} - {}", name, note),
            _ => name.to_string(),
        }
    }
}

/// Body of `POST /api/activities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub user_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub started_at: String,
    pub distance_km: f64,
    pub duration_min: f64,
}

impl CreateActivityRequest {
    pub fn from_summary(owner_id: u64, details: &FinishRequest, summary: &ActivitySummary) -> Self {
        Self {
            user_id: owner_id,
            name: details.display_name(),
            activity_type: details.activity_type,
            started_at: summary.started_at.clone(),
            distance_km: summary.distance_km,
            duration_min: summary.duration_minutes,
        }
    }
}

/// Response of `POST /api/activities`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityResponse {
    pub id: u64,
}

/// Body of `PUT /api/activities/{id}/track`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRequest {
    pub points: Vec<TrackPoint>,
}
