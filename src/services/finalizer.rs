// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Freezes a recording session into an uploadable summary.

use crate::error::{RecorderError, Result};
use crate::models::ActivitySummary;
use crate::services::recorder::RecordingSession;
use crate::time_utils::format_utc_rfc3339;

/// Fewer points than this cannot describe a track or a duration.
pub const MIN_TRACK_POINTS: usize = 2;

pub struct TrackFinalizer;

impl TrackFinalizer {
    /// Validate the session and build its summary. The session is only read.
    pub fn finalize(session: &RecordingSession) -> Result<ActivitySummary> {
        let points = session.all_points();
        if points.len() < MIN_TRACK_POINTS {
            return Err(RecorderError::InsufficientData {
                points: points.len(),
                required: MIN_TRACK_POINTS,
            });
        }

        let started_at = points
            .first()
            .map(|p| p.timestamp.clone())
            .unwrap_or_else(|| format_utc_rfc3339(chrono::Utc::now()));

        Ok(ActivitySummary {
            started_at,
            distance_km: session.metrics().distance_km(),
            duration_minutes: session.metrics().accumulated_seconds() as f64 / 60.0,
            points: points.to_vec(),
        })
    }
}
