// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording state machine and the session it exclusively owns.
//!
//! Lifecycle:
//! ```text
//! Idle ──start──► Recording ──pause──► Paused ──finish──► Finished
//!                     ▲                  │  │
//!                     └─────resume───────┘  └──discard──► Discarded
//! ```
//! `start` is also accepted from the terminal states to begin the next
//! session. Illegal transitions are rejected with `InvalidTransition` and
//! leave everything untouched.

use crate::config::RecorderSettings;
use crate::error::{RecorderError, Result};
use crate::models::{
    ActivitySummary, GeoSample, RecorderView, RecordingState, Route, TrackPoint,
};
use crate::services::filter::{RejectReason, SampleFilter};
use crate::services::finalizer::TrackFinalizer;
use crate::services::metrics::MetricsAccumulator;
use crate::services::segmenter::{BreakReason, Placement, Segmenter};
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// What happened to a delivered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Not recording; the sample was not looked at.
    Ignored,
    Rejected(RejectReason),
    Accepted(Placement),
}

/// Captured data of one recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    route: Route,
    all_points: Vec<TrackPoint>,
    metrics: MetricsAccumulator,
    last_accepted: Option<GeoSample>,
    pause_anchor: Option<DateTime<Utc>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn all_points(&self) -> &[TrackPoint] {
        &self.all_points
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut MetricsAccumulator {
        &mut self.metrics
    }

    pub fn last_accepted(&self) -> Option<&GeoSample> {
        self.last_accepted.as_ref()
    }

    pub fn pause_anchor(&self) -> Option<DateTime<Utc>> {
        self.pause_anchor
    }

    /// Drop everything captured so far.
    pub fn reset(&mut self) {
        self.route.clear();
        self.all_points.clear();
        self.metrics.reset();
        self.last_accepted = None;
        self.pause_anchor = None;
    }

    /// Filter, then segment, then accumulate, then remember the sample.
    /// A rejected sample changes nothing.
    pub(crate) fn ingest(
        &mut self,
        filter: &SampleFilter,
        segmenter: &Segmenter,
        sample: GeoSample,
    ) -> SampleOutcome {
        if let Err(reason) = filter.check(&sample) {
            tracing::debug!(%reason, "Sample rejected");
            return SampleOutcome::Rejected(reason);
        }

        let point = sample.to_track_point();
        let prior = self.last_accepted.as_ref();

        let placement = segmenter.ingest(&mut self.route, point.clone(), prior, &sample);
        self.metrics.on_accepted_sample(prior, &sample);
        self.all_points.push(point);
        self.last_accepted = Some(sample);

        if let Placement::NewSegment(reason) = placement {
            if !matches!(reason, BreakReason::NoPriorSample) {
                tracing::debug!(
                    ?reason,
                    segments = self.route.segments().len(),
                    "GPS gap, starting new segment"
                );
            }
        }

        SampleOutcome::Accepted(placement)
    }
}

/// A finalized session handed off for upload.
#[derive(Debug, Clone)]
pub struct FinishedSession {
    pub summary: ActivitySummary,
    /// Frozen copy, used to restore `Paused` if the upload fails.
    pub session: RecordingSession,
}

/// The single owner and mutation entry point of the live session.
#[derive(Debug, Clone)]
pub struct Recorder {
    state: RecordingState,
    session: RecordingSession,
    filter: SampleFilter,
    segmenter: Segmenter,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(&RecorderSettings::default())
    }
}

impl Recorder {
    pub fn new(settings: &RecorderSettings) -> Self {
        Self {
            state: RecordingState::Idle,
            session: RecordingSession::new(),
            filter: SampleFilter::new(settings.accuracy_threshold_m),
            segmenter: Segmenter::new(
                settings.segment_break_distance_m,
                settings.segment_break_speed_mps,
                settings.segment_break_gap,
            ),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    fn reject(&self, action: &'static str) -> RecorderError {
        tracing::error!(action, state = %self.state, "Invalid recorder transition");
        RecorderError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    /// Begin a fresh session.
    pub fn start(&mut self, permission_granted: bool, now: Instant) -> Result<()> {
        if self.state.is_active() {
            return Err(self.reject("start"));
        }
        if !permission_granted {
            tracing::warn!("Cannot start recording without location permission");
            return Err(RecorderError::PermissionDenied);
        }

        self.session.reset();
        self.session.metrics.start_clock(now);
        self.state = RecordingState::Recording;
        tracing::info!(state = %self.state, "Recording started");
        Ok(())
    }

    /// Feed one sample from the location source.
    pub fn on_sample(&mut self, sample: GeoSample) -> SampleOutcome {
        if self.state != RecordingState::Recording {
            return SampleOutcome::Ignored;
        }
        self.session.ingest(&self.filter, &self.segmenter, sample)
    }

    /// Advance elapsed time. Returns false when not recording.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.state != RecordingState::Recording {
            return false;
        }
        self.session.metrics.tick(now);
        true
    }

    pub fn pause(&mut self, now: Instant) -> Result<()> {
        if self.state != RecordingState::Recording {
            return Err(self.reject("pause"));
        }

        self.session.metrics.stop_clock(now);
        self.session.pause_anchor = Some(Utc::now());
        self.state = RecordingState::Paused;
        tracing::info!(
            state = %self.state,
            points = self.session.all_points.len(),
            distance_km = self.session.metrics.distance_km(),
            "Recording paused"
        );
        Ok(())
    }

    /// Continue recording. The next accepted sample opens a new segment and
    /// adds no distance for the pause boundary.
    pub fn resume(&mut self, now: Instant) -> Result<()> {
        if self.state != RecordingState::Paused {
            return Err(self.reject("resume"));
        }

        self.session.last_accepted = None;
        self.session.pause_anchor = None;
        self.session.metrics.start_clock(now);
        self.state = RecordingState::Recording;
        tracing::info!(state = %self.state, "Recording resumed");
        Ok(())
    }

    /// Throw the session away. Accepted from any state.
    pub fn discard(&mut self) {
        let points = self.session.all_points.len();
        self.session.reset();
        self.state = RecordingState::Discarded;
        tracing::info!(state = %self.state, points, "Recording discarded");
    }

    /// Finalize a paused session. On validation failure the recorder stays
    /// paused with its data; on success it becomes `Finished` and the
    /// session moves into the returned value.
    pub fn finish(&mut self) -> Result<FinishedSession> {
        if self.state != RecordingState::Paused {
            return Err(self.reject("finish"));
        }

        let summary = TrackFinalizer::finalize(&self.session).inspect_err(|e| {
            tracing::warn!(error = %e, "Finalize rejected, staying paused");
        })?;

        let session = std::mem::take(&mut self.session);
        self.state = RecordingState::Finished;
        tracing::info!(
            state = %self.state,
            points = summary.points.len(),
            distance_km = summary.distance_km,
            duration_minutes = summary.duration_minutes,
            "Recording finalized"
        );
        Ok(FinishedSession { summary, session })
    }

    /// Put a finalized session back as `Paused` after a failed upload.
    /// Refused while another session is live; the caller keeps it then.
    pub fn restore(&mut self, session: RecordingSession) -> std::result::Result<(), RecordingSession> {
        if self.state.is_active() {
            return Err(session);
        }

        self.session = session;
        if self.session.pause_anchor.is_none() {
            self.session.pause_anchor = Some(Utc::now());
        }
        self.state = RecordingState::Paused;
        tracing::info!(
            state = %self.state,
            points = self.session.all_points.len(),
            "Session restored after failed upload"
        );
        Ok(())
    }

    pub fn view(&self, unsent_uploads: usize) -> RecorderView {
        RecorderView {
            state: self.state,
            metrics: self.session.metrics.snapshot(),
            route: self.session.route.clone(),
            point_count: self.session.all_points.len(),
            unsent_uploads,
        }
    }
}
