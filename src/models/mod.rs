// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the recording engine and the activity API.

pub mod activity;
pub mod metrics;
pub mod recording;
pub mod route;
pub mod sample;

pub use activity::{
    ActivityResponse, ActivitySummary, ActivityType, CreateActivityRequest, FinishRequest,
    TrackRequest,
};
pub use metrics::MetricsSnapshot;
pub use recording::{RecorderView, RecordingState};
pub use route::{Route, Segment};
pub use sample::{GeoSample, TrackPoint};
