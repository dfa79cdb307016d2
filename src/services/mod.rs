// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the recording engine.

pub mod engine;
pub mod filter;
pub mod finalizer;
pub mod location;
pub mod metrics;
pub mod recorder;
pub mod segmenter;
pub mod upload;

pub use engine::{PermissionOutcome, RecorderHandle};
pub use filter::{RejectReason, SampleFilter};
pub use finalizer::{TrackFinalizer, MIN_TRACK_POINTS};
pub use location::{
    LocationFeed, LocationSource, LocationSubscription, PermissionStatus, PushOutcome,
};
pub use metrics::MetricsAccumulator;
pub use recorder::{FinishedSession, Recorder, RecordingSession, SampleOutcome};
pub use segmenter::{BreakReason, Placement, Segmenter};
pub use upload::{upload_activity, ActivityApi, ActivityApiClient};
