// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording lifecycle state and the read-only view published to renderers.

use crate::models::{MetricsSnapshot, Route};
use serde::Serialize;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Paused,
    /// Terminal: the session was finalized and handed off for upload.
    Finished,
    /// Terminal: the session was thrown away.
    Discarded,
}

impl RecordingState {
    /// A session exists and holds captured data.
    pub fn is_active(self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Finished => "finished",
            RecordingState::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

/// Everything a renderer needs, refreshed on every accepted sample,
/// ticker tick and transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecorderView {
    pub state: RecordingState,
    pub metrics: MetricsSnapshot,
    pub route: Route,
    pub point_count: usize,
    /// Finalized sessions whose upload failed and could not be restored.
    pub unsent_uploads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_value(RecordingState::Recording).unwrap();
        assert_eq!(json, "recording");
        assert_eq!(RecordingState::Discarded.to_string(), "discarded");
    }

    #[test]
    fn test_is_active() {
        assert!(RecordingState::Recording.is_active());
        assert!(RecordingState::Paused.is_active());
        assert!(!RecordingState::Idle.is_active());
        assert!(!RecordingState::Finished.is_active());
        assert!(!RecordingState::Discarded.is_active());
    }
}
