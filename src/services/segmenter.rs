// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Splits the accepted sample stream into polyline segments.
//!
//! A large jump or a long silence between consecutive accepted samples
//! means the receiver lost the signal (tunnel, elevator, ...). Drawing a
//! straight line across it would be misleading, so a new segment starts.
//! Segments are never merged back together.
//!
//! The distance threshold is measured over the real time between the two
//! samples: the allowed jump is the break distance plus the break speed
//! times the elapsed seconds.

use crate::config::{
    DEFAULT_SEGMENT_BREAK_DISTANCE_M, DEFAULT_SEGMENT_BREAK_GAP_SECS,
    DEFAULT_SEGMENT_BREAK_SPEED_MPS,
};
use crate::models::{GeoSample, Route, TrackPoint};
use std::time::Duration;

/// How a point was placed into the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Appended,
    NewSegment(BreakReason),
}

/// Why a new segment was started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakReason {
    /// No current segment, or continuity was reset (start/resume).
    NoPriorSample,
    Distance { meters: f64, allowed_meters: f64 },
    Gap { seconds: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    break_distance_m: f64,
    break_speed_mps: f64,
    break_gap: Duration,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEGMENT_BREAK_DISTANCE_M,
            DEFAULT_SEGMENT_BREAK_SPEED_MPS,
            Duration::from_secs(DEFAULT_SEGMENT_BREAK_GAP_SECS),
        )
    }
}

impl Segmenter {
    pub fn new(break_distance_m: f64, break_speed_mps: f64, break_gap: Duration) -> Self {
        Self {
            break_distance_m,
            break_speed_mps,
            break_gap,
        }
    }

    /// Place `point` (derived from `new_sample`) into `route`.
    pub fn ingest(
        &self,
        route: &mut Route,
        point: TrackPoint,
        prior_sample: Option<&GeoSample>,
        new_sample: &GeoSample,
    ) -> Placement {
        let placement = match prior_sample {
            _ if route.is_empty() => Placement::NewSegment(BreakReason::NoPriorSample),
            None => Placement::NewSegment(BreakReason::NoPriorSample),
            Some(prior) => self.classify(prior, new_sample),
        };

        match placement {
            Placement::Appended => route.append(point),
            Placement::NewSegment(_) => route.start_segment(point),
        }
        placement
    }

    /// Largest jump that still continues the segment after `elapsed_secs`.
    pub fn allowed_jump(&self, elapsed_secs: f64) -> f64 {
        self.break_distance_m + self.break_speed_mps * elapsed_secs.max(0.0)
    }

    fn classify(&self, prior: &GeoSample, new_sample: &GeoSample) -> Placement {
        let gap = new_sample.timestamp.signed_duration_since(prior.timestamp);
        if gap.num_seconds() > self.break_gap.as_secs() as i64 {
            return Placement::NewSegment(BreakReason::Gap {
                seconds: gap.num_seconds(),
            });
        }

        let meters = prior.distance_to(new_sample);
        let allowed_meters = self.allowed_jump(gap.num_milliseconds() as f64 / 1000.0);
        if meters > allowed_meters {
            return Placement::NewSegment(BreakReason::Distance {
                meters,
                allowed_meters,
            });
        }

        Placement::Appended
    }
}
