// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location samples and the persisted track point derived from them.

use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A raw location fix from the device's positioning capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy_meters: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            timestamp,
        }
    }

    /// Coordinates as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle distance to another sample in meters.
    pub fn distance_to(&self, other: &GeoSample) -> f64 {
        Haversine.distance(self.point(), other.point())
    }

    /// The uploadable representation of this sample (accuracy is dropped).
    pub fn to_track_point(&self) -> TrackPoint {
        TrackPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: format_utc_rfc3339(self.timestamp),
        }
    }
}

/// Persisted/uploaded coordinate with an ISO 8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
}
