// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live workout metrics as shown to the user.

use crate::time_utils::format_clock;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Pace is undefined until at least this much distance is covered.
pub const PACE_MIN_DISTANCE_KM: f64 = 0.05;

/// Paces at or above this many minutes per km are shown as undefined.
pub const PACE_MAX_MINUTES: f64 = 600.0;

/// Display value for an undefined pace.
pub const UNDEFINED_PACE: &str = "--:--";

/// Point-in-time view of the accumulated metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricsSnapshot {
    pub distance_km: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub elapsed_seconds: i64,
    /// Seconds per km, `None` while undefined
    pub pace_seconds_per_km: Option<f64>,
    /// `MM:SS` or `HH:MM:SS`
    pub duration: String,
    /// `M:SS /km` or `--:--`
    pub pace: String,
}

impl MetricsSnapshot {
    pub fn from_totals(distance_km: f64, elapsed_seconds: i64) -> Self {
        let pace_seconds_per_km = pace_seconds_per_km(distance_km, elapsed_seconds);
        Self {
            distance_km,
            elapsed_seconds,
            pace_seconds_per_km,
            duration: format_clock(elapsed_seconds),
            pace: format_pace(pace_seconds_per_km),
        }
    }

    pub fn zero() -> Self {
        Self::from_totals(0.0, 0)
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

/// Seconds per km, undefined for near-zero distances and absurd paces.
pub fn pace_seconds_per_km(distance_km: f64, elapsed_seconds: i64) -> Option<f64> {
    if distance_km <= PACE_MIN_DISTANCE_KM {
        return None;
    }
    Some(elapsed_seconds as f64 / distance_km).filter(|pace| is_displayable(*pace))
}

fn is_displayable(seconds_per_km: f64) -> bool {
    seconds_per_km.is_finite()
        && seconds_per_km >= 0.0
        && (seconds_per_km / 60.0).floor() < PACE_MAX_MINUTES
}

/// Format a pace as `M:SS /km`.
pub fn format_pace(seconds_per_km: Option<f64>) -> String {
    let Some(pace) = seconds_per_km.filter(|p| is_displayable(*p)) else {
        return UNDEFINED_PACE.to_string();
    };

    let minutes = (pace / 60.0).floor();
    let seconds = (pace % 60.0).floor();
    format!("{}:{:02} /km", minutes as u64, seconds as u64)
}
