// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sample quality filter.

use crate::config::DEFAULT_ACCURACY_THRESHOLD_M;
use crate::models::GeoSample;
use std::fmt;

/// Why a sample was dropped. Rejections are expected noise, not errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Reported accuracy radius is worse than the threshold.
    LowAccuracy { accuracy_meters: f64 },
    /// The (0, 0) sentinel some providers emit without a fix.
    NoFix,
    /// NaN/infinite or out-of-range coordinates or accuracy.
    Malformed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::LowAccuracy { accuracy_meters } => {
                write!(f, "low accuracy ({:.1} m)", accuracy_meters)
            }
            RejectReason::NoFix => write!(f, "no fix"),
            RejectReason::Malformed => write!(f, "malformed sample"),
        }
    }
}

/// Pure predicate over incoming samples.
#[derive(Debug, Clone, Copy)]
pub struct SampleFilter {
    accuracy_threshold_m: f64,
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY_THRESHOLD_M)
    }
}

impl SampleFilter {
    pub fn new(accuracy_threshold_m: f64) -> Self {
        Self {
            accuracy_threshold_m,
        }
    }

    pub fn accuracy_threshold_m(&self) -> f64 {
        self.accuracy_threshold_m
    }

    pub fn accept(&self, sample: &GeoSample) -> bool {
        self.check(sample).is_ok()
    }

    /// Accept the sample or say why not.
    pub fn check(&self, sample: &GeoSample) -> Result<(), RejectReason> {
        let coords_valid = sample.latitude.is_finite()
            && sample.longitude.is_finite()
            && (-90.0..=90.0).contains(&sample.latitude)
            && (-180.0..=180.0).contains(&sample.longitude);
        if !coords_valid || !sample.accuracy_meters.is_finite() || sample.accuracy_meters < 0.0 {
            return Err(RejectReason::Malformed);
        }

        if sample.latitude == 0.0 && sample.longitude == 0.0 {
            return Err(RejectReason::NoFix);
        }

        if sample.accuracy_meters > self.accuracy_threshold_m {
            return Err(RejectReason::LowAccuracy {
                accuracy_meters: sample.accuracy_meters,
            });
        }

        Ok(())
    }
}
