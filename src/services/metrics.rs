// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Running distance and elapsed-time accounting.
//!
//! Distance grows from accepted samples. Elapsed time is wall-clock time
//! spent in the recording state, advanced by the ticker, so it keeps
//! moving through signal gaps. Both only ever grow until `reset`.

use crate::models::{GeoSample, MetricsSnapshot};
use tokio::time::Instant;

/// Wall-clock stretch currently being timed.
#[derive(Debug, Clone, Copy)]
struct Stretch {
    started: Instant,
    seconds_before: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    distance_km: f64,
    accumulated_seconds: i64,
    stretch: Option<Stretch>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn accumulated_seconds(&self) -> i64 {
        self.accumulated_seconds
    }

    /// Add the hop from `prior` to `new_sample`. No prior means the
    /// sample opens a stretch and contributes nothing.
    pub fn on_accepted_sample(
        &mut self,
        prior: Option<&GeoSample>,
        new_sample: &GeoSample,
    ) -> MetricsSnapshot {
        if let Some(prior) = prior {
            self.distance_km += prior.distance_to(new_sample) / 1000.0;
        }
        self.snapshot()
    }

    /// Begin timing a recording stretch at `now`.
    pub fn start_clock(&mut self, now: Instant) {
        self.stretch = Some(Stretch {
            started: now,
            seconds_before: self.accumulated_seconds,
        });
    }

    /// Bring elapsed time up to `now`.
    pub fn tick(&mut self, now: Instant) -> MetricsSnapshot {
        if let Some(stretch) = self.stretch {
            let elapsed = now.saturating_duration_since(stretch.started).as_secs() as i64;
            self.accumulated_seconds = self
                .accumulated_seconds
                .max(stretch.seconds_before + elapsed);
        }
        self.snapshot()
    }

    /// Settle elapsed time at `now` and stop timing.
    pub fn stop_clock(&mut self, now: Instant) {
        self.tick(now);
        self.stretch = None;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_totals(self.distance_km, self.accumulated_seconds)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
