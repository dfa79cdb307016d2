// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_recorder::config::Config;
use activity_recorder::error::{RecorderError, Result, UploadStage};
use activity_recorder::models::{CreateActivityRequest, GeoSample, RecorderView, TrackPoint};
use activity_recorder::routes::create_router;
use activity_recorder::services::{ActivityApi, LocationFeed, RecorderHandle};
use activity_recorder::AppState;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed start of every test track.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
}

/// Sample with good accuracy `secs` seconds after `t0()`.
#[allow(dead_code)]
pub fn sample(lat: f64, lon: f64, secs: i64) -> GeoSample {
    sample_with_accuracy(lat, lon, 10.0, secs)
}

#[allow(dead_code)]
pub fn sample_with_accuracy(lat: f64, lon: f64, accuracy: f64, secs: i64) -> GeoSample {
    GeoSample::new(lat, lon, accuracy, t0() + chrono::Duration::seconds(secs))
}

/// A call seen by the mock activity API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Create(CreateActivityRequest),
    Attach { activity_id: u64, points: usize },
}

/// In-memory activity API with switchable failures.
#[derive(Default)]
pub struct MockActivityApi {
    calls: Mutex<Vec<ApiCall>>,
    fail_create: AtomicBool,
    fail_attach: AtomicBool,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
}

#[allow(dead_code)]
impl MockActivityApi {
    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `delay` (use with paused tokio time).
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<CreateActivityRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Create(request) => Some(request),
                ApiCall::Attach { .. } => None,
            })
            .collect()
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl ActivityApi for MockActivityApi {
    async fn create_activity(&self, request: &CreateActivityRequest) -> Result<u64> {
        self.maybe_delay().await;
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Create(request.clone()));

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RecorderError::UploadFailed {
                stage: UploadStage::CreateActivity,
                activity_id: None,
                message: "HTTP 500 Internal Server Error".to_string(),
            });
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn attach_track(&self, activity_id: u64, points: &[TrackPoint]) -> Result<()> {
        self.maybe_delay().await;
        self.calls.lock().unwrap().push(ApiCall::Attach {
            activity_id,
            points: points.len(),
        });

        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(RecorderError::UploadFailed {
                stage: UploadStage::AttachTrack,
                activity_id: Some(activity_id),
                message: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Engine wired to a fresh feed and mock API.
#[allow(dead_code)]
pub fn spawn_engine(feed: &LocationFeed) -> (RecorderHandle, Arc<MockActivityApi>) {
    let config = Config::test_default();
    let api = Arc::new(MockActivityApi::default());
    let handle = RecorderHandle::spawn(
        config.recorder_settings(),
        config.owner_id,
        Arc::new(feed.clone()),
        Arc::clone(&api),
    );
    (handle, api)
}

/// Wait until the published view satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for_view(
    handle: &RecorderHandle,
    predicate: impl FnMut(&RecorderView) -> bool,
) -> RecorderView {
    let mut rx = handle.watch();
    let view = rx.wait_for(predicate).await.unwrap();
    view.clone()
}

/// Create a test app with a granted location permission.
/// Returns the router, the shared state and the mock API.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MockActivityApi>) {
    create_test_app_with_feed(LocationFeed::granted())
}

#[allow(dead_code)]
pub fn create_test_app_with_feed(
    location_feed: LocationFeed,
) -> (axum::Router, Arc<AppState>, Arc<MockActivityApi>) {
    let config = Config::test_default();
    let (recorder, api) = spawn_engine(&location_feed);

    let state = Arc::new(AppState {
        config,
        recorder,
        location_feed,
    });

    (create_router(state.clone()), state, api)
}
