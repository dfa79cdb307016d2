// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location source abstraction.
//!
//! A source hands out cancellable subscriptions: the engine holds the
//! subscription while it wants fixes and drops it to stop delivery. There
//! is no listener to remember to unregister.
//!
//! `LocationFeed` is the bundled source. The platform shell pushes OS
//! fixes and permission decisions into it; it applies the minimum
//! interval/displacement parameters like a platform location manager.

use crate::config::LocationParams;
use crate::models::GeoSample;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

/// Buffered fixes per subscription before new ones are dropped.
const SUBSCRIPTION_BUFFER: usize = 256;

/// External provider of location fixes and the permission to read them.
pub trait LocationSource: Send + Sync + 'static {
    /// Is location permission currently granted?
    fn has_permission(&self) -> bool;

    /// Ask for permission; resolves to the user's decision.
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    /// Start delivering fixes. Dropping the subscription stops delivery.
    fn subscribe(&self, params: LocationParams) -> LocationSubscription;
}

/// Live feed of fixes. Cancelled on drop.
pub struct LocationSubscription {
    stream: BoxStream<'static, GeoSample>,
}

impl LocationSubscription {
    pub fn new(stream: impl Stream<Item = GeoSample> + Send + 'static) -> Self {
        Self {
            stream: stream.boxed(),
        }
    }

    /// Next fix; `None` once the source has closed the feed.
    pub async fn next(&mut self) -> Option<GeoSample> {
        self.stream.next().await
    }

    /// Stop delivery. The feed detaches once the receiving end is gone.
    pub fn cancel(self) {
        drop(self.stream);
    }
}

/// Permission state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Unknown,
    Granted,
    Denied,
}

/// Result of pushing a fix into the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Inside the minimum interval or displacement of the last delivered fix.
    Throttled,
    NoSubscriber,
    /// Subscriber buffer full.
    Dropped,
}

struct Subscriber {
    tx: mpsc::Sender<GeoSample>,
    params: LocationParams,
    last_delivered: Option<GeoSample>,
}

impl Subscriber {
    fn throttles(&self, sample: &GeoSample) -> bool {
        let Some(last) = &self.last_delivered else {
            return false;
        };
        let elapsed = sample
            .timestamp
            .signed_duration_since(last.timestamp)
            .to_std()
            .unwrap_or_default();
        elapsed < self.params.min_interval
            || last.distance_to(sample) < self.params.min_displacement_m
    }
}

struct FeedInner {
    subscriber: Mutex<Option<Subscriber>>,
    permission: watch::Sender<PermissionStatus>,
    pending_requests: AtomicUsize,
}

/// Counts one waiting permission request; released on answer or cancel.
struct PendingRequest<'a>(&'a AtomicUsize);

impl<'a> PendingRequest<'a> {
    fn register(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Channel-backed location source fed by the platform shell.
#[derive(Clone)]
pub struct LocationFeed {
    inner: Arc<FeedInner>,
}

impl Default for LocationFeed {
    fn default() -> Self {
        Self::new(PermissionStatus::Unknown)
    }
}

impl LocationFeed {
    pub fn new(permission: PermissionStatus) -> Self {
        let (permission, _) = watch::channel(permission);
        Self {
            inner: Arc::new(FeedInner {
                subscriber: Mutex::new(None),
                permission,
                pending_requests: AtomicUsize::new(0),
            }),
        }
    }

    /// Feed already holding a granted permission.
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted)
    }

    /// Push one fix from the platform.
    pub fn push(&self, sample: GeoSample) -> PushOutcome {
        let mut guard = self
            .inner
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(subscriber) = guard.as_mut() else {
            return PushOutcome::NoSubscriber;
        };
        if subscriber.tx.is_closed() {
            *guard = None;
            return PushOutcome::NoSubscriber;
        }
        if subscriber.throttles(&sample) {
            return PushOutcome::Throttled;
        }

        match subscriber.tx.try_send(sample) {
            Ok(()) => {
                subscriber.last_delivered = Some(sample);
                PushOutcome::Delivered
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Location subscriber is lagging, dropping fix");
                PushOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                *guard = None;
                PushOutcome::NoSubscriber
            }
        }
    }

    /// Record the platform's permission decision.
    pub fn set_permission(&self, granted: bool) {
        let status = if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        self.inner.permission.send_replace(status);
        tracing::info!(?status, "Location permission updated");
    }

    pub fn permission(&self) -> PermissionStatus {
        *self.inner.permission.borrow()
    }

    /// True while a permission request waits for the platform's answer.
    pub fn permission_requested(&self) -> bool {
        self.inner.pending_requests.load(Ordering::SeqCst) > 0
    }

    /// True while a live subscription is attached.
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|s| !s.tx.is_closed())
    }
}

impl LocationSource for LocationFeed {
    fn has_permission(&self) -> bool {
        self.permission() == PermissionStatus::Granted
    }

    async fn request_permission(&self) -> bool {
        let mut rx = self.inner.permission.subscribe();
        let current = *rx.borrow_and_update();
        if current == PermissionStatus::Granted {
            return true;
        }

        let _pending = PendingRequest::register(&self.inner.pending_requests);
        tracing::info!("Waiting for location permission decision");
        if rx.changed().await.is_err() {
            return false;
        }
        let decision = *rx.borrow_and_update();
        decision == PermissionStatus::Granted
    }

    fn subscribe(&self, params: LocationParams) -> LocationSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let previous = self
            .inner
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(Subscriber {
                tx,
                params,
                last_delivered: None,
            });
        if previous.is_some() {
            tracing::debug!("Replacing previous location subscription");
        }

        LocationSubscription::new(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|sample| (sample, rx))
        }))
    }
}
