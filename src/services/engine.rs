// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording engine actor.
//!
//! One task owns the `Recorder` and is the only writer to the session.
//! Commands, location fixes, ticker ticks and upload outcomes are all
//! serialized through its loop. Renderers read a `watch` view that is
//! refreshed after every accepted sample, tick and transition.
//!
//! The location subscription and the ticker exist only while recording;
//! pause, discard and shutdown drop both. Uploads run on their own tasks
//! so a slow API never stalls the next session.

use crate::config::RecorderSettings;
use crate::error::{RecorderError, Result};
use crate::models::{CreateActivityRequest, FinishRequest, GeoSample, RecorderView};
use crate::services::location::{LocationSource, LocationSubscription};
use crate::services::recorder::{FinishedSession, Recorder, SampleOutcome};
use crate::services::upload::{upload_activity, ActivityApi};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

const COMMAND_BUFFER: usize = 32;

enum Command {
    Start {
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    Discard {
        reply: oneshot::Sender<()>,
    },
    Finish {
        details: FinishRequest,
        reply: oneshot::Sender<Result<u64>>,
    },
    RetryUnsent {
        reply: oneshot::Sender<usize>,
    },
    RequestPermission {
        reply: oneshot::Sender<PermissionOutcome>,
    },
    Shutdown,
}

/// How a permission request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// No answer within the permission timeout; the request was withdrawn.
    TimedOut,
}

/// A finalized session on its way to the API.
struct PendingUpload {
    request: CreateActivityRequest,
    finished: FinishedSession,
}

struct UploadOutcome {
    pending: PendingUpload,
    result: Result<u64>,
    reply: Option<oneshot::Sender<Result<u64>>>,
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct RecorderHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<RecorderView>,
}

impl RecorderHandle {
    /// Spawn the engine on the current tokio runtime.
    pub fn spawn<L: LocationSource, A: ActivityApi>(
        settings: RecorderSettings,
        owner_id: u64,
        source: Arc<L>,
        api: Arc<A>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (uploads_tx, uploads_rx) = mpsc::unbounded_channel();
        let recorder = Recorder::new(&settings);
        let (view_tx, view_rx) = watch::channel(recorder.view(0));

        let engine = Engine {
            recorder,
            settings,
            owner_id,
            source,
            api,
            commands: commands_rx,
            uploads_tx,
            uploads: uploads_rx,
            subscription: None,
            ticker: None,
            view: view_tx,
            unsent: Vec::new(),
        };
        tokio::spawn(engine.run());

        Self {
            commands: commands_tx,
            view: view_rx,
        }
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| RecorderError::EngineStopped)?;
        rx.await.map_err(|_| RecorderError::EngineStopped)
    }

    pub async fn start(&self) -> Result<()> {
        self.call(|reply| Command::Start { reply }).await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.call(|reply| Command::Pause { reply }).await?
    }

    pub async fn resume(&self) -> Result<()> {
        self.call(|reply| Command::Resume { reply }).await?
    }

    pub async fn discard(&self) -> Result<()> {
        self.call(|reply| Command::Discard { reply }).await
    }

    /// Finalize the paused session and upload it. Resolves once the upload
    /// has succeeded or failed; on failure the session is back in `Paused`.
    pub async fn finish(&self, details: FinishRequest) -> Result<u64> {
        self.call(|reply| Command::Finish { details, reply }).await?
    }

    /// Re-queue uploads that failed while a newer session was live.
    pub async fn retry_unsent(&self) -> Result<usize> {
        self.call(|reply| Command::RetryUnsent { reply }).await
    }

    /// Ask the source for permission, giving up after the configured timeout.
    pub async fn request_permission(&self) -> Result<PermissionOutcome> {
        self.call(|reply| Command::RequestPermission { reply }).await
    }

    /// Stop the engine, its location subscription and its ticker.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Latest published view.
    pub fn view(&self) -> RecorderView {
        self.view.borrow().clone()
    }

    /// Receiver that is notified on every view update.
    pub fn watch(&self) -> watch::Receiver<RecorderView> {
        self.view.clone()
    }
}

struct Engine<L, A> {
    recorder: Recorder,
    settings: RecorderSettings,
    owner_id: u64,
    source: Arc<L>,
    api: Arc<A>,
    commands: mpsc::Receiver<Command>,
    uploads_tx: mpsc::UnboundedSender<UploadOutcome>,
    uploads: mpsc::UnboundedReceiver<UploadOutcome>,
    subscription: Option<LocationSubscription>,
    ticker: Option<Interval>,
    view: watch::Sender<RecorderView>,
    unsent: Vec<PendingUpload>,
}

async fn next_sample(subscription: &mut Option<LocationSubscription>) -> Option<GeoSample> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl<L: LocationSource, A: ActivityApi> Engine<L, A> {
    async fn run(mut self) {
        tracing::info!("Recorder engine started");
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(outcome) = self.uploads.recv() => self.on_upload_finished(outcome),
                sample = next_sample(&mut self.subscription), if self.subscription.is_some() => {
                    match sample {
                        Some(sample) => self.on_sample(sample),
                        None => {
                            tracing::warn!("Location feed closed by source");
                            self.subscription = None;
                        }
                    }
                }
                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => self.on_tick(),
            }
        }

        self.stop_feeds();
        if !self.unsent.is_empty() {
            tracing::error!(count = self.unsent.len(), "Engine stopped with unsent activities");
        }
        tracing::info!("Recorder engine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self
                    .recorder
                    .start(self.source.has_permission(), Instant::now());
                if result.is_ok() {
                    self.start_feeds();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                let result = self.recorder.pause(Instant::now());
                if result.is_ok() {
                    self.stop_feeds();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Resume { reply } => {
                let result = self.recorder.resume(Instant::now());
                if result.is_ok() {
                    self.start_feeds();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Discard { reply } => {
                self.stop_feeds();
                self.recorder.discard();
                self.publish();
                let _ = reply.send(());
            }
            Command::Finish { details, reply } => match self.recorder.finish() {
                Ok(finished) => {
                    let request = CreateActivityRequest::from_summary(
                        self.owner_id,
                        &details,
                        &finished.summary,
                    );
                    self.publish();
                    self.spawn_upload(PendingUpload { request, finished }, Some(reply));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Command::RetryUnsent { reply } => {
                let pending: Vec<_> = self.unsent.drain(..).collect();
                let count = pending.len();
                for upload in pending {
                    self.spawn_upload(upload, None);
                }
                if count > 0 {
                    tracing::info!(count, "Retrying unsent activities");
                }
                self.publish();
                let _ = reply.send(count);
            }
            Command::RequestPermission { reply } => {
                let source = Arc::clone(&self.source);
                let timeout = self.settings.permission_timeout;
                tokio::spawn(async move {
                    let outcome =
                        match tokio::time::timeout(timeout, source.request_permission()).await {
                            Ok(true) => PermissionOutcome::Granted,
                            Ok(false) => PermissionOutcome::Denied,
                            Err(_) => {
                                tracing::info!(?timeout, "Permission request timed out");
                                PermissionOutcome::TimedOut
                            }
                        };
                    let _ = reply.send(outcome);
                });
            }
            Command::Shutdown => {}
        }
    }

    fn on_sample(&mut self, sample: GeoSample) {
        if let SampleOutcome::Accepted(_) = self.recorder.on_sample(sample) {
            self.publish();
        }
    }

    fn on_tick(&mut self) {
        if self.recorder.tick(Instant::now()) {
            self.publish();
        }
    }

    fn spawn_upload(&self, pending: PendingUpload, reply: Option<oneshot::Sender<Result<u64>>>) {
        let api = Arc::clone(&self.api);
        let outcomes = self.uploads_tx.clone();
        tokio::spawn(async move {
            let result = upload_activity(api.as_ref(), &pending.request, &pending.finished.summary).await;
            let _ = outcomes.send(UploadOutcome {
                pending,
                result,
                reply,
            });
        });
    }

    fn on_upload_finished(&mut self, outcome: UploadOutcome) {
        let UploadOutcome {
            mut pending,
            result,
            reply,
        } = outcome;

        match &result {
            Ok(activity_id) => {
                tracing::info!(activity_id, "Activity uploaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Activity upload failed");
                if e.is_partial_upload() {
                    tracing::warn!("Retrying will create another activity record");
                }
                match self.recorder.restore(pending.finished.session) {
                    Ok(()) => {}
                    Err(session) => {
                        tracing::warn!("New session in progress, keeping failed upload for retry");
                        pending.finished.session = session;
                        self.unsent.push(pending);
                    }
                }
                self.publish();
            }
        }

        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }

    fn start_feeds(&mut self) {
        self.subscription = Some(self.source.subscribe(self.settings.location));

        let period = self.settings.tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    fn stop_feeds(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.ticker = None;
    }

    fn publish(&self) {
        self.view
            .send_replace(self.recorder.view(self.unsent.len()));
    }
}
