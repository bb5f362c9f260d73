//! # Autosave Scheduler
//!
//! Debounces published list snapshots into persistence calls.
//!
//! Every transition (re)arms a deadline `debounce` after it arrived, so a burst
//! of edits collapses into one save of the latest snapshot. At most one save
//! is in flight at a time. A transition arriving while a save is in flight
//! queues exactly one follow-up save.
//!
//! ```text
//!            schedule                 deadline
//!   Idle ───────────────▶ Pending ───────────────▶ Saving
//!    ▲                     │  ▲                     │   │
//!    │                     └──┘ schedule            │   │ schedule
//!    │                                              │   ▼
//!    └──────────── save done ─────────────── SavingWithPendingFollowUp
//!                                  (follow-up → Pending)
//! ```
//!
//! A background task owns the timer; `save_now` runs in the caller's task.
//! Both take the same in-flight lock before talking to the gateway.

use crate::gateway::{PersistenceGateway, PersistenceResult};
use crate::wire::ListPayload;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reclist_common::ListId;
use reclist_editor::{Change, ListDocument};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Idle,
    Pending { deadline: Instant },
    Saving,
    SavingWithPendingFollowUp { deadline: Instant },
    Closed,
}

/// Transient notifications for the view layer
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Saved {
        list_id: ListId,
        version: u64,
        at: DateTime<Utc>,
    },
    SaveFailed {
        list_id: ListId,
        message: String,
    },
}

/// What a save attempt ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(ListId),
    Updated,
    /// The list is still the untouched placeholder
    SkippedPlaceholder,
    /// The latest snapshot was already stored
    Unchanged,
    /// Nothing has been published yet
    Empty,
    Closed,
}

#[derive(Clone)]
struct Snapshot {
    version: u64,
    document: Arc<ListDocument>,
}

struct SchedulerState {
    status: SchedulerStatus,
    latest: Option<Snapshot>,
    /// Id the backend stores the list under, once created
    remote_id: Option<ListId>,
    saved_version: Option<u64>,
}

struct Shared {
    list_id: ListId,
    debounce: Duration,
    gateway: Arc<dyn PersistenceGateway>,
    notices: broadcast::Sender<Notice>,
    state: Mutex<SchedulerState>,
    wake: Notify,
    in_flight: tokio::sync::Mutex<()>,
}

/// Debounced autosave for one list
pub struct AutosaveScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    /// Start the scheduler. Must be called inside a tokio runtime.
    ///
    /// `remote_id` is `Some` when the list already exists in the backend.
    pub fn spawn(
        list_id: ListId,
        remote_id: Option<ListId>,
        gateway: Arc<dyn PersistenceGateway>,
        debounce: Duration,
        notices: broadcast::Sender<Notice>,
    ) -> Self {
        let shared = Arc::new(Shared {
            list_id,
            debounce,
            gateway,
            notices,
            state: Mutex::new(SchedulerState {
                status: SchedulerStatus::Idle,
                latest: None,
                remote_id,
                saved_version: None,
            }),
            wake: Notify::new(),
            in_flight: tokio::sync::Mutex::new(()),
        });

        let worker = tokio::spawn(run(Arc::clone(&shared)));

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.shared.state.lock().status
    }

    /// Id the list is stored under, if it has been created
    pub fn remote_id(&self) -> Option<ListId> {
        self.shared.state.lock().remote_id
    }

    /// Record a published change and (re)arm the debounce deadline
    ///
    /// A change older than the latest recorded one is ignored.
    pub fn schedule(&self, change: &Change) {
        let deadline = Instant::now() + self.shared.debounce;
        let mut state = self.shared.state.lock();

        if let Some(latest) = &state.latest {
            if change.version <= latest.version {
                debug!(
                    list_id = %self.shared.list_id,
                    version = change.version,
                    latest = latest.version,
                    "stale change not scheduled"
                );
                return;
            }
        }

        state.status = match state.status {
            SchedulerStatus::Closed => {
                debug!(list_id = %self.shared.list_id, "scheduler closed, change not scheduled");
                return;
            }
            SchedulerStatus::Idle => SchedulerStatus::Pending { deadline },
            SchedulerStatus::Pending { .. } => {
                debug!(list_id = %self.shared.list_id, version = change.version, "pending save superseded");
                SchedulerStatus::Pending { deadline }
            }
            SchedulerStatus::Saving | SchedulerStatus::SavingWithPendingFollowUp { .. } => {
                debug!(list_id = %self.shared.list_id, version = change.version, "follow-up save queued");
                SchedulerStatus::SavingWithPendingFollowUp { deadline }
            }
        };
        state.latest = Some(Snapshot {
            version: change.version,
            document: Arc::clone(&change.document),
        });
        drop(state);

        debug!(list_id = %self.shared.list_id, version = change.version, "save scheduled");
        self.shared.wake.notify_one();
    }

    /// Cancel any pending deadline and persist the latest snapshot now
    pub async fn save_now(&self) -> PersistenceResult<SaveOutcome> {
        self.shared.save_now().await
    }

    /// Stop scheduling saves
    ///
    /// Waits for an in-flight save to finish and returns the id the list is
    /// stored under, if any.
    pub async fn close(&self) -> Option<ListId> {
        {
            let mut state = self.shared.state.lock();
            state.status = SchedulerStatus::Closed;
            state.latest = None;
        }
        self.shared.wake.notify_one();

        drop(self.shared.in_flight.lock().await);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(list_id = %self.shared.list_id, error = %e, "autosave worker failed");
            }
        }

        debug!(list_id = %self.shared.list_id, "scheduler closed");
        self.shared.state.lock().remote_id
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.abort();
        }
    }
}

async fn run(shared: Arc<Shared>) {
    loop {
        let status = shared.state.lock().status;

        match status {
            SchedulerStatus::Closed => return,
            SchedulerStatus::Pending { deadline } => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        if let Err(e) = shared.save_due().await {
                            debug!(list_id = %shared.list_id, error = %e, "timed save failed");
                        }
                    }
                    _ = shared.wake.notified() => {}
                }
            }
            _ => shared.wake.notified().await,
        }
    }
}

impl Shared {
    /// Save now, whatever the deadline
    async fn save_now(&self) -> PersistenceResult<SaveOutcome> {
        let _in_flight = self.in_flight.lock().await;

        let job = {
            let mut state = self.state.lock();
            if state.status == SchedulerStatus::Closed {
                return Ok(SaveOutcome::Closed);
            }
            state.status = SchedulerStatus::Saving;
            state.latest.clone()
        };

        self.finish(job).await
    }

    /// Save only if a pending deadline has passed. `None` means nothing was due.
    async fn save_due(&self) -> PersistenceResult<Option<SaveOutcome>> {
        let _in_flight = self.in_flight.lock().await;

        let job = {
            let mut state = self.state.lock();
            match state.status {
                SchedulerStatus::Pending { deadline } if deadline <= Instant::now() => {}
                _ => return Ok(None),
            }
            state.status = SchedulerStatus::Saving;
            state.latest.clone()
        };

        self.finish(job).await.map(Some)
    }

    /// Persist a claimed job and leave the `Saving` state. Caller holds the
    /// in-flight lock.
    async fn finish(&self, job: Option<Snapshot>) -> PersistenceResult<SaveOutcome> {
        let result = match job {
            Some(job) => self.persist(job).await,
            None => Ok(SaveOutcome::Empty),
        };

        {
            let mut state = self.state.lock();
            state.status = match state.status {
                SchedulerStatus::SavingWithPendingFollowUp { deadline } => SchedulerStatus::Pending { deadline },
                SchedulerStatus::Closed => SchedulerStatus::Closed,
                _ => SchedulerStatus::Idle,
            };
        }
        self.wake.notify_one();

        result
    }

    async fn persist(&self, job: Snapshot) -> PersistenceResult<SaveOutcome> {
        if job.document.is_placeholder() {
            debug!(list_id = %self.list_id, version = job.version, "skipping save of placeholder list");
            return Ok(SaveOutcome::SkippedPlaceholder);
        }

        let remote_id = {
            let state = self.state.lock();
            if state.saved_version == Some(job.version) {
                debug!(list_id = %self.list_id, version = job.version, "latest snapshot already saved");
                return Ok(SaveOutcome::Unchanged);
            }
            state.remote_id
        };

        let mut payload = ListPayload::from(job.document.as_ref());
        debug!(list_id = %self.list_id, version = job.version, "saving list");

        let result = match remote_id {
            Some(remote_id) => {
                payload.id = remote_id;
                self.gateway
                    .update_document(&payload)
                    .await
                    .map(|_| SaveOutcome::Updated)
            }
            None => self
                .gateway
                .create_document(&payload)
                .await
                .map(SaveOutcome::Created),
        };

        match &result {
            Ok(outcome) => {
                {
                    let mut state = self.state.lock();
                    state.saved_version = Some(job.version);
                    if let SaveOutcome::Created(remote_id) = outcome {
                        state.remote_id = Some(*remote_id);
                    }
                }
                info!(list_id = %self.list_id, version = job.version, ?outcome, "list saved");
                let _ = self.notices.send(Notice::Saved {
                    list_id: self.list_id,
                    version: job.version,
                    at: Utc::now(),
                });
            }
            Err(e) => {
                warn!(list_id = %self.list_id, version = job.version, error = %e, "save failed");
                let _ = self.notices.send(Notice::SaveFailed {
                    list_id: self.list_id,
                    message: e.to_string(),
                });
            }
        }

        result
    }
}
