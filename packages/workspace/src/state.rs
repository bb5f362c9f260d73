//! Per-list editing state
//!
//! `ListEditor` wires one [`EditSession`] to the observer hub and the autosave
//! scheduler: every accepted command is published to observers and scheduled
//! for saving as a single change.

use crate::autosave::{AutosaveScheduler, Notice, SaveOutcome, SchedulerStatus};
use crate::config::{ConfigError, EditorConfig};
use crate::gateway::{PersistenceError, PersistenceGateway};
use crate::hub::{ChangeObserverHub, ObserverId};
use parking_lot::{Mutex, ReentrantMutex};
use reclist_common::{IdentityError, IdentityProvider, ListId};
use reclist_editor::{Change, EditCommand, EditSession, EditorError, FocusTarget, ListDocument};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// One open list: session, observers and autosave
pub struct ListEditor {
    session: Mutex<EditSession>,
    /// Held from apply to publish so changes leave in version order.
    /// Reentrant for observers that dispatch from their callback.
    dispatching: ReentrantMutex<()>,
    observers: ChangeObserverHub,
    scheduler: AutosaveScheduler,
    gateway: Arc<dyn PersistenceGateway>,
    notices: broadcast::Sender<Notice>,
}

impl ListEditor {
    /// Start a new, unsaved list owned by the current user
    ///
    /// Must be called inside a tokio runtime.
    pub fn create<P>(
        identity: &P,
        gateway: Arc<dyn PersistenceGateway>,
        config: &EditorConfig,
    ) -> Result<Self, WorkspaceError>
    where
        P: IdentityProvider + ?Sized,
    {
        let document = ListDocument::create(identity)?;
        info!(list_id = %document.id(), creator = %document.creator_id(), "created list");
        Ok(Self::start(document, None, gateway, config))
    }

    /// Open a list that already exists in the backend
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(
        document: ListDocument,
        gateway: Arc<dyn PersistenceGateway>,
        config: &EditorConfig,
    ) -> Self {
        let remote_id = Some(document.id());
        debug!(list_id = %document.id(), "opened list");
        Self::start(document, remote_id, gateway, config)
    }

    fn start(
        document: ListDocument,
        remote_id: Option<ListId>,
        gateway: Arc<dyn PersistenceGateway>,
        config: &EditorConfig,
    ) -> Self {
        let (notices, _) = broadcast::channel(config.notice_capacity.max(1));
        let scheduler = AutosaveScheduler::spawn(
            document.id(),
            remote_id,
            Arc::clone(&gateway),
            config.debounce(),
            notices.clone(),
        );

        Self {
            session: Mutex::new(EditSession::new(document)),
            dispatching: ReentrantMutex::new(()),
            observers: ChangeObserverHub::new(),
            scheduler,
            gateway,
            notices,
        }
    }

    pub fn id(&self) -> ListId {
        self.session.lock().document().id()
    }

    pub fn document(&self) -> Arc<ListDocument> {
        Arc::clone(self.session.lock().document())
    }

    pub fn focus(&self) -> FocusTarget {
        self.session.lock().focus()
    }

    pub fn version(&self) -> u64 {
        self.session.lock().version()
    }

    /// Current state, for views mounting late
    pub fn snapshot(&self) -> Change {
        self.session.lock().snapshot()
    }

    pub fn observers(&self) -> &ChangeObserverHub {
        &self.observers
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    /// Apply a command from the view registered as `source`
    ///
    /// A refused command publishes nothing and schedules nothing.
    pub fn dispatch(
        &self,
        command: &EditCommand,
        source: Option<&ObserverId>,
    ) -> Result<Change, WorkspaceError> {
        let _dispatching = self.dispatching.lock();
        let change = self.session.lock().apply(command)?;

        self.scheduler.schedule(&change);
        let notified = self.observers.publish(&change, source);
        debug!(
            list_id = %change.document.id(),
            version = change.version,
            notified,
            "change published"
        );

        Ok(change)
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Notices as a stream; notices missed by a lagging reader are dropped
    pub fn notices(&self) -> impl Stream<Item = Notice> {
        BroadcastStream::new(self.notices.subscribe()).filter_map(Result::ok)
    }

    /// Persist the latest snapshot immediately
    pub async fn save_now(&self) -> Result<SaveOutcome, WorkspaceError> {
        Ok(self.scheduler.save_now().await?)
    }

    /// Save whatever is pending, then stop autosaving
    pub async fn close(self) -> Result<SaveOutcome, WorkspaceError> {
        let outcome = self.scheduler.save_now().await;
        self.scheduler.close().await;
        info!(list_id = %self.id(), "closed list");
        Ok(outcome?)
    }

    /// Cancel pending saves and remove the list from the backend
    pub async fn delete(self) -> Result<(), WorkspaceError> {
        let list_id = self.id();
        match self.scheduler.close().await {
            Some(remote_id) => {
                self.gateway.delete_document(remote_id).await?;
                info!(list_id = %list_id, "deleted list");
            }
            None => debug!(list_id = %list_id, "list was never saved, nothing to delete"),
        }
        Ok(())
    }
}
