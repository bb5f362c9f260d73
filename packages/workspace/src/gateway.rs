//! Persistence boundary
//!
//! Defines the abstract interface the autosave scheduler writes through.
//! Implementations can be remote services, files, in-memory, etc.

use crate::wire::ListPayload;
use async_trait::async_trait;
use parking_lot::Mutex;
use reclist_common::ListId;
use reclist_editor::{ListDocument, StructuralError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("List not found: {0}")]
    NotFound(ListId),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored list is invalid: {0}")]
    Corrupt(#[from] StructuralError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage for lists
///
/// Failures are always returned as `PersistenceError`; the in-memory
/// document stays the source of truth.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store a new list, returning the id the backend knows it by
    async fn create_document(&self, payload: &ListPayload) -> PersistenceResult<ListId>;

    /// Overwrite a stored list. Idempotent for identical payloads.
    async fn update_document(&self, payload: &ListPayload) -> PersistenceResult<()>;

    async fn delete_document(&self, id: ListId) -> PersistenceResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Create,
    Update,
    Delete,
}

/// One recorded gateway call
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub kind: CallKind,
    pub list_id: ListId,
    pub at: Instant,
    pub payload: Option<ListPayload>,
}

#[derive(Default)]
struct MemoryState {
    lists: HashMap<ListId, ListPayload>,
    calls: Vec<GatewayCall>,
    fail_next: usize,
}

/// Gateway keeping lists in memory and recording every call
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` after recording it
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::default(),
            latency: Some(latency),
        }
    }

    /// Make the next `count` calls fail with `Unavailable`
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.state.lock().calls.iter().filter(|c| c.kind == kind).count()
    }

    pub fn stored(&self, id: ListId) -> Option<ListPayload> {
        self.state.lock().lists.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the call and decide whether it fails
    async fn begin(&self, kind: CallKind, list_id: ListId, payload: Option<&ListPayload>) -> PersistenceResult<()> {
        let fail = {
            let mut state = self.state.lock();
            state.calls.push(GatewayCall {
                kind,
                list_id,
                at: Instant::now(),
                payload: payload.cloned(),
            });
            if state.fail_next > 0 {
                state.fail_next -= 1;
                true
            } else {
                false
            }
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if fail {
            Err(PersistenceError::Unavailable(format!("{:?} {} failed", kind, list_id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_document(&self, payload: &ListPayload) -> PersistenceResult<ListId> {
        self.begin(CallKind::Create, payload.id, Some(payload)).await?;
        self.state.lock().lists.insert(payload.id, payload.clone());
        Ok(payload.id)
    }

    async fn update_document(&self, payload: &ListPayload) -> PersistenceResult<()> {
        self.begin(CallKind::Update, payload.id, Some(payload)).await?;
        let mut state = self.state.lock();
        match state.lists.get_mut(&payload.id) {
            Some(stored) => {
                *stored = payload.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(payload.id)),
        }
    }

    async fn delete_document(&self, id: ListId) -> PersistenceResult<()> {
        self.begin(CallKind::Delete, id, None).await?;
        match self.state.lock().lists.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PersistenceError::NotFound(id)),
        }
    }
}

/// Gateway storing each list as `<dir>/<list-id>.json`
#[derive(Debug, Clone)]
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: ListId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Read a stored list back into the model
    pub async fn load(&self, id: ListId) -> PersistenceResult<ListDocument> {
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };

        let payload: ListPayload = serde_json::from_str(&content)?;
        Ok(payload.into_document()?)
    }

    async fn write(&self, payload: &ListPayload) -> PersistenceResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(payload.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(payload)?;

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(list_id = %payload.id, path = %path.display(), "wrote list");
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn create_document(&self, payload: &ListPayload) -> PersistenceResult<ListId> {
        self.write(payload).await?;
        Ok(payload.id)
    }

    async fn update_document(&self, payload: &ListPayload) -> PersistenceResult<()> {
        if !tokio::fs::try_exists(self.path_for(payload.id)).await? {
            return Err(PersistenceError::NotFound(payload.id));
        }
        self.write(payload).await
    }

    async fn delete_document(&self, id: ListId) -> PersistenceResult<()> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PersistenceError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}
