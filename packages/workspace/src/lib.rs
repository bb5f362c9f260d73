//! # Reclist Workspace
//!
//! Asynchronous side of list editing: persistence gateways, the debounced
//! autosave scheduler, change fan-out to views, and the `ListEditor` that
//! ties them to an [`EditSession`](reclist_editor::EditSession).

pub mod autosave;
pub mod config;
pub mod gateway;
pub mod hub;
pub mod state;
pub mod wire;

pub use autosave::{AutosaveScheduler, Notice, SaveOutcome, SchedulerStatus};
pub use config::{ConfigError, EditorConfig, DEFAULT_CONFIG_NAME};
pub use gateway::{
    CallKind, FileGateway, GatewayCall, InMemoryGateway, PersistenceError, PersistenceGateway,
    PersistenceResult,
};
pub use hub::{ChangeObserverHub, ObserverCallback, ObserverId};
pub use state::{ListEditor, WorkspaceError};
pub use wire::{ItemPayload, ListPayload, SectionPayload};
