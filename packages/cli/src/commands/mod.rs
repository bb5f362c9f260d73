pub mod delete;
pub mod edit;
pub mod new;
pub mod show;

pub use delete::{delete, DeleteArgs};
pub use edit::{edit, EditArgs};
pub use new::{new, NewArgs};
pub use show::{show, ShowArgs};

use reclist_workspace::{EditorConfig, FileGateway};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub store: PathBuf,
    pub config: EditorConfig,
}

impl Context {
    pub fn new(store: PathBuf, config: EditorConfig) -> Self {
        Self { store, config }
    }

    pub fn gateway(&self) -> Arc<FileGateway> {
        Arc::new(FileGateway::new(self.store.clone()))
    }
}
