//! Persistence abstraction for certificate designs.

mod autosave;
mod memory;

pub use autosave::{
    AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, SaveLedger, SaveOutcome, SaveTicket,
};
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Name given to designs created from scratch.
pub const UNTITLED_DESIGN_NAME: &str = "Untitled Certificate";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Design not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Save rejected: {0}")]
    Rejected(String),
    #[error("Autosave closed")]
    Closed,
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async operations (no `Send` bound, so it also fits
/// single-threaded runtimes).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A persisted certificate design. Fields are snake_case on the wire; the
/// camelCase spellings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Design {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    /// Scene JSON as produced by [`crate::bridge::serialize`].
    #[serde(default)]
    pub design: String,
    #[serde(default, alias = "archiveUrl", skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
    /// Server timestamp (ISO 8601) of the last write.
    #[serde(default, alias = "updatedAt")]
    pub updated_at: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Fields sent when creating or updating a design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub design: String,
}

impl DesignDraft {
    /// A brand new design with an empty scene.
    pub fn untitled(empty_scene: String) -> Self {
        Self {
            name: Some(UNTITLED_DESIGN_NAME.to_string()),
            design: empty_scene,
        }
    }

    /// An update carrying only the scene.
    pub fn scene(design: String) -> Self {
        Self { name: None, design }
    }
}

/// Whether a save was requested by the user or by the autosave timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Explicit,
    Autosave,
}

impl SaveMode {
    pub fn is_autosave(self) -> bool {
        self == SaveMode::Autosave
    }
}

/// Trait for design storage backends.
pub trait DesignStore: Send + Sync {
    /// Load a design by id.
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Design>>;

    /// Create a design and return it with its assigned id.
    fn create(&self, draft: &DesignDraft) -> BoxFuture<'_, StoreResult<Design>>;

    /// Overwrite a design's scene (and optionally its name).
    fn update(
        &self,
        id: &str,
        draft: &DesignDraft,
        mode: SaveMode,
    ) -> BoxFuture<'_, StoreResult<Design>>;

    /// Data columns referenced by the design's anchors, in server order.
    fn anchors(&self, id: &str) -> BoxFuture<'_, StoreResult<Vec<String>>>;
}
