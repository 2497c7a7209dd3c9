//! Image asset resolution and load sequencing.

use crate::shapes::ImageAsset;
use crate::storage::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Image loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Failed to fetch image {src}: {reason}")]
    Fetch { src: String, reason: String },
    #[error("Failed to decode image {src}: {reason}")]
    Decode { src: String, reason: String },
}

/// Resolves image sources (URLs or data URLs) to decoded assets.
pub trait AssetLoader: Send + Sync {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<ImageAsset, AssetError>>;
}

/// In-memory asset table, for tests and for hosts that preload images.
#[derive(Debug, Default, Clone)]
pub struct AssetCache {
    assets: HashMap<String, ImageAsset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: ImageAsset) {
        self.assets.insert(asset.src.clone(), asset);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, src: &str, width: u32, height: u32) -> Self {
        self.insert(ImageAsset::new(src, width, height));
        self
    }
}

impl AssetLoader for AssetCache {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<ImageAsset, AssetError>> {
        Box::pin(async move {
            self.assets
                .get(src)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(src.to_string()))
        })
    }
}

/// Generation ticket for one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Single-flight guard for scene loads.
///
/// Every load takes a ticket; only the result of the newest ticket may be
/// applied. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct LoadGate {
    latest: Arc<AtomicU64>,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load, superseding all earlier ones.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` still belongs to the newest load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate any load in flight.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
