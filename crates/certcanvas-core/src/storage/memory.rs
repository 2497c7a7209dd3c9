//! In-memory design store.

use super::{BoxFuture, Design, DesignDraft, DesignStore, SaveMode, StoreError, StoreResult};
use crate::binding::anchor_columns;
use crate::bridge::parse_scene;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory store for tests and offline use.
///
/// Timestamps come from a logical clock, zero-padded so they order
/// lexicographically like ISO 8601 strings.
#[derive(Default)]
pub struct MemoryStore {
    designs: RwLock<HashMap<String, Design>>,
    saves: RwLock<Vec<(String, SaveMode)>>,
    clock: AtomicU64,
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Other(format!("Lock error: {}", e))
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp(&self) -> String {
        format!("{:020}", self.clock.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Every update received so far, oldest first.
    pub fn save_log(&self) -> Vec<(String, SaveMode)> {
        self.saves
            .read()
            .map(|saves| saves.clone())
            .unwrap_or_default()
    }

    /// Insert a design directly, bypassing `create`.
    pub fn insert(&self, design: Design) -> StoreResult<()> {
        let mut designs = self.designs.write().map_err(lock_error)?;
        designs.insert(design.id.clone(), design);
        Ok(())
    }
}

impl DesignStore for MemoryStore {
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Design>> {
        let id = id.to_string();
        Box::pin(async move {
            let designs = self.designs.read().map_err(lock_error)?;
            designs
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id))
        })
    }

    fn create(&self, draft: &DesignDraft) -> BoxFuture<'_, StoreResult<Design>> {
        let draft = draft.clone();
        Box::pin(async move {
            let stamp = self.stamp();
            let design = Design {
                id: format!("design-{}", uuid::Uuid::new_v4().simple()),
                name: draft.name.unwrap_or_default(),
                design: draft.design,
                archive_url: None,
                updated_at: stamp.clone(),
                created_at: Some(stamp),
            };
            let mut designs = self.designs.write().map_err(lock_error)?;
            designs.insert(design.id.clone(), design.clone());
            Ok(design)
        })
    }

    fn update(
        &self,
        id: &str,
        draft: &DesignDraft,
        mode: SaveMode,
    ) -> BoxFuture<'_, StoreResult<Design>> {
        let id = id.to_string();
        let draft = draft.clone();
        Box::pin(async move {
            let stamp = self.stamp();
            let mut designs = self.designs.write().map_err(lock_error)?;
            let design = designs
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if let Some(name) = draft.name {
                design.name = name;
            }
            design.design = draft.design;
            design.updated_at = stamp;
            let updated = design.clone();
            drop(designs);

            self.saves.write().map_err(lock_error)?.push((id, mode));
            Ok(updated)
        })
    }

    fn anchors(&self, id: &str) -> BoxFuture<'_, StoreResult<Vec<String>>> {
        let id = id.to_string();
        Box::pin(async move {
            let json = {
                let designs = self.designs.read().map_err(lock_error)?;
                designs
                    .get(&id)
                    .map(|d| d.design.clone())
                    .ok_or_else(|| StoreError::NotFound(id))?
            };
            let parsed =
                parse_scene(&json).map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(anchor_columns(&parsed.scene))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::block_on;

    #[test]
    fn test_create_and_fetch() {
        let store = MemoryStore::new();
        let created = block_on(store.create(&DesignDraft::untitled("{}".into()))).unwrap();
        let fetched = block_on(store.fetch(&created.id)).unwrap();

        assert_eq!(fetched.name, "Untitled Certificate");
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.fetch("nonexistent"));

        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_advances_timestamp_and_logs_mode() {
        let store = MemoryStore::new();
        let created = block_on(store.create(&DesignDraft::untitled("{}".into()))).unwrap();
        let updated = block_on(store.update(
            &created.id,
            &DesignDraft::scene(r#"{"objects":[]}"#.into()),
            SaveMode::Autosave,
        ))
        .unwrap();

        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.name, "Untitled Certificate");
        assert_eq!(store.save_log(), vec![(created.id, SaveMode::Autosave)]);
    }

    #[test]
    fn test_update_missing_design() {
        let store = MemoryStore::new();
        let result = block_on(store.update(
            "ghost",
            &DesignDraft::scene(String::new()),
            SaveMode::Explicit,
        ));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.save_log().is_empty());
    }

    #[test]
    fn test_anchors_from_scene() {
        let store = MemoryStore::new();
        let json = r#"{"version":"5.3.0","objects":[
            {"type":"group","id":"PLACEHOLDER-name","isAnchor":true,"objects":[]},
            {"type":"textbox","id":"PLACEHOLDER-course","isAnchor":true,"text":"x"},
            {"type":"rect","id":"rect-1"}
        ]}"#;
        let created = block_on(store.create(&DesignDraft::scene(json.into()))).unwrap();
        let anchors = block_on(store.anchors(&created.id)).unwrap();
        assert_eq!(anchors, vec!["name".to_string(), "course".to_string()]);
    }
}
