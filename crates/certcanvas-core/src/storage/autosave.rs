//! Auto-save and save ordering for the open design.

use super::{Design, DesignDraft, DesignStore, SaveMode, StoreError, StoreResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Revision number attached to an outgoing save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SaveTicket(u64);

impl SaveTicket {
    pub fn revision(self) -> u64 {
        self.0
    }
}

/// Orders save responses for one design.
///
/// Each save takes a ticket. A response is applied only if it is newer than
/// the last applied one: a lower revision, or a server timestamp older than
/// the applied one, marks it stale.
#[derive(Debug, Default)]
pub struct SaveLedger {
    issued: u64,
    applied: Option<(SaveTicket, String)>,
}

impl SaveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next revision.
    pub fn issue(&mut self) -> SaveTicket {
        self.issued += 1;
        SaveTicket(self.issued)
    }

    /// Record a response. Returns false when it is stale and must be dropped.
    pub fn accept(&mut self, ticket: SaveTicket, updated_at: &str) -> bool {
        if let Some((applied, applied_at)) = &self.applied {
            let older_stamp =
                !updated_at.is_empty() && !applied_at.is_empty() && updated_at < applied_at.as_str();
            if ticket < *applied || older_stamp {
                log::debug!(
                    "Discarding stale save response (revision {}, newest {})",
                    ticket.0,
                    applied.0
                );
                return false;
            }
        }
        self.applied = Some((ticket, updated_at.to_string()));
        true
    }

    /// Revision of the newest applied response.
    pub fn applied_revision(&self) -> Option<u64> {
        self.applied.as_ref().map(|(ticket, _)| ticket.0)
    }
}

/// Result of a completed save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The response is the newest known state.
    Applied(Design),
    /// A newer response was already applied; this one was dropped.
    Stale,
}

/// Manages periodic persistence of one open design.
pub struct AutoSaveManager<S: DesignStore> {
    /// Storage backend.
    store: Arc<S>,
    /// Auto-save interval.
    interval: Duration,
    /// Last save timestamp.
    last_save: Option<Instant>,
    /// Whether the scene has unsaved changes.
    dirty: bool,
    /// Design being edited.
    design_id: Option<String>,
    ledger: SaveLedger,
    closed: bool,
}

impl<S: DesignStore> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            design_id: None,
            ledger: SaveLedger::new(),
            closed: false,
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the scene as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the scene has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bind to a design. Resets the timer as a fresh load does.
    pub fn set_design_id(&mut self, id: Option<String>) {
        self.design_id = id;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        self.ledger = SaveLedger::new();
    }

    /// Get the current design id.
    pub fn design_id(&self) -> Option<&str> {
        self.design_id.as_deref()
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if self.closed || !self.dirty || self.design_id.is_none() {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if dirty and the interval has elapsed.
    /// Returns `None` when no save was due.
    pub async fn maybe_save(&mut self, scene_json: &str) -> StoreResult<Option<SaveOutcome>> {
        if !self.should_save() {
            return Ok(None);
        }
        self.save(scene_json, SaveMode::Autosave).await.map(Some)
    }

    /// Save immediately.
    pub async fn save(&mut self, scene_json: &str, mode: SaveMode) -> StoreResult<SaveOutcome> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        let id = self
            .design_id
            .clone()
            .ok_or_else(|| StoreError::Other("No design is open".to_string()))?;

        let ticket = self.ledger.issue();
        let draft = DesignDraft::scene(scene_json.to_string());
        let design = self.store.update(&id, &draft, mode).await?;

        self.last_save = Some(Instant::now());
        self.dirty = false;

        if self.ledger.accept(ticket, &design.updated_at) {
            if mode.is_autosave() {
                log::info!("Autosaved design {id}");
            }
            Ok(SaveOutcome::Applied(design))
        } else {
            Ok(SaveOutcome::Stale)
        }
    }

    /// Stop all further saves.
    pub fn close(&mut self) {
        self.closed = true;
        self.dirty = false;
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_util::block_on;

    fn manager_with_design() -> (AutoSaveManager<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let design = block_on(store.create(&DesignDraft::untitled("{}".into()))).unwrap();
        let mut manager = AutoSaveManager::new(store);
        manager.set_design_id(Some(design.id.clone()));
        (manager, design.id)
    }

    #[test]
    fn test_autosave_manager_creation() {
        let store = Arc::new(MemoryStore::new());
        let manager = AutoSaveManager::new(store);

        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert_eq!(
            manager.interval(),
            Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_interval_gates_autosave() {
        let (mut manager, _) = manager_with_design();
        manager.mark_dirty();
        assert!(!manager.should_save());

        manager.set_interval(Duration::ZERO);
        assert!(manager.should_save());
    }

    #[test]
    fn test_autosave_sends_flag_and_clears_dirty() {
        let (mut manager, id) = manager_with_design();
        manager.set_interval(Duration::ZERO);
        manager.mark_dirty();

        let outcome = block_on(manager.maybe_save(r#"{"objects":[]}"#)).unwrap();
        assert!(matches!(outcome, Some(SaveOutcome::Applied(_))));
        assert!(!manager.is_dirty());
        assert_eq!(manager.store().save_log(), vec![(id, SaveMode::Autosave)]);

        let outcome = block_on(manager.maybe_save(r#"{"objects":[]}"#)).unwrap();
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_close_stops_saves() {
        let (mut manager, _) = manager_with_design();
        manager.set_interval(Duration::ZERO);
        manager.mark_dirty();
        manager.close();

        assert!(!manager.should_save());
        let result = block_on(manager.save("{}", SaveMode::Explicit));
        assert!(matches!(result, Err(StoreError::Closed)));
        assert!(manager.store().save_log().is_empty());
    }

    #[test]
    fn test_ledger_drops_out_of_order_responses() {
        crate::test_util::init_logger();
        let mut ledger = SaveLedger::new();
        let first = ledger.issue();
        let second = ledger.issue();

        assert!(ledger.accept(second, "2024-01-01T00:00:02Z"));
        assert!(!ledger.accept(first, "2024-01-01T00:00:01Z"));
        assert_eq!(ledger.applied_revision(), Some(2));
    }

    #[test]
    fn test_ledger_drops_older_server_stamp() {
        crate::test_util::init_logger();
        let mut ledger = SaveLedger::new();
        let first = ledger.issue();
        let second = ledger.issue();

        assert!(ledger.accept(first, "2024-01-01T00:00:05Z"));
        assert!(!ledger.accept(second, "2024-01-01T00:00:04Z"));
        assert_eq!(ledger.applied_revision(), Some(1));
    }
}
