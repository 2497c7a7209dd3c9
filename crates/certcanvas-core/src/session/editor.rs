//! Editor page: load, edit, save and autosave one design.

use super::SessionError;
use crate::bridge::{AssetLoader, LoadGate, LoadTicket, LoadedScene, deserialize, serialize};
use crate::notify::{Notice, Notifier};
use crate::scene::Scene;
use crate::storage::{AutoSaveManager, Design, DesignDraft, DesignStore, SaveMode, SaveOutcome};
use crate::surface::DesignSurface;
use std::sync::Arc;

/// What happened to a finished load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The scene is now on the surface. Carries the number of skipped objects.
    Applied { skipped: usize },
    /// A newer load started meanwhile; this result was dropped.
    Superseded,
}

/// One open design in the editor.
pub struct EditorSession<S: DesignStore> {
    store: Arc<S>,
    loader: Arc<dyn AssetLoader>,
    surface: DesignSurface,
    autosave: AutoSaveManager<S>,
    gate: LoadGate,
    design: Option<Design>,
}

impl<S: DesignStore> EditorSession<S> {
    pub fn new(store: Arc<S>, loader: Arc<dyn AssetLoader>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            autosave: AutoSaveManager::new(Arc::clone(&store)),
            store,
            loader,
            surface: DesignSurface::new(notifier),
            gate: LoadGate::new(),
            design: None,
        }
    }

    pub fn surface(&self) -> &DesignSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DesignSurface {
        &mut self.surface
    }

    /// The design as last returned by the store.
    pub fn design(&self) -> Option<&Design> {
        self.design.as_ref()
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    pub fn autosave_mut(&mut self) -> &mut AutoSaveManager<S> {
        &mut self.autosave
    }

    /// Shared handle for hosts that run loads outside the session.
    pub fn load_gate(&self) -> LoadGate {
        self.gate.clone()
    }

    fn report(&self, context: &str, error: &SessionError) {
        log::error!("{context}: {error}");
        self.surface.notify(Notice::error(format!("{context}: {error}")));
    }

    /// Create an empty "Untitled Certificate" design and open it.
    pub async fn create_untitled(&mut self) -> Result<Design, SessionError> {
        let result = async {
            let draft = DesignDraft::untitled(serialize(&Scene::new())?);
            Ok::<_, SessionError>(self.store.create(&draft).await?)
        }
        .await;
        match result {
            Ok(design) => {
                self.gate.cancel();
                self.apply(design.clone(), LoadedScene::default());
                Ok(design)
            }
            Err(e) => {
                self.report("Failed to create design", &e);
                Err(e)
            }
        }
    }

    /// Start a load. Any load started earlier is superseded.
    pub fn begin_load(&self) -> LoadTicket {
        self.gate.begin()
    }

    /// Fetch a design and rebuild its scene, resolving images.
    pub async fn fetch(
        store: &S,
        loader: &dyn AssetLoader,
        id: &str,
    ) -> Result<(Design, LoadedScene), SessionError> {
        let design = store.fetch(id).await?;
        let loaded = deserialize(&design.design, loader).await?;
        Ok((design, loaded))
    }

    /// Apply a fetched design if `ticket` is still the newest load.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<(Design, LoadedScene), SessionError>,
    ) -> Result<LoadOutcome, SessionError> {
        if !self.gate.is_current(ticket) {
            log::debug!("Discarding superseded load {ticket:?}");
            return Ok(LoadOutcome::Superseded);
        }
        match result {
            Ok((design, loaded)) => {
                let skipped = loaded.skipped.len();
                if skipped > 0 {
                    self.surface.notify(Notice::warning(format!(
                        "{skipped} objects could not be restored"
                    )));
                }
                self.apply(design, loaded);
                Ok(LoadOutcome::Applied { skipped })
            }
            Err(e) => {
                self.report("Failed to load design", &e);
                Err(e)
            }
        }
    }

    /// Load design `id` onto the surface.
    pub async fn open(&mut self, id: &str) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_load();
        let result = Self::fetch(&self.store, self.loader.as_ref(), id).await;
        self.finish_load(ticket, result)
    }

    fn apply(&mut self, design: Design, loaded: LoadedScene) {
        self.surface.load_scene(loaded.scene);
        self.autosave.set_design_id(Some(design.id.clone()));
        self.design = Some(design);
    }

    fn record_save(&mut self, outcome: &SaveOutcome) {
        if let SaveOutcome::Applied(design) = outcome {
            self.design = Some(design.clone());
        }
        self.surface.mark_saved();
    }

    /// Save now, at the user's request.
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        let result = async {
            let json = serialize(self.surface.scene())?;
            Ok::<_, SessionError>(self.autosave.save(&json, SaveMode::Explicit).await?)
        }
        .await;
        match result {
            Ok(outcome) => {
                self.record_save(&outcome);
                self.surface.notify(Notice::success("Design saved"));
                Ok(outcome)
            }
            Err(e) => {
                self.report("Failed to save design", &e);
                Err(e)
            }
        }
    }

    /// Periodic hook. Saves when the scene changed and the interval elapsed.
    pub async fn tick(&mut self) -> Option<SaveOutcome> {
        if self.surface.is_dirty() {
            self.autosave.mark_dirty();
        }
        if !self.autosave.should_save() {
            return None;
        }
        let result = async {
            let json = serialize(self.surface.scene())?;
            Ok::<_, SessionError>(self.autosave.maybe_save(&json).await?)
        }
        .await;
        match result {
            Ok(Some(outcome)) => {
                self.record_save(&outcome);
                Some(outcome)
            }
            Ok(None) => None,
            Err(e) => {
                self.report("Autosave failed", &e);
                None
            }
        }
    }

    /// Close the editor. Stops autosave and drops any load in flight.
    pub fn teardown(mut self) -> Scene {
        self.autosave.close();
        self.gate.cancel();
        self.surface.into_scene()
    }
}
