//! Preview page: the design scaled to its container, filled per recipient.

use crate::binding::{Record, fill_anchors};
use crate::bridge::BridgeError;
use crate::notify::{Notice, Notifier};
use crate::scaling::{FitScale, Resize, ResponsiveView};
use crate::scene::Scene;
use kurbo::Size;

pub struct PreviewSession {
    view: ResponsiveView,
    records: Vec<Record>,
    current: Option<usize>,
    /// Scaled scene with the current record filled in.
    filled: Option<Scene>,
    notifier: Box<dyn Notifier>,
}

impl PreviewSession {
    pub fn new(canonical_json: impl Into<String>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            view: ResponsiveView::new(canonical_json),
            records: Vec::new(),
            current: None,
            filled: None,
            notifier,
        }
    }

    /// Replace the recipients. The first one is shown.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.current = if records.is_empty() { None } else { Some(0) };
        self.records = records;
        self.refill();
    }

    /// Show recipient `index`. Returns false when out of range.
    pub fn show(&mut self, index: usize) -> bool {
        if index >= self.records.len() {
            return false;
        }
        self.current = Some(index);
        self.refill();
        true
    }

    pub fn current_record(&self) -> Option<&Record> {
        self.current.and_then(|i| self.records.get(i))
    }

    /// Rescale for a new container size.
    ///
    /// Errors are also reported as notices; the previous preview stays.
    pub fn resize(&mut self, container: Size) -> Result<Resize, BridgeError> {
        match self.view.resize(container) {
            Ok(resize) => {
                if let Resize::Applied(_) = resize {
                    self.refill();
                }
                Ok(resize)
            }
            Err(e) => {
                log::error!("Failed to lay out preview: {e}");
                self.notifier
                    .notify(Notice::error(format!("Failed to load design: {e}")));
                Err(e)
            }
        }
    }

    /// Whether a layout is still owed because the container had no area.
    pub fn is_pending(&self) -> bool {
        self.view.is_pending()
    }

    pub fn fit(&self) -> Option<FitScale> {
        self.view.fit()
    }

    /// The scene to draw, or `None` before the first successful layout.
    pub fn scene(&self) -> Option<&Scene> {
        self.filled.as_ref()
    }

    fn refill(&mut self) {
        let Some(scaled) = self.view.scene() else {
            return;
        };
        let mut scene = scaled.clone();
        if let Some(record) = self.current.and_then(|i| self.records.get(i)) {
            let filled = fill_anchors(&mut scene, record);
            log::debug!("Filled {filled} anchors for record {}", record.id);
        }
        self.filled = Some(scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::serialize;
    use crate::composite::ObjectFactory;
    use crate::notify::RecordingNotifier;

    fn anchor_text(scene: &Scene) -> String {
        scene
            .get("PLACEHOLDER-name")
            .and_then(|o| o.as_group())
            .and_then(|g| g.text())
            .map(|t| t.text.clone())
            .unwrap()
    }

    fn canonical() -> String {
        let mut scene = Scene::new();
        scene.add(ObjectFactory::anchor("name"));
        serialize(&scene).unwrap()
    }

    #[test]
    fn test_preview_fills_current_record() {
        let mut preview = PreviewSession::new(canonical(), Box::new(RecordingNotifier::new()));
        preview.set_records(vec![
            Record::new("p1").with("name", "Ada Lovelace"),
            Record::new("p2").with("name", "Alan Turing"),
        ]);
        preview.resize(Size::new(425.0, 600.0)).unwrap();
        assert_eq!(anchor_text(preview.scene().unwrap()), "Ada Lovelace");

        assert!(preview.show(1));
        assert_eq!(anchor_text(preview.scene().unwrap()), "Alan Turing");
        assert!(!preview.show(2));
        assert_eq!(preview.current_record().unwrap().id, "p2");
    }

    #[test]
    fn test_resizes_do_not_refill_twice() {
        let mut preview = PreviewSession::new(canonical(), Box::new(RecordingNotifier::new()));
        preview.set_records(vec![Record::new("p1").with("name", "Ada")]);
        preview.resize(Size::new(425.0, 600.0)).unwrap();
        let first = preview.scene().cloned();
        preview.resize(Size::new(850.0, 601.0)).unwrap();
        preview.resize(Size::new(425.0, 600.0)).unwrap();
        assert_eq!(preview.scene().cloned(), first);
    }

    #[test]
    fn test_zero_container_waits() {
        let mut preview = PreviewSession::new(canonical(), Box::new(RecordingNotifier::new()));
        assert_eq!(preview.resize(Size::ZERO).unwrap(), Resize::Deferred);
        assert!(preview.is_pending());
        assert!(preview.scene().is_none());
    }

    #[test]
    fn test_broken_design_notifies() {
        let notifier = RecordingNotifier::new();
        let mut preview = PreviewSession::new("{broken", Box::new(notifier.clone()));
        assert!(preview.resize(Size::new(850.0, 601.0)).is_err());
        assert_eq!(notifier.take().len(), 1);
        assert!(preview.scene().is_none());
    }
}
