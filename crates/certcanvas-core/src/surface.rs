//! Design surface: user edits on a scene, with per-role policies.
//!
//! The surface works in canonical coordinates. Hosts drawing at a reduced
//! size convert pointer input with [`DesignSurface::to_canonical`] first.

use crate::binding::SIGNATURE_BLOCK_ASPECT;
use crate::composite::{AnchorComposite, ObjectFactory};
use crate::notify::{Notice, Notifier};
use crate::scene::{Scene, canonical_size};
use crate::shapes::{Geometry, ImageAsset, ObjectRole, SceneObject, generate_id};
use crate::snap::{SNAP_THRESHOLD, snap_to_center};
use kurbo::{Point, Vec2};

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Why an edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    /// The object is marked undeleteable.
    Undeletable,
    /// Rotation is locked; the angle was reset to 0.
    RotationLocked,
    /// Movement or scaling is locked on this axis.
    TransformLocked,
    /// The background only supports replace and remove.
    Background,
    /// The object does not take pointer input.
    NotSelectable,
}

impl PolicyViolation {
    /// Message shown to the user, if this violation is worth a notice.
    pub fn message(self) -> Option<&'static str> {
        match self {
            PolicyViolation::Undeletable => Some("The QR code placeholder cannot be deleted"),
            PolicyViolation::RotationLocked => Some("This object cannot be rotated"),
            PolicyViolation::TransformLocked => Some("This object is locked"),
            _ => None,
        }
    }
}

const QR_ROTATION_MESSAGE: &str = "The QR code placeholder cannot be rotated";

/// Result of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Nothing changed (e.g. already at the front).
    Unchanged,
    Rejected(PolicyViolation),
    NotFound,
}

impl EditOutcome {
    pub fn is_applied(self) -> bool {
        self == EditOutcome::Applied
    }
}

/// Interactive editor state over one scene.
pub struct DesignSurface {
    scene: Scene,
    selection: Vec<String>,
    undo_stack: Vec<Scene>,
    redo_stack: Vec<Scene>,
    notifier: Box<dyn Notifier>,
    /// Screen pixels per canonical unit.
    view_scale: f64,
    snap_enabled: bool,
    /// Object and geometry at the start of the current drag or scale.
    gesture: Option<(String, Geometry)>,
    dirty: bool,
}

impl DesignSurface {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self::with_scene(Scene::new(), notifier)
    }

    pub fn with_scene(mut scene: Scene, notifier: Box<dyn Notifier>) -> Self {
        scene.pin_background();
        Self {
            scene,
            selection: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            notifier,
            view_scale: 1.0,
            snap_enabled: true,
            gesture: None,
            dirty: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Replace the whole scene, as after loading. Clears history and selection.
    pub fn load_scene(&mut self, mut scene: Scene) {
        scene.pin_background();
        self.scene = scene;
        self.selection.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.gesture = None;
        self.dirty = false;
    }

    /// Give the scene up, e.g. when the editor closes.
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Whether the scene changed since the last [`mark_saved`](Self::mark_saved).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.view_scale = scale;
        }
    }

    pub fn view_scale(&self) -> f64 {
        self.view_scale
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Convert a screen point to canonical coordinates.
    pub fn to_canonical(&self, screen: Point) -> Point {
        Point::new(screen.x / self.view_scale, screen.y / self.view_scale)
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    fn reject(&self, violation: PolicyViolation) -> EditOutcome {
        match violation.message() {
            Some(message) => self.notifier.notify(Notice::warning(message)),
            None => log::debug!("Edit rejected: {violation:?}"),
        }
        EditOutcome::Rejected(violation)
    }

    /// Reject with a message other than the violation's default.
    fn reject_with(&self, violation: PolicyViolation, message: &str) -> EditOutcome {
        self.notifier.notify(Notice::warning(message));
        EditOutcome::Rejected(violation)
    }

    // History

    /// Push current state to undo stack (call before making changes).
    fn push_undo(&mut self) {
        if self.gesture.is_some() {
            return;
        }
        self.undo_stack.push(self.scene.clone());
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.scene, snapshot);
                self.redo_stack.push(current);
                self.after_history_change();
                true
            }
            None => false,
        }
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.scene, snapshot);
                self.undo_stack.push(current);
                self.after_history_change();
                true
            }
            None => false,
        }
    }

    fn after_history_change(&mut self) {
        let scene = &self.scene;
        self.selection.retain(|id| scene.get(id).is_some());
        self.gesture = None;
        self.dirty = true;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // Selection

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Select a single object (clears previous selection).
    pub fn select(&mut self, id: &str) -> EditOutcome {
        let Some(object) = self.scene.get(id) else {
            return EditOutcome::NotFound;
        };
        if !object.props().interaction.is_interactive() {
            return EditOutcome::Rejected(PolicyViolation::NotSelectable);
        }
        self.selection = vec![id.to_string()];
        EditOutcome::Applied
    }

    /// Select the topmost interactive object under a canonical point.
    pub fn select_at(&mut self, point: Point, tolerance: f64) -> Option<String> {
        let hit = self
            .scene
            .objects_at_point(point, tolerance)
            .first()
            .map(|id| id.to_string());
        match &hit {
            Some(id) => self.selection = vec![id.clone()],
            None => self.selection.clear(),
        }
        hit
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s == id)
    }

    // Add / remove

    /// Add an object on top, then restore the background and QR pins.
    /// A new background replaces the existing one.
    pub fn add(&mut self, mut object: SceneObject) -> EditOutcome {
        if object.id().is_empty() {
            object.meta_mut().id = generate_id(object.kind().type_name());
        }
        self.push_undo();
        if object.meta().is_background() {
            if let Some(index) = self.scene.background_index() {
                self.scene.objects.remove(index);
            }
        }
        let id = object.id().to_string();
        let selectable = object.props().interaction.is_interactive();
        self.scene.add(object);
        self.scene.pin_background();
        self.scene.pin_qr_anchor();
        if selectable {
            self.selection = vec![id];
        }
        self.dirty = true;
        EditOutcome::Applied
    }

    /// Index of the top-level object that owns `id`: the object itself, or
    /// the anchor group containing it.
    fn owner_index(&self, id: &str) -> Option<usize> {
        self.scene.index_of(id).or_else(|| {
            self.scene.objects.iter().position(|o| {
                o.meta().is_anchor
                    && o.as_group()
                        .is_some_and(|g| g.objects.iter().any(|m| m.id() == id))
            })
        })
    }

    /// Remove an object. Removing a member of an anchor removes the anchor.
    pub fn remove(&mut self, id: &str) -> EditOutcome {
        let Some(index) = self.owner_index(id) else {
            return EditOutcome::NotFound;
        };
        if self.scene.objects[index].meta().undeleteable {
            return self.reject(PolicyViolation::Undeletable);
        }
        self.push_undo();
        let removed = self.scene.objects.remove(index);
        self.selection.retain(|s| s != removed.id() && s != id);
        self.scene.pin_background();
        self.dirty = true;
        EditOutcome::Applied
    }

    /// Remove every selected object that may be removed.
    pub fn delete_selected(&mut self) -> Vec<EditOutcome> {
        let ids = self.selection.clone();
        ids.iter().map(|id| self.remove(id)).collect()
    }

    /// Replace (or set) the background image.
    pub fn set_background(&mut self, asset: &ImageAsset) -> EditOutcome {
        self.add(ObjectFactory::background(asset))
    }

    pub fn remove_background(&mut self) -> EditOutcome {
        match self.scene.background_index() {
            Some(index) => {
                self.push_undo();
                self.scene.objects.remove(index);
                self.dirty = true;
                EditOutcome::Applied
            }
            None => EditOutcome::NotFound,
        }
    }

    // Transforms

    /// Start a drag or scale gesture. The whole gesture is one undo step and
    /// aspect correction measures change from the geometry captured here.
    pub fn begin_gesture(&mut self, id: &str) -> EditOutcome {
        let Some(object) = self.scene.get(id) else {
            return EditOutcome::NotFound;
        };
        let base = *object.geometry();
        self.gesture = None;
        self.push_undo();
        self.gesture = Some((id.to_string(), base));
        EditOutcome::Applied
    }

    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    /// Check common transform policies. Returns the object's index.
    fn transformable(&self, id: &str) -> Result<usize, EditOutcome> {
        let index = self.scene.index_of(id).ok_or(EditOutcome::NotFound)?;
        let object = &self.scene.objects[index];
        if object.meta().is_background() {
            return Err(self.reject(PolicyViolation::Background));
        }
        if !object.props().interaction.evented {
            return Err(self.reject(PolicyViolation::NotSelectable));
        }
        Ok(index)
    }

    fn snap(&mut self, index: usize) {
        if !self.snap_enabled {
            return;
        }
        let bounds = self.scene.objects[index].bounding_rect();
        let result = snap_to_center(bounds, canonical_size(), SNAP_THRESHOLD);
        if result.is_snapped() {
            self.scene.objects[index].geometry_mut().translate(result.offset);
        }
    }

    fn anchor_at(&self, index: usize) -> Option<AnchorComposite> {
        let object = &self.scene.objects[index];
        object
            .as_group()
            .filter(|_| object.meta().is_anchor)
            .and_then(AnchorComposite::from_group)
    }

    /// Run `f` on the anchor composite at `index`, writing it back.
    fn edit_anchor(&mut self, index: usize, f: impl FnOnce(&mut AnchorComposite)) -> bool {
        let Some(mut composite) = self.anchor_at(index) else {
            return false;
        };
        f(&mut composite);
        self.scene.objects[index] = composite.into_object();
        true
    }

    /// Move an object by a canonical delta, then snap to the centerlines.
    pub fn move_by(&mut self, id: &str, delta: Vec2) -> EditOutcome {
        let index = match self.transformable(id) {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };
        let interaction = self.scene.objects[index].props().interaction;
        let clamped = (interaction.lock_movement_x && delta.x != 0.0)
            || (interaction.lock_movement_y && delta.y != 0.0);
        let delta = Vec2::new(
            if interaction.lock_movement_x { 0.0 } else { delta.x },
            if interaction.lock_movement_y { 0.0 } else { delta.y },
        );
        if clamped {
            let outcome = self.reject(PolicyViolation::TransformLocked);
            if delta == Vec2::ZERO {
                return outcome;
            }
        }
        if delta == Vec2::ZERO {
            return EditOutcome::Unchanged;
        }

        self.push_undo();
        let target = self.scene.objects[index].geometry().center() + delta;
        if !self.edit_anchor(index, |anchor| anchor.move_to(target)) {
            self.scene.objects[index].geometry_mut().translate(delta);
        }
        self.snap(index);
        self.dirty = true;
        EditOutcome::Applied
    }

    /// Move by a delta measured in screen pixels.
    pub fn drag_by(&mut self, id: &str, screen_delta: Vec2) -> EditOutcome {
        self.move_by(id, screen_delta / self.view_scale)
    }

    /// Set an object's absolute scale factors, keeping its center. For an
    /// anchor the factors apply to its box; the label keeps its size.
    ///
    /// Signature blocks are corrected to 16:9: whichever dimension changed
    /// more since the gesture began drives the other.
    pub fn scale_to(&mut self, id: &str, scale_x: f64, scale_y: f64) -> EditOutcome {
        let index = match self.transformable(id) {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };
        if !(scale_x.is_finite() && scale_y.is_finite()) || scale_x <= 0.0 || scale_y <= 0.0 {
            return EditOutcome::Unchanged;
        }
        let anchor = self.anchor_at(index);
        let object = &self.scene.objects[index];
        let current = *object.geometry();
        let (current_x, current_y) = match &anchor {
            Some(anchor) => {
                let rect = anchor.rect.props.geometry;
                (rect.scale_x, rect.scale_y)
            }
            None => (current.scale_x, current.scale_y),
        };
        let interaction = object.props().interaction;
        let clamped = (interaction.lock_scaling_x && scale_x != current_x)
            || (interaction.lock_scaling_y && scale_y != current_y);
        let mut scale_x = if interaction.lock_scaling_x { current_x } else { scale_x };
        let mut scale_y = if interaction.lock_scaling_y { current_y } else { scale_y };
        if clamped {
            let outcome = self.reject(PolicyViolation::TransformLocked);
            if scale_x == current_x && scale_y == current_y {
                return outcome;
            }
        }

        if object.role() == ObjectRole::SignatureBlock && current.width > 0.0 && current.height > 0.0
        {
            let base = match &self.gesture {
                Some((gesture_id, base)) if gesture_id == id => *base,
                _ => current,
            };
            let base_size = base.scaled_size();
            let width = current.width * scale_x;
            let height = current.height * scale_y;
            if (width - base_size.width).abs() >= (height - base_size.height).abs() {
                scale_y = width / SIGNATURE_BLOCK_ASPECT / current.height;
            } else {
                scale_x = height * SIGNATURE_BLOCK_ASPECT / current.width;
            }
        }

        self.push_undo();
        if !self.edit_anchor(index, |anchor| anchor.scale_to(scale_x, scale_y)) {
            let g = self.scene.objects[index].geometry_mut();
            let center = g.center();
            g.scale_x = scale_x;
            g.scale_y = scale_y;
            g.set_center(center);
        }
        self.snap(index);
        self.dirty = true;
        EditOutcome::Applied
    }

    /// Rotate around the center. Locked objects snap back to 0 degrees.
    pub fn rotate_to(&mut self, id: &str, angle: f64) -> EditOutcome {
        let index = match self.transformable(id) {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };
        let object = &self.scene.objects[index];
        let is_qr = object.role() == ObjectRole::QrAnchor;
        if is_qr || object.props().interaction.lock_rotation {
            if object.geometry().angle != 0.0 {
                self.push_undo();
                self.scene.objects[index].geometry_mut().rotate_about_center(0.0);
                self.dirty = true;
            }
            return if is_qr {
                self.reject_with(PolicyViolation::RotationLocked, QR_ROTATION_MESSAGE)
            } else {
                self.reject(PolicyViolation::RotationLocked)
            };
        }

        self.push_undo();
        if !self.edit_anchor(index, |anchor| anchor.rotate_to(angle)) {
            self.scene.objects[index]
                .geometry_mut()
                .rotate_about_center(angle);
        }
        self.dirty = true;
        EditOutcome::Applied
    }

    /// Replace the text of a textbox or anchor label.
    pub fn set_text(&mut self, id: &str, text: &str) -> EditOutcome {
        let Some(index) = self.owner_index(id) else {
            return EditOutcome::NotFound;
        };
        let has_text = match &self.scene.objects[index] {
            SceneObject::Textbox(_) => true,
            SceneObject::Group(group) => group.text().is_some(),
            _ => false,
        };
        if !has_text {
            return EditOutcome::Unchanged;
        }

        self.push_undo();
        if !self.edit_anchor(index, |anchor| anchor.set_text(text)) {
            let textbox = match &mut self.scene.objects[index] {
                SceneObject::Group(group) => group.text_mut(),
                object => object.as_textbox_mut(),
            };
            if let Some(textbox) = textbox {
                textbox.set_text(text);
            }
        }
        self.dirty = true;
        EditOutcome::Applied
    }

    // Layering

    fn reorder(&mut self, id: &str, op: fn(&mut Scene, &str) -> bool) -> EditOutcome {
        if self.scene.index_of(id).is_none() {
            return EditOutcome::NotFound;
        }
        let before: Vec<String> = self.scene.objects.iter().map(|o| o.id().to_string()).collect();
        let snapshot = self.scene.clone();
        op(&mut self.scene, id);
        self.scene.pin_background();
        self.scene.pin_qr_anchor();
        let changed = self
            .scene
            .objects
            .iter()
            .map(SceneObject::id)
            .ne(before.iter().map(String::as_str));
        if !changed {
            return EditOutcome::Unchanged;
        }
        if self.gesture.is_none() {
            self.undo_stack.push(snapshot);
            self.redo_stack.clear();
            if self.undo_stack.len() > MAX_UNDO_HISTORY {
                self.undo_stack.remove(0);
            }
        }
        self.dirty = true;
        EditOutcome::Applied
    }

    pub fn bring_forward(&mut self, id: &str) -> EditOutcome {
        self.reorder(id, Scene::bring_forward)
    }

    pub fn send_backward(&mut self, id: &str) -> EditOutcome {
        self.reorder(id, Scene::send_backward)
    }

    pub fn bring_to_front(&mut self, id: &str) -> EditOutcome {
        self.reorder(id, Scene::bring_to_front)
    }

    pub fn send_to_back(&mut self, id: &str) -> EditOutcome {
        self.reorder(id, Scene::send_to_back)
    }
}
