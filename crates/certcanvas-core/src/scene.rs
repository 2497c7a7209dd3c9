//! The scene: an ordered list of objects on a canonical-size certificate.

use crate::shapes::{Interaction, ObjectRole, SceneObject, generate_id};
use kurbo::{Point, Rect, Size};

/// Canonical design width in logical units.
pub const CANONICAL_WIDTH: f64 = 850.0;

/// Canonical design height in logical units.
pub const CANONICAL_HEIGHT: f64 = 601.0;

/// Version tag written into new scenes.
pub const SCENE_VERSION: &str = "5.3.0";

/// Canonical design size. Implied by the format, never stored in it.
pub fn canonical_size() -> Size {
    Size::new(CANONICAL_WIDTH, CANONICAL_HEIGHT)
}

/// An ordered list of scene objects. Order is z-order: index 0 is the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub version: String,
    pub objects: Vec<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            version: SCENE_VERSION.to_string(),
            objects: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Objects back to front.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Push an object on top. Layering pins are the caller's concern.
    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Remove a top-level object by id.
    pub fn remove(&mut self, id: &str) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Z-index of a top-level object.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Get a top-level object by id.
    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Get a mutable top-level object by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Find an object by id anywhere, including inside groups.
    pub fn find(&self, id: &str) -> Option<&SceneObject> {
        let mut found = None;
        for object in &self.objects {
            object.walk(&mut |o| {
                if found.is_none() && o.id() == id {
                    found = Some(o);
                }
            });
            if found.is_some() {
                break;
            }
        }
        found
    }

    /// Visit every object and group member, back to front.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SceneObject)) {
        for object in &self.objects {
            object.walk(f);
        }
    }

    /// Mutable visit of every object and group member.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut SceneObject)) {
        for object in &mut self.objects {
            object.walk_mut(f);
        }
    }

    pub fn background_index(&self) -> Option<usize> {
        self.objects.iter().position(|o| o.meta().is_background())
    }

    pub fn qr_anchor_index(&self) -> Option<usize> {
        self.objects
            .iter()
            .position(|o| o.role() == ObjectRole::QrAnchor)
    }

    /// Bring an object to the front (topmost).
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(index) => {
                let object = self.objects.remove(index);
                self.objects.push(object);
                true
            }
            None => false,
        }
    }

    /// Send an object to the back (bottommost).
    pub fn send_to_back(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(index) => {
                let object = self.objects.remove(index);
                self.objects.insert(0, object);
                true
            }
            None => false,
        }
    }

    /// Move an object one layer forward.
    /// Returns true if the object was moved, false if already at front.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos + 1 < self.objects.len() {
                self.objects.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move an object one layer backward.
    /// Returns true if the object was moved, false if already at back.
    pub fn send_backward(&mut self, id: &str) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos > 0 {
                self.objects.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    /// Force the background to index 0 and make it inert.
    /// Returns true if anything changed.
    pub fn pin_background(&mut self) -> bool {
        let Some(index) = self.background_index() else {
            return false;
        };
        let mut changed = false;
        if index != 0 {
            let background = self.objects.remove(index);
            self.objects.insert(0, background);
            changed = true;
        }
        let interaction = &mut self.objects[0].props_mut().interaction;
        if interaction.selectable || interaction.evented {
            *interaction = Interaction {
                exclude_from_export: interaction.exclude_from_export,
                ..Interaction::inert()
            };
            changed = true;
        }
        changed
    }

    /// Force the QR anchor to the top. Returns true if it moved.
    pub fn pin_qr_anchor(&mut self) -> bool {
        match self.qr_anchor_index() {
            Some(index) if index + 1 != self.objects.len() => {
                let qr = self.objects.remove(index);
                self.objects.push(qr);
                true
            }
            _ => false,
        }
    }

    /// Give every top-level object without an id a generated one.
    pub fn ensure_ids(&mut self) {
        for object in &mut self.objects {
            if object.id().is_empty() {
                let prefix = object.kind().type_name();
                object.meta_mut().id = generate_id(prefix);
            }
        }
    }

    /// Find interactive objects at a point, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<&str> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.props().interaction.is_interactive() && o.hit_test(point, tolerance))
            .map(SceneObject::id)
            .collect()
    }

    /// Union of all object bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(SceneObject::bounding_rect)
            .reduce(|a, b| a.union(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{BACKGROUND_ID, Rectangle};

    fn rect(id: &str) -> SceneObject {
        let mut r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        r.props.meta.id = id.to_string();
        SceneObject::Rect(r)
    }

    fn ids(scene: &Scene) -> Vec<&str> {
        scene.objects.iter().map(SceneObject::id).collect()
    }

    #[test]
    fn test_z_order_commands() {
        let mut scene = Scene::new();
        scene.add(rect("a"));
        scene.add(rect("b"));
        scene.add(rect("c"));

        assert!(scene.bring_forward("a"));
        assert_eq!(ids(&scene), vec!["b", "a", "c"]);
        assert!(!scene.bring_forward("c"));
        assert!(scene.send_to_back("c"));
        assert_eq!(ids(&scene), vec!["c", "b", "a"]);
        assert!(scene.bring_to_front("c"));
        assert_eq!(ids(&scene), vec!["b", "a", "c"]);
        assert!(!scene.send_backward("b"));
    }

    #[test]
    fn test_pin_background() {
        let mut scene = Scene::new();
        scene.add(rect("a"));
        scene.add(rect(BACKGROUND_ID));
        assert!(scene.pin_background());
        assert_eq!(ids(&scene), vec![BACKGROUND_ID, "a"]);
        assert!(!scene.objects[0].props().interaction.selectable);
        assert!(!scene.objects[0].props().interaction.evented);
        assert!(!scene.pin_background());
    }

    #[test]
    fn test_pin_qr_anchor() {
        let mut scene = Scene::new();
        let mut qr = rect("qr");
        qr.meta_mut().is_qr_anchor = true;
        scene.add(qr);
        scene.add(rect("a"));
        assert!(scene.pin_qr_anchor());
        assert_eq!(ids(&scene), vec!["a", "qr"]);
        assert!(!scene.pin_qr_anchor());
    }

    #[test]
    fn test_ensure_ids() {
        let mut scene = Scene::new();
        scene.add(rect(""));
        scene.ensure_ids();
        assert!(scene.objects[0].id().starts_with("rect-"));
    }

    #[test]
    fn test_objects_at_point_skip_inert() {
        let mut scene = Scene::new();
        scene.add(rect(BACKGROUND_ID));
        scene.add(rect("a"));
        scene.pin_background();
        assert_eq!(scene.objects_at_point(Point::new(5.0, 5.0), 0.0), vec!["a"]);
    }
}
