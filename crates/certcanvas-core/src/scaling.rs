//! Fitting the canonical design into a rendering container.
//!
//! Scaled scenes are always derived from the canonical JSON. Scaling live,
//! already-scaled objects a second time would compound, so a resize reloads
//! the canonical document and scales the fresh copy.

use crate::bridge::{BridgeError, LoadedScene, parse_scene};
use crate::scene::{CANONICAL_HEIGHT, CANONICAL_WIDTH, Scene};
use crate::snap::scaled_threshold;
use kurbo::{Affine, Point, Size};

/// Uniform factor mapping canonical units onto the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScale {
    pub scale: f64,
}

impl FitScale {
    /// Canonical size, 1:1.
    pub const IDENTITY: FitScale = FitScale { scale: 1.0 };

    /// Largest scale (never above 1) at which the design fits `container`.
    /// `None` while the container has no area yet.
    pub fn for_container(container: Size) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(container.width) || !valid(container.height) {
            return None;
        }
        let scale = (container.width / CANONICAL_WIDTH)
            .min(container.height / CANONICAL_HEIGHT)
            .min(1.0);
        Some(Self { scale })
    }

    /// Rendered design size. Same aspect ratio as the canonical size.
    pub fn render_size(&self) -> Size {
        Size::new(CANONICAL_WIDTH * self.scale, CANONICAL_HEIGHT * self.scale)
    }

    /// Canonical to screen.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale)
    }

    /// Screen to canonical.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale)
    }

    pub fn screen_to_canonical(&self, point: Point) -> Point {
        self.inverse_transform() * point
    }

    pub fn canonical_to_screen(&self, point: Point) -> Point {
        self.transform() * point
    }

    /// Snap threshold in screen units.
    pub fn snap_threshold(&self) -> f64 {
        scaled_threshold(self.scale)
    }

    /// Scale top-level objects in place.
    ///
    /// Position and scale factors are multiplied; angles are untouched and
    /// group members stay in their group's local space. Only call this on a
    /// freshly loaded canonical scene.
    pub fn apply(&self, scene: &mut Scene) {
        for object in &mut scene.objects {
            let g = object.geometry_mut();
            g.left *= self.scale;
            g.top *= self.scale;
            g.scale_x *= self.scale;
            g.scale_y *= self.scale;
        }
    }
}

/// Load `canonical_json` and scale it for `container`.
/// `Ok(None)` when the container has no area.
pub fn fit_scene(
    canonical_json: &str,
    container: Size,
) -> Result<Option<(LoadedScene, FitScale)>, BridgeError> {
    let Some(fit) = FitScale::for_container(container) else {
        return Ok(None);
    };
    let mut loaded = parse_scene(canonical_json)?;
    fit.apply(&mut loaded.scene);
    Ok(Some((loaded, fit)))
}

/// What a resize did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resize {
    Applied(FitScale),
    /// The container had no area; the next resize will retry.
    Deferred,
}

/// A scaled view of a canonical design that tracks container resizes.
#[derive(Debug, Clone)]
pub struct ResponsiveView {
    canonical: String,
    scene: Option<Scene>,
    fit: Option<FitScale>,
    pending: bool,
}

impl ResponsiveView {
    pub fn new(canonical_json: impl Into<String>) -> Self {
        Self {
            canonical: canonical_json.into(),
            scene: None,
            fit: None,
            pending: true,
        }
    }

    /// The canonical document this view renders.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Swap the canonical document. The scaled scene is rebuilt on the next
    /// resize.
    pub fn set_canonical(&mut self, canonical_json: impl Into<String>) {
        self.canonical = canonical_json.into();
        self.pending = true;
    }

    /// Re-derive the scaled scene for a new container size.
    ///
    /// On a parse error the previous scaled scene is kept.
    pub fn resize(&mut self, container: Size) -> Result<Resize, BridgeError> {
        match fit_scene(&self.canonical, container)? {
            Some((loaded, fit)) => {
                if !loaded.skipped.is_empty() {
                    log::warn!("{} objects skipped while scaling", loaded.skipped.len());
                }
                self.scene = Some(loaded.scene);
                self.fit = Some(fit);
                self.pending = false;
                Ok(Resize::Applied(fit))
            }
            None => {
                log::debug!("Container has no area yet, deferring layout");
                self.pending = true;
                Ok(Resize::Deferred)
            }
        }
    }

    /// Whether a layout is still owed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn fit(&self) -> Option<FitScale> {
        self.fit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::serialize;
    use crate::composite::ObjectFactory;
    use crate::shapes::{Rectangle, SceneObject};

    const EPS: f64 = 1e-9;

    fn canonical() -> String {
        let mut scene = Scene::new();
        let mut rect = Rectangle::new(100.0, 200.0, 50.0, 40.0);
        rect.props.geometry.angle = 30.0;
        rect.props.meta.id = "r".to_string();
        scene.add(SceneObject::Rect(rect));
        scene.add(ObjectFactory::anchor("name"));
        serialize(&scene).unwrap()
    }

    #[test]
    fn test_fit_never_upscales() {
        let fit = FitScale::for_container(Size::new(2000.0, 2000.0)).unwrap();
        assert!((fit.scale - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fit_uses_tighter_axis() {
        let fit = FitScale::for_container(Size::new(425.0, 600.0)).unwrap();
        assert!((fit.scale - 0.5).abs() < EPS);
        let size = fit.render_size();
        assert!((size.width - 425.0).abs() < EPS);
        assert!((size.height - 300.5).abs() < EPS);
    }

    #[test]
    fn test_zero_container_defers() {
        assert_eq!(FitScale::for_container(Size::new(0.0, 500.0)), None);
        assert_eq!(FitScale::for_container(Size::new(500.0, 0.0)), None);
    }

    #[test]
    fn test_apply_scales_positions_not_angles() {
        let (loaded, fit) = fit_scene(&canonical(), Size::new(425.0, 1000.0))
            .unwrap()
            .unwrap();
        let g = loaded.scene.get("r").unwrap().geometry();
        assert!((g.left - 50.0).abs() < EPS);
        assert!((g.top - 100.0).abs() < EPS);
        assert!((g.scale_x - fit.scale).abs() < EPS);
        assert!((g.angle - 30.0).abs() < EPS);
    }

    #[test]
    fn test_group_members_untouched() {
        let source = parse_scene(&canonical()).unwrap().scene;
        let (loaded, _) = fit_scene(&canonical(), Size::new(425.0, 1000.0))
            .unwrap()
            .unwrap();
        let before = source.get("PLACEHOLDER-name").unwrap().as_group().unwrap();
        let after = loaded
            .scene
            .get("PLACEHOLDER-name")
            .unwrap()
            .as_group()
            .unwrap();
        assert_eq!(before.objects, after.objects);
    }

    #[test]
    fn test_repeated_resizes_do_not_compound() {
        let mut view = ResponsiveView::new(canonical());
        let direct = fit_scene(&canonical(), Size::new(425.0, 1000.0))
            .unwrap()
            .unwrap()
            .0
            .scene;

        view.resize(Size::new(425.0, 1000.0)).unwrap();
        view.resize(Size::new(300.0, 1000.0)).unwrap();
        view.resize(Size::new(425.0, 1000.0)).unwrap();

        assert_eq!(view.scene(), Some(&direct));
    }

    #[test]
    fn test_pending_until_container_has_area() {
        let mut view = ResponsiveView::new(canonical());
        assert_eq!(view.resize(Size::ZERO).unwrap(), Resize::Deferred);
        assert!(view.is_pending());
        assert!(view.scene().is_none());

        assert!(matches!(
            view.resize(Size::new(850.0, 601.0)).unwrap(),
            Resize::Applied(_)
        ));
        assert!(!view.is_pending());
    }

    #[test]
    fn test_bad_canonical_keeps_previous_scene() {
        let mut view = ResponsiveView::new(canonical());
        view.resize(Size::new(850.0, 601.0)).unwrap();
        view.set_canonical("{broken");
        assert!(view.resize(Size::new(850.0, 601.0)).is_err());
        assert!(view.scene().is_some());
    }

    #[test]
    fn test_screen_canonical_conversion() {
        let fit = FitScale { scale: 0.5 };
        let p = fit.screen_to_canonical(Point::new(100.0, 50.0));
        assert!((p.x - 200.0).abs() < EPS && (p.y - 100.0).abs() < EPS);
        assert!((fit.snap_threshold() - 5.0).abs() < EPS);
    }
}
