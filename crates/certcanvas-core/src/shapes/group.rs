//! Group of objects manipulated as one unit.

use super::{
    Geometry, ObjectKind, ObjectProps, Rectangle, SceneObject, ShapeTrait, Textbox, generate_id,
};
use kurbo::{Affine, Rect};

/// A group of objects. Members are positioned relative to the group center,
/// so moving, scaling or rotating the group carries every member along.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub props: ObjectProps,
    pub objects: Vec<SceneObject>,
}

impl Group {
    /// Group objects given in scene coordinates.
    ///
    /// The group's box becomes the union of the member bounds and members are
    /// re-expressed relative to its center.
    pub fn new(mut objects: Vec<SceneObject>) -> Self {
        let bounds = objects
            .iter()
            .map(SceneObject::bounding_rect)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        let center = bounds.center().to_vec2();
        for object in &mut objects {
            object.geometry_mut().translate(-center);
        }
        let mut props = ObjectProps::new(Geometry::new(
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
        ));
        props.meta.id = generate_id("group");
        props.style.fill = None;
        Self { props, objects }
    }

    pub(crate) fn from_props(props: ObjectProps, objects: Vec<SceneObject>) -> Self {
        Self { props, objects }
    }

    pub fn children(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn children_mut(&mut self) -> &mut Vec<SceneObject> {
        &mut self.objects
    }

    /// Dissolve this group, returning members in scene coordinates.
    ///
    /// Only unrotated members of an unrotated group keep exact placement;
    /// scale is folded into member scale factors.
    pub fn ungroup(self) -> Vec<SceneObject> {
        let group = self.props.geometry;
        let m = group.transform();
        self.objects
            .into_iter()
            .map(|mut child| {
                let g = child.geometry_mut();
                let center = m * g.center();
                g.scale_x *= group.scale_x;
                g.scale_y *= group.scale_y;
                g.angle += group.angle;
                g.set_center(center);
                child
            })
            .collect()
    }

    /// First text member.
    pub fn text(&self) -> Option<&Textbox> {
        self.objects.iter().find_map(SceneObject::as_textbox)
    }

    /// First text member, mutably.
    pub fn text_mut(&mut self) -> Option<&mut Textbox> {
        self.objects.iter_mut().find_map(SceneObject::as_textbox_mut)
    }

    /// First rectangle member.
    pub fn rect(&self) -> Option<&Rectangle> {
        self.objects.iter().find_map(SceneObject::as_rect)
    }

    /// Scene-space bounds of a member, given the transform of this group's parent.
    pub fn member_bounds(&self, member: &SceneObject, parent: Affine) -> Rect {
        member
            .geometry()
            .bounding_rect(parent * self.props.geometry.transform())
    }
}

impl ShapeTrait for Group {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Group
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn sample() -> Group {
        Group::new(vec![
            SceneObject::Rect(Rectangle::new(0.0, 0.0, 100.0, 50.0)),
            SceneObject::Rect(Rectangle::new(200.0, 200.0, 50.0, 100.0)),
        ])
    }

    #[test]
    fn test_group_bounds() {
        let group = SceneObject::Group(sample());
        let bounds = group.bounding_rect();
        assert!((bounds.x0 - 0.0).abs() < 1e-9);
        assert!((bounds.y0 - 0.0).abs() < 1e-9);
        assert!((bounds.x1 - 250.0).abs() < 1e-9);
        assert!((bounds.y1 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_member_bounds_follow_group_move() {
        let mut group = sample();
        group.props.geometry.left += 10.0;
        let first = group.objects[0].clone();
        let bounds = group.member_bounds(&first, Affine::IDENTITY);
        assert!((bounds.x0 - 10.0).abs() < 1e-9);
        assert!((bounds.x1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_ungroup_restores_positions() {
        let children = sample().ungroup();
        assert_eq!(children.len(), 2);
        let second = children[1].bounding_rect();
        assert!((second.x0 - 200.0).abs() < 1e-9);
        assert!((second.y0 - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_uses_bounds() {
        let group = SceneObject::Group(sample());
        assert!(group.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(!group.hit_test(Point::new(400.0, 25.0), 0.0));
    }
}
