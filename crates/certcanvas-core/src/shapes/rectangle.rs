//! Rectangle shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub props: ObjectProps,
    /// Horizontal corner radius.
    pub rx: f64,
    /// Vertical corner radius.
    pub ry: f64,
}

impl Rectangle {
    /// Create a new rectangle with its top-left corner at (`left`, `top`).
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        let mut props = ObjectProps::new(Geometry::new(left, top, width, height));
        props.meta.id = generate_id("rect");
        Self::from_props(props)
    }

    pub(crate) fn from_props(props: ObjectProps) -> Self {
        Self {
            props,
            rx: 0.0,
            ry: 0.0,
        }
    }

    /// Rendered width / height, or `None` for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let size = self.props.geometry.scaled_size();
        (size.height > f64::EPSILON).then(|| size.width / size.height)
    }
}

impl ShapeTrait for Rectangle {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Rect
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}
