//! Circle shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};

/// A circle; `width` and `height` always equal twice the radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub props: ObjectProps,
    pub radius: f64,
}

impl Circle {
    /// Create a circle whose bounding box starts at (`left`, `top`).
    pub fn new(left: f64, top: f64, radius: f64) -> Self {
        let mut props = ObjectProps::new(Geometry::new(left, top, radius * 2.0, radius * 2.0));
        props.meta.id = generate_id("circle");
        Self { props, radius }
    }

    pub(crate) fn from_props(mut props: ObjectProps, radius: f64) -> Self {
        props.geometry.width = radius * 2.0;
        props.geometry.height = radius * 2.0;
        Self { props, radius }
    }
}

impl ShapeTrait for Circle {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Circle
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}
