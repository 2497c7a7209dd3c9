//! Isosceles triangle shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};

/// A triangle pointing up inside its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub props: ObjectProps,
}

impl Triangle {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        let mut props = ObjectProps::new(Geometry::new(left, top, width, height));
        props.meta.id = generate_id("triangle");
        Self { props }
    }

    pub(crate) fn from_props(props: ObjectProps) -> Self {
        Self { props }
    }
}

impl ShapeTrait for Triangle {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Triangle
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}
