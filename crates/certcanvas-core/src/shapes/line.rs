//! Straight line shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};
use kurbo::Point;

/// A line segment. Endpoints are stored relative to the object's center.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub props: ObjectProps,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    /// Create a line between two points in scene coordinates.
    pub fn new(start: Point, end: Point) -> Self {
        let left = start.x.min(end.x);
        let top = start.y.min(end.y);
        let width = (end.x - start.x).abs();
        let height = (end.y - start.y).abs();
        let mut props = ObjectProps::new(Geometry::new(left, top, width, height));
        props.meta.id = generate_id("line");
        props.style.fill = None;
        props.style.stroke = Some(super::SerializableColor::black());
        props.style.stroke_width = 2.0;
        let center = props.geometry.center();
        Self {
            props,
            x1: start.x - center.x,
            y1: start.y - center.y,
            x2: end.x - center.x,
            y2: end.y - center.y,
        }
    }

    pub(crate) fn from_props(props: ObjectProps, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            props,
            x1,
            y1,
            x2,
            y2,
        }
    }

    /// Endpoints in the parent's coordinate space.
    pub fn endpoints(&self) -> (Point, Point) {
        let m = self.props.geometry.transform();
        (m * Point::new(self.x1, self.y1), m * Point::new(self.x2, self.y2))
    }
}

impl ShapeTrait for Line {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Line
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}
