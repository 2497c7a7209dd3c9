//! Placement of an object: origin, size, scale and rotation.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Horizontal origin anchor of `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

impl OriginX {
    pub fn as_str(self) -> &'static str {
        match self {
            OriginX::Left => "left",
            OriginX::Center => "center",
            OriginX::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(OriginX::Left),
            "center" => Some(OriginX::Center),
            "right" => Some(OriginX::Right),
            _ => None,
        }
    }

    /// Position of the origin relative to the center, as a fraction of width.
    fn offset(self) -> f64 {
        match self {
            OriginX::Left => -0.5,
            OriginX::Center => 0.0,
            OriginX::Right => 0.5,
        }
    }
}

/// Vertical origin anchor of `top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginY {
    pub fn as_str(self) -> &'static str {
        match self {
            OriginY::Top => "top",
            OriginY::Center => "center",
            OriginY::Bottom => "bottom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "top" => Some(OriginY::Top),
            "center" => Some(OriginY::Center),
            "bottom" => Some(OriginY::Bottom),
            _ => None,
        }
    }

    fn offset(self) -> f64 {
        match self {
            OriginY::Top => -0.5,
            OriginY::Center => 0.0,
            OriginY::Bottom => 0.5,
        }
    }
}

/// Geometric attributes of a scene object.
///
/// `left`/`top` locate the origin point chosen by `origin_x`/`origin_y`.
/// `width`/`height` are unscaled; the rendered size is multiplied by the
/// scale factors. `angle` is in degrees, clockwise, around the center.
/// Members of a group are positioned relative to the group's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: OriginX::default(),
            origin_y: OriginY::default(),
        }
    }
}

fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

impl Geometry {
    /// Create an unrotated, unscaled geometry with a top-left origin.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Self::default()
        }
    }

    /// Size after applying the scale factors.
    pub fn scaled_size(&self) -> Size {
        Size::new(
            self.width * self.scale_x.abs(),
            self.height * self.scale_y.abs(),
        )
    }

    /// Vector from the origin point to the center, before rotation.
    fn origin_to_center(&self) -> Vec2 {
        let size = self.scaled_size();
        Vec2::new(
            -self.origin_x.offset() * size.width,
            -self.origin_y.offset() * size.height,
        )
    }

    /// Center point in the parent's coordinate space.
    pub fn center(&self) -> Point {
        Point::new(self.left, self.top) + rotate_vec(self.origin_to_center(), self.angle)
    }

    /// Move so that the center lands on `center`, keeping origin settings.
    pub fn set_center(&mut self, center: Point) {
        let origin = center - rotate_vec(self.origin_to_center(), self.angle);
        self.left = origin.x;
        self.top = origin.y;
    }

    /// Rotate around the center, keeping the center fixed.
    pub fn rotate_about_center(&mut self, angle: f64) {
        let center = self.center();
        self.angle = angle;
        self.set_center(center);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
    }

    /// Unscaled box centered on the local origin.
    pub fn local_rect(&self) -> Rect {
        Rect::new(
            -self.width / 2.0,
            -self.height / 2.0,
            self.width / 2.0,
            self.height / 2.0,
        )
    }

    /// Local-to-parent transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center().to_vec2())
            * Affine::rotate(self.angle.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Axis-aligned bounds after applying `parent` on top of this geometry.
    pub fn bounding_rect(&self, parent: Affine) -> Rect {
        (parent * self.transform()).transform_rect_bbox(self.local_rect())
    }
}
