//! Scene object definitions for certificate designs.

mod circle;
mod geometry;
mod group;
mod image;
mod line;
mod metadata;
mod rectangle;
mod textbox;
mod triangle;

pub use circle::Circle;
pub use geometry::{Geometry, OriginX, OriginY};
pub use group::Group;
pub use image::{Image, ImageAsset};
pub use line::Line;
pub use metadata::{
    BACKGROUND_ID, Metadata, ObjectRole, PLACEHOLDER_PREFIX, SIGNATURE_PREFIX, column_from_id,
    generate_id, placeholder_id, signature_id, signature_prefix_for,
};
pub use rectangle::Rectangle;
pub use textbox::{DEFAULT_FONT_SIZE, Textbox};
pub use triangle::Triangle;

use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse a CSS color string (`#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
    /// `rgba()` or a handful of keywords).
    ///
    /// `transparent` parses to `None` like an empty paint.
    pub fn parse_css(input: &str) -> Option<Self> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(body) = s.strip_prefix("rgba(").or_else(|| s.strip_prefix("rgb(")) {
            let body = body.strip_suffix(')')?;
            let parts: Vec<&str> = body.split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return None;
            }
            let channel = |p: &str| p.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
            let a = match parts.get(3) {
                Some(p) => (p.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
                None => 255,
            };
            return Some(Self::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a));
        }
        match s.as_str() {
            "black" => Some(Self::black()),
            "white" => Some(Self::white()),
            "red" => Some(Self::new(255, 0, 0, 255)),
            "green" => Some(Self::new(0, 128, 0, 255)),
            "blue" => Some(Self::new(0, 0, 255, 255)),
            "gray" | "grey" => Some(Self::new(128, 128, 128, 255)),
            _ => None,
        }
    }

    /// Format as a CSS color string.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.a as f64 / 255.0 * 1000.0).round() / 1000.0;
            format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha)
        }
    }
}

fn parse_hex(hex: &str) -> Option<SerializableColor> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(SerializableColor::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        6 => Some(SerializableColor::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(SerializableColor::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Paint and visibility properties shared by every object.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    /// Stroke color (None = no stroke).
    pub stroke: Option<SerializableColor>,
    pub stroke_width: f64,
    /// Dash pattern, e.g. `[5, 5]` for the placeholder borders.
    pub stroke_dash_array: Option<Vec<f64>>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
    pub visible: bool,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(SerializableColor::black()),
            stroke: None,
            stroke_width: 1.0,
            stroke_dash_array: None,
            opacity: 1.0,
            visible: true,
        }
    }
}

impl ShapeStyle {
    /// Get the fill color as a peniko Color.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(Into::into)
    }

    /// Set the fill color from a peniko Color.
    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill = color.map(Into::into);
    }

    /// Style used for dashed placeholder outlines.
    pub fn dashed_outline(stroke: SerializableColor) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
            stroke_width: 2.0,
            stroke_dash_array: Some(vec![5.0, 5.0]),
            ..Self::default()
        }
    }
}

/// Interaction flags controlling how the editor may manipulate an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub selectable: bool,
    pub evented: bool,
    pub has_controls: bool,
    pub has_rotating_point: bool,
    pub lock_movement_x: bool,
    pub lock_movement_y: bool,
    pub lock_scaling_x: bool,
    pub lock_scaling_y: bool,
    pub lock_rotation: bool,
    pub exclude_from_export: bool,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            has_controls: true,
            has_rotating_point: true,
            lock_movement_x: false,
            lock_movement_y: false,
            lock_scaling_x: false,
            lock_scaling_y: false,
            lock_rotation: false,
            exclude_from_export: false,
        }
    }
}

impl Interaction {
    /// Flags for objects the user can never touch (the background).
    pub fn inert() -> Self {
        Self {
            selectable: false,
            evented: false,
            has_controls: false,
            ..Self::default()
        }
    }

    /// Whether pointer interaction reaches this object at all.
    pub fn is_interactive(&self) -> bool {
        self.selectable && self.evented
    }
}

/// Everything every variant carries: geometry, style, interaction and metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectProps {
    pub geometry: Geometry,
    pub style: ShapeStyle,
    pub interaction: Interaction,
    pub meta: Metadata,
}

impl ObjectProps {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }
}

/// Variant tag for scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Rect,
    Circle,
    Triangle,
    Line,
    Textbox,
    Image,
    Group,
}

impl ObjectKind {
    /// The `type` string used in the JSON scene format.
    pub fn type_name(self) -> &'static str {
        match self {
            ObjectKind::Rect => "rect",
            ObjectKind::Circle => "circle",
            ObjectKind::Triangle => "triangle",
            ObjectKind::Line => "line",
            ObjectKind::Textbox => "textbox",
            ObjectKind::Image => "image",
            ObjectKind::Group => "group",
        }
    }

    /// Parse a `type` string. Older scenes use `text` and `i-text` for text.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rect" => Some(ObjectKind::Rect),
            "circle" => Some(ObjectKind::Circle),
            "triangle" => Some(ObjectKind::Triangle),
            "line" => Some(ObjectKind::Line),
            "textbox" | "text" | "i-text" => Some(ObjectKind::Textbox),
            "image" => Some(ObjectKind::Image),
            "group" => Some(ObjectKind::Group),
            _ => None,
        }
    }
}

/// Common access for all variants.
pub trait ShapeTrait {
    fn kind(&self) -> ObjectKind;

    fn props(&self) -> &ObjectProps;

    fn props_mut(&mut self) -> &mut ObjectProps;
}

/// A placeable design element.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Rect(Rectangle),
    Circle(Circle),
    Triangle(Triangle),
    Line(Line),
    Textbox(Textbox),
    Image(Image),
    Group(Group),
}

impl SceneObject {
    fn shape(&self) -> &dyn ShapeTrait {
        match self {
            SceneObject::Rect(s) => s,
            SceneObject::Circle(s) => s,
            SceneObject::Triangle(s) => s,
            SceneObject::Line(s) => s,
            SceneObject::Textbox(s) => s,
            SceneObject::Image(s) => s,
            SceneObject::Group(s) => s,
        }
    }

    fn shape_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            SceneObject::Rect(s) => s,
            SceneObject::Circle(s) => s,
            SceneObject::Triangle(s) => s,
            SceneObject::Line(s) => s,
            SceneObject::Textbox(s) => s,
            SceneObject::Image(s) => s,
            SceneObject::Group(s) => s,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.shape().kind()
    }

    pub fn props(&self) -> &ObjectProps {
        self.shape().props()
    }

    pub fn props_mut(&mut self) -> &mut ObjectProps {
        self.shape_mut().props_mut()
    }

    pub fn id(&self) -> &str {
        &self.props().meta.id
    }

    pub fn meta(&self) -> &Metadata {
        &self.props().meta
    }

    pub fn meta_mut(&mut self) -> &mut Metadata {
        &mut self.props_mut().meta
    }

    pub fn geometry(&self) -> &Geometry {
        &self.props().geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.props_mut().geometry
    }

    pub fn role(&self) -> ObjectRole {
        self.meta().role()
    }

    /// Axis-aligned bounds in scene coordinates.
    pub fn bounding_rect(&self) -> Rect {
        self.geometry().bounding_rect(Affine::IDENTITY)
    }

    /// Check if a point (in scene coordinates) hits this object.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounding_rect().inflate(tolerance, tolerance).contains(point)
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            SceneObject::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            SceneObject::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_textbox(&self) -> Option<&Textbox> {
        match self {
            SceneObject::Textbox(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_textbox_mut(&mut self) -> Option<&mut Textbox> {
        match self {
            SceneObject::Textbox(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<&Rectangle> {
        match self {
            SceneObject::Rect(r) => Some(r),
            _ => None,
        }
    }

    /// Visit this object and, for groups, every nested member (pre-order).
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SceneObject)) {
        f(self);
        if let SceneObject::Group(group) = self {
            for child in &group.objects {
                child.walk(f);
            }
        }
    }

    /// Mutable pre-order visit.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut SceneObject)) {
        f(self);
        if let SceneObject::Group(group) = self {
            for child in &mut group.objects {
                child.walk_mut(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(SerializableColor::parse_css("#000"), Some(SerializableColor::black()));
        assert_eq!(
            SerializableColor::parse_css("#FF8000"),
            Some(SerializableColor::new(255, 128, 0, 255))
        );
        assert_eq!(
            SerializableColor::parse_css("#ff800080"),
            Some(SerializableColor::new(255, 128, 0, 128))
        );
        assert_eq!(SerializableColor::parse_css("#12"), None);
    }

    #[test]
    fn test_parse_rgba() {
        assert_eq!(
            SerializableColor::parse_css("rgba(10, 20, 30, 0.5)"),
            Some(SerializableColor::new(10, 20, 30, 128))
        );
        assert_eq!(
            SerializableColor::parse_css("rgb(1,2,3)"),
            Some(SerializableColor::new(1, 2, 3, 255))
        );
        assert_eq!(SerializableColor::parse_css("transparent"), None);
    }

    #[test]
    fn test_css_alpha_survives_reparse() {
        for a in [0u8, 1, 64, 128, 200, 254] {
            let color = SerializableColor::new(5, 6, 7, a);
            assert_eq!(SerializableColor::parse_css(&color.to_css()), Some(color));
        }
    }

    #[test]
    fn test_peniko_conversion() {
        let color = SerializableColor::new(12, 34, 56, 255);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ObjectKind::from_type_name("i-text"), Some(ObjectKind::Textbox));
        assert_eq!(ObjectKind::from_type_name("Rect"), Some(ObjectKind::Rect));
        assert_eq!(ObjectKind::from_type_name("polygon"), None);
        assert_eq!(ObjectKind::Group.type_name(), "group");
    }

    #[test]
    fn test_walk_visits_group_members() {
        let group = Group::new(vec![
            SceneObject::Rect(Rectangle::new(0.0, 0.0, 10.0, 10.0)),
            SceneObject::Textbox(Textbox::new(0.0, 0.0, 10.0, "hi")),
        ]);
        let object = SceneObject::Group(group);
        let mut count = 0;
        object.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
    }
}
