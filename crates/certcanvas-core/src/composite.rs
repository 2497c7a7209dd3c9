//! Object factory and the anchor composite.

use crate::scene::{CANONICAL_HEIGHT, CANONICAL_WIDTH, canonical_size};
use crate::shapes::{
    BACKGROUND_ID, Circle, Geometry, Group, Image, ImageAsset, Interaction, Line, Metadata,
    ObjectProps, OriginX, OriginY, Rectangle, SceneObject, SerializableColor, ShapeStyle, Textbox,
    Triangle, generate_id, placeholder_id, signature_id,
};
use kurbo::{Point, Size};

/// Outline color of placeholder boxes.
const PLACEHOLDER_STROKE: SerializableColor = SerializableColor {
    r: 0x33,
    g: 0x66,
    b: 0xcc,
    a: 255,
};

/// Default size of a data anchor box.
const ANCHOR_SIZE: Size = Size::new(240.0, 40.0);

/// Default size of a signature block. 16:9.
const SIGNATURE_SIZE: Size = Size::new(160.0, 90.0);

/// Side of the square QR placeholder.
const QR_SIDE: f64 = 100.0;

const LABEL_FONT_SIZE: f64 = 16.0;

/// Primitive shapes the toolbar can add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Rect,
    Circle,
    Triangle,
    Line,
    Text,
}

fn canvas_center() -> Point {
    Point::new(CANONICAL_WIDTH / 2.0, CANONICAL_HEIGHT / 2.0)
}

/// Center-origin geometry of `size` centered on `center`.
fn centered(center: Point, size: Size) -> Geometry {
    Geometry {
        left: center.x,
        top: center.y,
        width: size.width,
        height: size.height,
        origin_x: OriginX::Center,
        origin_y: OriginY::Center,
        ..Geometry::default()
    }
}

fn label(text: &str, width: f64) -> Textbox {
    let mut label = Textbox::new(0.0, 0.0, width, text);
    label.font_size = LABEL_FONT_SIZE;
    label.text_align = "center".to_string();
    label.props.style.fill = Some(PLACEHOLDER_STROKE);
    label.fit_height();
    label
}

/// Builds new scene objects with baseline geometry.
pub struct ObjectFactory;

impl ObjectFactory {
    /// A primitive near the canvas center, filled (or stroked, for lines)
    /// with `color`.
    pub fn create(kind: Primitive, color: SerializableColor) -> SceneObject {
        let c = canvas_center();
        match kind {
            Primitive::Rect => {
                let mut rect = Rectangle::new(c.x - 75.0, c.y - 50.0, 150.0, 100.0);
                rect.props.style.fill = Some(color);
                SceneObject::Rect(rect)
            }
            Primitive::Circle => {
                let mut circle = Circle::new(c.x - 50.0, c.y - 50.0, 50.0);
                circle.props.style.fill = Some(color);
                SceneObject::Circle(circle)
            }
            Primitive::Triangle => {
                let mut triangle = Triangle::new(c.x - 50.0, c.y - 50.0, 100.0, 100.0);
                triangle.props.style.fill = Some(color);
                SceneObject::Triangle(triangle)
            }
            Primitive::Line => {
                let mut line = Line::new(Point::new(c.x - 100.0, c.y), Point::new(c.x + 100.0, c.y));
                line.props.style.stroke = Some(color);
                SceneObject::Line(line)
            }
            Primitive::Text => {
                let mut text = Textbox::new(c.x - 100.0, c.y - 14.0, 200.0, "Text");
                text.props.style.fill = Some(color);
                SceneObject::Textbox(text)
            }
        }
    }

    /// Dashed data anchor bound to `column`, centered on the canvas.
    pub fn anchor(column: &str) -> SceneObject {
        AnchorComposite::new(column, canvas_center()).into_object()
    }

    /// Standalone text anchor bound to `column`.
    pub fn text_anchor(column: &str) -> SceneObject {
        let c = canvas_center();
        let mut text = Textbox::new(c.x - ANCHOR_SIZE.width / 2.0, c.y, ANCHOR_SIZE.width, column);
        text.text_align = "center".to_string();
        text.props.meta = Metadata {
            id: placeholder_id(column),
            db_field: Some(column.to_string()),
            is_anchor: true,
            ..Metadata::default()
        };
        SceneObject::Textbox(text)
    }

    /// 16:9 dashed signature block labelled with the signer's name.
    pub fn signature_block(signer_id: &str, display_name: &str) -> SceneObject {
        let c = Point::new(CANONICAL_WIDTH / 2.0, CANONICAL_HEIGHT * 0.75);
        let mut frame = Rectangle::from_props(ObjectProps {
            geometry: centered(c, SIGNATURE_SIZE),
            style: ShapeStyle::dashed_outline(PLACEHOLDER_STROKE),
            ..ObjectProps::default()
        });
        frame.props.meta.id = generate_id("rect");

        let mut text = label(display_name, SIGNATURE_SIZE.width);
        text.props.geometry.set_center(c);

        let mut group = Group::new(vec![SceneObject::Rect(frame), SceneObject::Textbox(text)]);
        group.props.meta.id = signature_id(signer_id, display_name);
        group.props.meta.name = Some(display_name.to_string());
        SceneObject::Group(group)
    }

    /// Square QR placeholder in the bottom-right corner.
    pub fn qr_anchor() -> SceneObject {
        let mut qr = Rectangle::new(
            CANONICAL_WIDTH - QR_SIDE - 20.0,
            CANONICAL_HEIGHT - QR_SIDE - 20.0,
            QR_SIDE,
            QR_SIDE,
        );
        qr.props.style = ShapeStyle::dashed_outline(PLACEHOLDER_STROKE);
        qr.props.meta = Metadata {
            id: generate_id("qr"),
            is_qr_anchor: true,
            undeleteable: true,
            name: Some("QR Code".to_string()),
            ..Metadata::default()
        };
        qr.props.interaction.lock_rotation = true;
        qr.props.interaction.has_rotating_point = false;
        SceneObject::Rect(qr)
    }

    /// Background image stretched over the whole canvas.
    pub fn background(asset: &ImageAsset) -> SceneObject {
        let mut image = Image::new(asset, 0.0, 0.0);
        image.stretch_to(canonical_size());
        image.props.meta.id = BACKGROUND_ID.to_string();
        image.props.interaction = Interaction::inert();
        SceneObject::Image(image)
    }

    /// Image placed at the canvas center, shrunk to fit half the canvas.
    pub fn image(asset: &ImageAsset) -> SceneObject {
        let mut image = Image::new(asset, 0.0, 0.0);
        image.fit_within(Size::new(CANONICAL_WIDTH / 2.0, CANONICAL_HEIGHT / 2.0));
        image.props.geometry.set_center(canvas_center());
        SceneObject::Image(image)
    }
}

/// A data anchor: dashed box plus label, edited as one unit.
///
/// Both members are held in scene coordinates. The label follows the box's
/// center and angle but never its scale, so text size stays stable while
/// the box is resized.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorComposite {
    pub meta: Metadata,
    pub rect: Rectangle,
    pub text: Textbox,
}

impl AnchorComposite {
    pub fn new(column: &str, center: Point) -> Self {
        let mut rect = Rectangle::from_props(ObjectProps {
            geometry: centered(center, ANCHOR_SIZE),
            style: ShapeStyle::dashed_outline(PLACEHOLDER_STROKE),
            ..ObjectProps::default()
        });
        rect.props.meta.id = generate_id("rect");

        let mut composite = Self {
            meta: Metadata {
                id: placeholder_id(column),
                db_field: Some(column.to_string()),
                is_anchor: true,
                ..Metadata::default()
            },
            rect,
            text: label(column, ANCHOR_SIZE.width),
        };
        composite.sync_text();
        composite
    }

    /// Rebuild from a stored anchor group. `None` unless the group holds a
    /// rectangle and a text member.
    pub fn from_group(group: &Group) -> Option<Self> {
        let parent = group.props.geometry;
        let to_scene = |member: &Geometry| {
            let mut g = *member;
            let center = parent.transform() * member.center();
            g.scale_x *= parent.scale_x;
            g.scale_y *= parent.scale_y;
            g.angle += parent.angle;
            g.set_center(center);
            g
        };

        let mut rect = group.rect()?.clone();
        rect.props.geometry = to_scene(&rect.props.geometry);
        let mut text = group.text()?.clone();
        text.props.geometry = to_scene(&text.props.geometry);

        Some(Self {
            meta: group.props.meta.clone(),
            rect,
            text,
        })
    }

    pub fn column(&self) -> Option<&str> {
        self.meta.bound_column()
    }

    pub fn center(&self) -> Point {
        self.rect.props.geometry.center()
    }

    pub fn move_to(&mut self, center: Point) {
        self.rect.props.geometry.set_center(center);
        self.sync_text();
    }

    /// Set the box's scale factors around its center.
    pub fn scale_to(&mut self, scale_x: f64, scale_y: f64) {
        let g = &mut self.rect.props.geometry;
        let center = g.center();
        g.scale_x = scale_x;
        g.scale_y = scale_y;
        g.set_center(center);
        self.sync_text();
    }

    pub fn rotate_to(&mut self, angle: f64) {
        self.rect.props.geometry.rotate_about_center(angle);
        self.sync_text();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text.set_text(text);
        self.sync_text();
    }

    fn sync_text(&mut self) {
        let rect = self.rect.props.geometry;
        let g = &mut self.text.props.geometry;
        g.angle = rect.angle;
        g.set_center(rect.center());
    }

    /// Store as a group centered on the box, members in group space.
    pub fn into_object(self) -> SceneObject {
        let rect_g = self.rect.props.geometry;
        let center = rect_g.center();
        let size = rect_g.scaled_size();

        let mut group_geometry = centered(center, size);
        group_geometry.angle = rect_g.angle;

        let to_local = |member: &Geometry| {
            let mut g = *member;
            let offset = member.center() - center;
            g.angle -= rect_g.angle;
            let (sin, cos) = (-rect_g.angle).to_radians().sin_cos();
            let local = Point::new(
                offset.x * cos - offset.y * sin,
                offset.x * sin + offset.y * cos,
            );
            g.set_center(local);
            g
        };

        let mut rect = self.rect;
        rect.props.geometry = to_local(&rect.props.geometry);
        let mut text = self.text;
        text.props.geometry = to_local(&text.props.geometry);

        let mut props = ObjectProps::new(group_geometry);
        props.style.fill = None;
        props.meta = self.meta;
        SceneObject::Group(Group::from_props(
            props,
            vec![SceneObject::Rect(rect), SceneObject::Textbox(text)],
        ))
    }
}
