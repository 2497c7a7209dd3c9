//! Conversion between scene objects and generic JSON object maps.

use crate::shapes::{
    Circle, Geometry, Group, Image, Interaction, Line, Metadata, ObjectKind, ObjectProps, OriginX,
    OriginY, Rectangle, SceneObject, SerializableColor, ShapeStyle, Textbox, Triangle,
};
use serde_json::{Map, Value, json};
use thiserror::Error;

// Common keys
const KEY_TYPE: &str = "type";
const KEY_VERSION: &str = "version";
const KEY_ORIGIN_X: &str = "originX";
const KEY_ORIGIN_Y: &str = "originY";
const KEY_LEFT: &str = "left";
const KEY_TOP: &str = "top";
const KEY_WIDTH: &str = "width";
const KEY_HEIGHT: &str = "height";
const KEY_SCALE_X: &str = "scaleX";
const KEY_SCALE_Y: &str = "scaleY";
const KEY_ANGLE: &str = "angle";

// Style keys
const KEY_FILL: &str = "fill";
const KEY_STROKE: &str = "stroke";
const KEY_STROKE_WIDTH: &str = "strokeWidth";
const KEY_STROKE_DASH_ARRAY: &str = "strokeDashArray";
const KEY_OPACITY: &str = "opacity";
const KEY_VISIBLE: &str = "visible";

// Interaction keys
const KEY_SELECTABLE: &str = "selectable";
const KEY_EVENTED: &str = "evented";
const KEY_HAS_CONTROLS: &str = "hasControls";
const KEY_HAS_ROTATING_POINT: &str = "hasRotatingPoint";
const KEY_LOCK_MOVEMENT_X: &str = "lockMovementX";
const KEY_LOCK_MOVEMENT_Y: &str = "lockMovementY";
const KEY_LOCK_SCALING_X: &str = "lockScalingX";
const KEY_LOCK_SCALING_Y: &str = "lockScalingY";
const KEY_LOCK_ROTATION: &str = "lockRotation";
const KEY_EXCLUDE_FROM_EXPORT: &str = "excludeFromExport";

// Rect keys
const KEY_RX: &str = "rx";
const KEY_RY: &str = "ry";

// Circle keys
const KEY_RADIUS: &str = "radius";

// Line keys
const KEY_X1: &str = "x1";
const KEY_Y1: &str = "y1";
const KEY_X2: &str = "x2";
const KEY_Y2: &str = "y2";

// Textbox keys
const KEY_TEXT: &str = "text";
const KEY_FONT_SIZE: &str = "fontSize";
const KEY_FONT_FAMILY: &str = "fontFamily";
const KEY_FONT_WEIGHT: &str = "fontWeight";
const KEY_FONT_STYLE: &str = "fontStyle";
const KEY_TEXT_ALIGN: &str = "textAlign";

// Image keys
const KEY_SRC: &str = "src";
const KEY_CROSS_ORIGIN: &str = "crossOrigin";

// Group keys
const KEY_OBJECTS: &str = "objects";

// Custom metadata keys
pub(crate) const KEY_ID: &str = "id";
pub(crate) const KEY_DB_FIELD: &str = "dbField";
pub(crate) const KEY_IS_ANCHOR: &str = "isAnchor";
pub(crate) const KEY_IS_QR_ANCHOR: &str = "isQRanchor";
pub(crate) const KEY_UNDELETEABLE: &str = "undeleteable";
pub(crate) const KEY_NAME: &str = "name";

/// Why a single object could not be reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("missing \"type\"")]
    MissingType,
    #[error("unsupported type \"{0}\"")]
    UnsupportedType(String),
}

/// An object dropped while reconstructing a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObject {
    /// Location in the document, e.g. `objects[3].objects[0]`.
    pub path: String,
    pub reason: String,
}

fn get_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite())
}

fn get_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn get_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn get_color(map: &Map<String, Value>, key: &str) -> Option<SerializableColor> {
    let raw = map.get(key)?.as_str()?;
    let color = SerializableColor::parse_css(raw);
    if color.is_none() && !raw.is_empty() && raw != "transparent" {
        log::debug!("Ignoring unsupported color {raw:?} for {key}");
    }
    color
}

fn color_value(color: Option<SerializableColor>) -> Value {
    color.map_or(Value::Null, |c| Value::String(c.to_css()))
}

/// Encode one custom property, or `None` when the name is not known.
fn custom_value(meta: &Metadata, key: &str) -> Option<Value> {
    let value = match key {
        KEY_ID => Value::String(meta.id.clone()),
        KEY_DB_FIELD => meta.db_field.clone().map_or(Value::Null, Value::String),
        KEY_IS_ANCHOR => Value::Bool(meta.is_anchor),
        KEY_IS_QR_ANCHOR => Value::Bool(meta.is_qr_anchor),
        KEY_UNDELETEABLE => Value::Bool(meta.undeleteable),
        KEY_NAME => meta.name.clone().map_or(Value::Null, Value::String),
        _ => return None,
    };
    Some(value)
}

/// Encode an object as a JSON map.
///
/// Only the core scene keys are written, plus the custom properties named in
/// `custom`. Metadata not listed there is lost, as is any unknown name.
pub fn object_to_value(object: &SceneObject, custom: &[&str]) -> Value {
    let props = object.props();
    let g = &props.geometry;
    let s = &props.style;
    let i = &props.interaction;

    let mut map = Map::new();
    map.insert(KEY_TYPE.into(), json!(object.kind().type_name()));
    map.insert(KEY_VERSION.into(), json!(crate::scene::SCENE_VERSION));
    map.insert(KEY_ORIGIN_X.into(), json!(g.origin_x.as_str()));
    map.insert(KEY_ORIGIN_Y.into(), json!(g.origin_y.as_str()));
    map.insert(KEY_LEFT.into(), json!(g.left));
    map.insert(KEY_TOP.into(), json!(g.top));
    map.insert(KEY_WIDTH.into(), json!(g.width));
    map.insert(KEY_HEIGHT.into(), json!(g.height));
    map.insert(KEY_SCALE_X.into(), json!(g.scale_x));
    map.insert(KEY_SCALE_Y.into(), json!(g.scale_y));
    map.insert(KEY_ANGLE.into(), json!(g.angle));

    map.insert(KEY_FILL.into(), color_value(s.fill));
    map.insert(KEY_STROKE.into(), color_value(s.stroke));
    map.insert(KEY_STROKE_WIDTH.into(), json!(s.stroke_width));
    map.insert(KEY_STROKE_DASH_ARRAY.into(), json!(s.stroke_dash_array));
    map.insert(KEY_OPACITY.into(), json!(s.opacity));
    map.insert(KEY_VISIBLE.into(), json!(s.visible));

    map.insert(KEY_SELECTABLE.into(), json!(i.selectable));
    map.insert(KEY_EVENTED.into(), json!(i.evented));
    map.insert(KEY_HAS_CONTROLS.into(), json!(i.has_controls));
    map.insert(KEY_HAS_ROTATING_POINT.into(), json!(i.has_rotating_point));
    map.insert(KEY_LOCK_MOVEMENT_X.into(), json!(i.lock_movement_x));
    map.insert(KEY_LOCK_MOVEMENT_Y.into(), json!(i.lock_movement_y));
    map.insert(KEY_LOCK_SCALING_X.into(), json!(i.lock_scaling_x));
    map.insert(KEY_LOCK_SCALING_Y.into(), json!(i.lock_scaling_y));
    map.insert(KEY_LOCK_ROTATION.into(), json!(i.lock_rotation));
    map.insert(KEY_EXCLUDE_FROM_EXPORT.into(), json!(i.exclude_from_export));

    match object {
        SceneObject::Rect(rect) => {
            map.insert(KEY_RX.into(), json!(rect.rx));
            map.insert(KEY_RY.into(), json!(rect.ry));
        }
        SceneObject::Circle(circle) => {
            map.insert(KEY_RADIUS.into(), json!(circle.radius));
        }
        SceneObject::Triangle(_) => {}
        SceneObject::Line(line) => {
            map.insert(KEY_X1.into(), json!(line.x1));
            map.insert(KEY_Y1.into(), json!(line.y1));
            map.insert(KEY_X2.into(), json!(line.x2));
            map.insert(KEY_Y2.into(), json!(line.y2));
        }
        SceneObject::Textbox(text) => {
            map.insert(KEY_TEXT.into(), json!(text.text));
            map.insert(KEY_FONT_SIZE.into(), json!(text.font_size));
            map.insert(KEY_FONT_FAMILY.into(), json!(text.font_family));
            map.insert(KEY_FONT_WEIGHT.into(), json!(text.font_weight));
            map.insert(KEY_FONT_STYLE.into(), json!(text.font_style));
            map.insert(KEY_TEXT_ALIGN.into(), json!(text.text_align));
        }
        SceneObject::Image(image) => {
            map.insert(KEY_SRC.into(), json!(image.src));
            map.insert(KEY_CROSS_ORIGIN.into(), json!(image.cross_origin));
        }
        SceneObject::Group(group) => {
            let members: Vec<Value> = group
                .objects
                .iter()
                .map(|child| object_to_value(child, custom))
                .collect();
            map.insert(KEY_OBJECTS.into(), Value::Array(members));
        }
    }

    for &key in custom {
        match custom_value(&props.meta, key) {
            Some(value) => {
                map.insert(key.to_string(), value);
            }
            None => log::debug!("Unknown custom property {key:?} not serialized"),
        }
    }

    Value::Object(map)
}

fn props_from_map(map: &Map<String, Value>) -> ObjectProps {
    let defaults = Interaction::default();
    let style_defaults = ShapeStyle::default();
    let geometry = Geometry {
        left: get_f64(map, KEY_LEFT).unwrap_or(0.0),
        top: get_f64(map, KEY_TOP).unwrap_or(0.0),
        width: get_f64(map, KEY_WIDTH).unwrap_or(0.0),
        height: get_f64(map, KEY_HEIGHT).unwrap_or(0.0),
        scale_x: get_f64(map, KEY_SCALE_X).unwrap_or(1.0),
        scale_y: get_f64(map, KEY_SCALE_Y).unwrap_or(1.0),
        angle: get_f64(map, KEY_ANGLE).unwrap_or(0.0),
        origin_x: map
            .get(KEY_ORIGIN_X)
            .and_then(Value::as_str)
            .and_then(OriginX::parse)
            .unwrap_or_default(),
        origin_y: map
            .get(KEY_ORIGIN_Y)
            .and_then(Value::as_str)
            .and_then(OriginY::parse)
            .unwrap_or_default(),
    };
    let style = ShapeStyle {
        fill: if map.contains_key(KEY_FILL) {
            get_color(map, KEY_FILL)
        } else {
            style_defaults.fill
        },
        stroke: get_color(map, KEY_STROKE),
        stroke_width: get_f64(map, KEY_STROKE_WIDTH).unwrap_or(style_defaults.stroke_width),
        stroke_dash_array: map
            .get(KEY_STROKE_DASH_ARRAY)
            .and_then(Value::as_array)
            .map(|dashes| dashes.iter().filter_map(Value::as_f64).collect()),
        opacity: get_f64(map, KEY_OPACITY).unwrap_or(1.0),
        visible: get_bool(map, KEY_VISIBLE).unwrap_or(true),
    };
    let interaction = Interaction {
        selectable: get_bool(map, KEY_SELECTABLE).unwrap_or(defaults.selectable),
        evented: get_bool(map, KEY_EVENTED).unwrap_or(defaults.evented),
        has_controls: get_bool(map, KEY_HAS_CONTROLS).unwrap_or(defaults.has_controls),
        has_rotating_point: get_bool(map, KEY_HAS_ROTATING_POINT)
            .unwrap_or(defaults.has_rotating_point),
        lock_movement_x: get_bool(map, KEY_LOCK_MOVEMENT_X).unwrap_or(false),
        lock_movement_y: get_bool(map, KEY_LOCK_MOVEMENT_Y).unwrap_or(false),
        lock_scaling_x: get_bool(map, KEY_LOCK_SCALING_X).unwrap_or(false),
        lock_scaling_y: get_bool(map, KEY_LOCK_SCALING_Y).unwrap_or(false),
        lock_rotation: get_bool(map, KEY_LOCK_ROTATION).unwrap_or(false),
        exclude_from_export: get_bool(map, KEY_EXCLUDE_FROM_EXPORT).unwrap_or(false),
    };
    let meta = Metadata {
        id: get_string(map, KEY_ID).unwrap_or_default(),
        db_field: get_string(map, KEY_DB_FIELD),
        is_anchor: get_bool(map, KEY_IS_ANCHOR).unwrap_or(false),
        is_qr_anchor: get_bool(map, KEY_IS_QR_ANCHOR).unwrap_or(false),
        undeleteable: get_bool(map, KEY_UNDELETEABLE).unwrap_or(false),
        name: get_string(map, KEY_NAME),
    };
    ObjectProps {
        geometry,
        style,
        interaction,
        meta,
    }
}

/// Reconstruct an object from a JSON map.
///
/// Missing numeric fields default to 0 (1 for scales and opacity). Group
/// members that cannot be reconstructed are dropped and recorded in
/// `skipped`; the group itself survives.
pub fn object_from_value(
    value: &Value,
    path: &str,
    skipped: &mut Vec<SkippedObject>,
) -> Result<SceneObject, ObjectError> {
    let map = value.as_object().ok_or(ObjectError::NotAnObject)?;
    let type_name = map
        .get(KEY_TYPE)
        .and_then(Value::as_str)
        .ok_or(ObjectError::MissingType)?;
    let kind = ObjectKind::from_type_name(type_name)
        .ok_or_else(|| ObjectError::UnsupportedType(type_name.to_string()))?;
    let props = props_from_map(map);

    let object = match kind {
        ObjectKind::Rect => {
            let mut rect = Rectangle::from_props(props);
            rect.rx = get_f64(map, KEY_RX).unwrap_or(0.0);
            rect.ry = get_f64(map, KEY_RY).unwrap_or(0.0);
            SceneObject::Rect(rect)
        }
        ObjectKind::Circle => {
            let radius = get_f64(map, KEY_RADIUS).unwrap_or(props.geometry.width / 2.0);
            SceneObject::Circle(Circle::from_props(props, radius))
        }
        ObjectKind::Triangle => SceneObject::Triangle(Triangle::from_props(props)),
        ObjectKind::Line => SceneObject::Line(Line::from_props(
            props,
            get_f64(map, KEY_X1).unwrap_or(0.0),
            get_f64(map, KEY_Y1).unwrap_or(0.0),
            get_f64(map, KEY_X2).unwrap_or(0.0),
            get_f64(map, KEY_Y2).unwrap_or(0.0),
        )),
        ObjectKind::Textbox => {
            let mut text = Textbox::from_props(props, get_string(map, KEY_TEXT).unwrap_or_default());
            if let Some(size) = get_f64(map, KEY_FONT_SIZE) {
                text.font_size = size;
            }
            if let Some(family) = get_string(map, KEY_FONT_FAMILY) {
                text.font_family = family;
            }
            if let Some(weight) = get_string(map, KEY_FONT_WEIGHT) {
                text.font_weight = weight;
            }
            if let Some(style) = get_string(map, KEY_FONT_STYLE) {
                text.font_style = style;
            }
            if let Some(align) = get_string(map, KEY_TEXT_ALIGN) {
                text.text_align = align;
            }
            SceneObject::Textbox(text)
        }
        ObjectKind::Image => {
            let mut image = Image::from_props(props, get_string(map, KEY_SRC).unwrap_or_default());
            image.cross_origin = get_string(map, KEY_CROSS_ORIGIN);
            SceneObject::Image(image)
        }
        ObjectKind::Group => {
            let members = map
                .get(KEY_OBJECTS)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let children = objects_from_values(members, path, skipped);
            SceneObject::Group(Group::from_props(props, children))
        }
    };
    Ok(object)
}

/// Reconstruct a list of objects, skipping (and recording) those that fail.
pub fn objects_from_values(
    values: &[Value],
    parent_path: &str,
    skipped: &mut Vec<SkippedObject>,
) -> Vec<SceneObject> {
    let mut objects = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let path = format!("{parent_path}{KEY_OBJECTS}[{index}]");
        match object_from_value(value, &format!("{path}."), skipped) {
            Ok(object) => objects.push(object),
            Err(e) => {
                log::warn!("Skipping {path}: {e}");
                skipped.push(SkippedObject {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::CUSTOM_PROPERTIES;

    #[test]
    fn test_missing_geometry_defaults() {
        let value = json!({ "type": "rect" });
        let mut skipped = Vec::new();
        let object = object_from_value(&value, "", &mut skipped).unwrap();
        let g = object.geometry();
        assert_eq!(g.left, 0.0);
        assert_eq!(g.width, 0.0);
        assert_eq!(g.scale_x, 1.0);
        assert_eq!(g.scale_y, 1.0);
        assert_eq!(object.props().style.opacity, 1.0);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let value = json!({ "type": "rect", "left": "12.5", "scaleX": "2" });
        let object = object_from_value(&value, "", &mut Vec::new()).unwrap();
        assert_eq!(object.geometry().left, 12.5);
        assert_eq!(object.geometry().scale_x, 2.0);
    }

    #[test]
    fn test_custom_properties_only_when_listed() {
        let mut rect = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        rect.props.meta.db_field = Some("email".to_string());
        let object = SceneObject::Rect(rect);

        let bare = object_to_value(&object, &[]);
        assert!(bare.get(KEY_DB_FIELD).is_none());
        assert!(bare.get(KEY_ID).is_none());

        let full = object_to_value(&object, CUSTOM_PROPERTIES);
        assert_eq!(full[KEY_DB_FIELD], json!("email"));
        assert_eq!(full[KEY_IS_ANCHOR], json!(false));
    }

    #[test]
    fn test_unknown_type_is_error() {
        let value = json!({ "type": "polygon" });
        let err = object_from_value(&value, "", &mut Vec::new()).unwrap_err();
        assert_eq!(err, ObjectError::UnsupportedType("polygon".to_string()));
    }

    #[test]
    fn test_bad_group_member_is_skipped() {
        crate::test_util::init_logger();
        let value = json!({
            "type": "group",
            "objects": [
                { "type": "rect", "width": 10 },
                { "type": "sparkle" },
                "garbage"
            ]
        });
        let mut skipped = Vec::new();
        let object = object_from_value(&value, "objects[0].", &mut skipped).unwrap();
        assert_eq!(object.as_group().unwrap().objects.len(), 1);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].path, "objects[0].objects[1]");
        assert_eq!(skipped[1].path, "objects[0].objects[2]");
    }

    #[test]
    fn test_legacy_text_type() {
        let value = json!({ "type": "i-text", "text": "Hello", "fontSize": 30 });
        let object = object_from_value(&value, "", &mut Vec::new()).unwrap();
        let text = object.as_textbox().unwrap();
        assert_eq!(text.text, "Hello");
        assert_eq!(text.font_size, 30.0);
    }
}
