//! Scene serialization: JSON in, JSON out, with custom metadata preserved.
//!
//! The format is a JSON object `{ "version", "objects": [...] }` where each
//! object is a map keyed by camelCase property names. Custom metadata is only
//! written for the keys in [`CUSTOM_PROPERTIES`].

mod convert;
mod loader;

pub use convert::{
    ObjectError, SkippedObject, object_from_value, object_to_value, objects_from_values,
};
pub use loader::{AssetCache, AssetError, AssetLoader, LoadGate, LoadTicket};

use crate::scene::{SCENE_VERSION, Scene};
use crate::shapes::SceneObject;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Metadata keys that survive serialization. Anything else is dropped.
pub const CUSTOM_PROPERTIES: &[&str] = &[
    convert::KEY_ID,
    convert::KEY_DB_FIELD,
    convert::KEY_IS_ANCHOR,
    convert::KEY_IS_QR_ANCHOR,
    convert::KEY_UNDELETEABLE,
    convert::KEY_NAME,
];

/// Serialization errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid scene JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Unexpected scene layout: {0}")]
    Layout(String),
    #[error("Failed to encode scene: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// A reconstructed scene and the objects that could not be restored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedScene {
    pub scene: Scene,
    pub skipped: Vec<SkippedObject>,
}

/// Encode a scene as a JSON value.
pub fn to_value(scene: &Scene) -> Value {
    let objects = scene
        .objects
        .iter()
        .map(|object| object_to_value(object, CUSTOM_PROPERTIES))
        .collect();
    let mut map = Map::new();
    map.insert("version".into(), Value::String(scene.version.clone()));
    map.insert("objects".into(), Value::Array(objects));
    Value::Object(map)
}

/// Encode a scene as a JSON string.
pub fn serialize(scene: &Scene) -> Result<String, BridgeError> {
    serde_json::to_string(&to_value(scene)).map_err(BridgeError::Encode)
}

/// Reconstruct a scene without resolving image assets.
///
/// A blank document is an empty scene. A JSON string holding the scene
/// (double-encoded) is unwrapped. Objects that fail to reconstruct are
/// skipped and reported. The background is pinned to index 0 and made
/// inert; the QR anchor is left where it was stored.
pub fn parse_scene(json: &str) -> Result<LoadedScene, BridgeError> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        log::debug!("Blank design, starting with an empty scene");
        return Ok(LoadedScene::default());
    }

    let mut value: Value = serde_json::from_str(trimmed).map_err(BridgeError::Parse)?;
    if let Some(inner) = value.as_str().map(str::to_owned) {
        value = serde_json::from_str(&inner).map_err(BridgeError::Parse)?;
    }
    let map = value
        .as_object()
        .ok_or_else(|| BridgeError::Layout("top level is not an object".to_string()))?;

    let version = map
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(SCENE_VERSION)
        .to_string();

    let mut skipped = Vec::new();
    let objects = match map.get("objects") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => objects_from_values(values, "", &mut skipped),
        Some(_) => {
            return Err(BridgeError::Layout(
                "\"objects\" is not an array".to_string(),
            ));
        }
    };

    let mut scene = Scene { version, objects };
    if scene.pin_background() {
        log::debug!("Repaired background placement");
    }
    Ok(LoadedScene { scene, skipped })
}

/// Reconstruct a scene and resolve its images through `loader`.
///
/// Images whose source fails to load are dropped and reported alongside the
/// objects skipped during parsing. Images stored without a size take the
/// asset's natural size.
pub async fn deserialize<L: AssetLoader + ?Sized>(
    json: &str,
    loader: &L,
) -> Result<LoadedScene, BridgeError> {
    let mut loaded = parse_scene(json)?;

    let mut sources: Vec<String> = Vec::new();
    loaded.scene.walk(&mut |object| {
        if let SceneObject::Image(image) = object {
            if !sources.contains(&image.src) {
                sources.push(image.src.clone());
            }
        }
    });

    let mut assets = HashMap::new();
    let mut failed = HashMap::new();
    for src in sources {
        match loader.load(&src).await {
            Ok(asset) => {
                assets.insert(src, asset);
            }
            Err(e) => {
                log::warn!("Image failed to load: {e}");
                failed.insert(src, e.to_string());
            }
        }
    }

    loaded.scene.walk_mut(&mut |object| {
        if let SceneObject::Image(image) = object {
            if let Some(asset) = assets.get(&image.src) {
                let g = &mut image.props.geometry;
                if g.width <= 0.0 || g.height <= 0.0 {
                    g.width = f64::from(asset.width);
                    g.height = f64::from(asset.height);
                }
            }
        }
    });

    if !failed.is_empty() {
        drop_failed_images(&mut loaded.scene.objects, "", &failed, &mut loaded.skipped);
    }
    Ok(loaded)
}

fn drop_failed_images(
    objects: &mut Vec<SceneObject>,
    parent_path: &str,
    failed: &HashMap<String, String>,
    skipped: &mut Vec<SkippedObject>,
) {
    let mut kept = Vec::with_capacity(objects.len());
    for (index, mut object) in std::mem::take(objects).into_iter().enumerate() {
        let path = format!("{parent_path}objects[{index}]");
        if let SceneObject::Image(image) = &object {
            if let Some(reason) = failed.get(&image.src) {
                log::warn!("Skipping {path}: {reason}");
                skipped.push(SkippedObject {
                    path,
                    reason: reason.clone(),
                });
                continue;
            }
        }
        if let SceneObject::Group(group) = &mut object {
            drop_failed_images(&mut group.objects, &format!("{path}."), failed, skipped);
        }
        kept.push(object);
    }
    *objects = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::ObjectFactory;
    use crate::shapes::{
        BACKGROUND_ID, Circle, Group, Image, ImageAsset, Line, ObjectKind, Rectangle,
        SerializableColor, Textbox, Triangle,
    };
    use crate::test_util::block_on;
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();

        let background = ObjectFactory::background(&ImageAsset::new("bg.png", 1700, 1202));
        scene.add(background);

        let mut rect = Rectangle::new(40.0, 50.0, 120.0, 80.0);
        rect.rx = 4.0;
        rect.props.geometry.angle = 15.0;
        rect.props.style.stroke = Some(SerializableColor::new(10, 20, 30, 255));
        scene.add(SceneObject::Rect(rect));

        scene.add(SceneObject::Circle(Circle::new(300.0, 100.0, 25.0)));
        scene.add(SceneObject::Triangle(Triangle::new(500.0, 300.0, 60.0, 40.0)));
        scene.add(SceneObject::Line(Line::new(
            Point::new(10.0, 10.0),
            Point::new(200.0, 40.0),
        )));

        let mut text = Textbox::new(100.0, 400.0, 300.0, "Certificate of Completion");
        text.font_size = 32.0;
        text.props.meta.name = Some("title".to_string());
        scene.add(SceneObject::Textbox(text));

        scene.add(ObjectFactory::anchor("email"));
        scene.add(ObjectFactory::signature_block("42", "Dean"));
        scene.add(SceneObject::Group(Group::new(vec![
            SceneObject::Rect(Rectangle::new(0.0, 0.0, 10.0, 10.0)),
            SceneObject::Circle(Circle::new(20.0, 20.0, 5.0)),
        ])));
        scene.add(ObjectFactory::qr_anchor());
        scene
    }

    #[test]
    fn test_roundtrip_preserves_objects_and_metadata() {
        let scene = sample_scene();
        let json = serialize(&scene).unwrap();
        let loaded = parse_scene(&json).unwrap();

        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.scene, scene);
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let json = serialize(&sample_scene()).unwrap();
        let again = serialize(&parse_scene(&json).unwrap().scene).unwrap();
        assert_eq!(json, again);
    }

    #[test]
    fn test_group_members_keep_custom_properties() {
        let scene = sample_scene();
        let value = to_value(&scene);
        let anchor = value["objects"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["id"] == "PLACEHOLDER-email")
            .unwrap();
        assert_eq!(anchor["isAnchor"], Value::Bool(true));
        for member in anchor["objects"].as_array().unwrap() {
            assert!(member.get("id").is_some());
            assert!(member.get("isQRanchor").is_some());
        }
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            parse_scene("{not json"),
            Err(BridgeError::Parse(_))
        ));
        assert!(matches!(parse_scene("[1,2]"), Err(BridgeError::Layout(_))));
        assert!(matches!(
            parse_scene(r#"{"objects": 3}"#),
            Err(BridgeError::Layout(_))
        ));
    }

    #[test]
    fn test_blank_and_empty_documents() {
        assert!(parse_scene("").unwrap().scene.is_empty());
        assert!(parse_scene("{}").unwrap().scene.is_empty());
        let empty = serialize(&Scene::new()).unwrap();
        let loaded = parse_scene(&empty).unwrap();
        assert!(loaded.scene.is_empty());
        assert_eq!(loaded.scene.version, SCENE_VERSION);
    }

    #[test]
    fn test_double_encoded_scene() {
        let inner = r#"{"objects":[{"type":"rect","id":"r1"}]}"#;
        let outer = serde_json::to_string(inner).unwrap();
        let loaded = parse_scene(&outer).unwrap();
        assert_eq!(loaded.scene.objects[0].id(), "r1");
    }

    #[test]
    fn test_partial_scene_keeps_valid_objects() {
        let json = r#"{"objects":[
            {"type":"rect","id":"a"},
            {"type":"hexagon","id":"b"},
            42,
            {"type":"circle","id":"c","radius":5}
        ]}"#;
        let loaded = parse_scene(json).unwrap();
        let ids: Vec<&str> = loaded.scene.objects.iter().map(SceneObject::id).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(loaded.skipped.len(), 2);
        assert_eq!(loaded.skipped[0].path, "objects[1]");
    }

    #[test]
    fn test_load_repairs_background() {
        let json = r#"{"objects":[
            {"type":"rect","id":"a"},
            {"type":"image","id":"background-image","src":"bg.png","selectable":true,"evented":true}
        ]}"#;
        let loaded = parse_scene(json).unwrap();
        let background = &loaded.scene.objects[0];
        assert_eq!(background.id(), BACKGROUND_ID);
        assert!(!background.props().interaction.selectable);
        assert!(!background.props().interaction.evented);
    }

    #[test]
    fn test_load_does_not_pin_qr_anchor() {
        let json = r#"{"objects":[
            {"type":"rect","id":"qr","isQRanchor":true},
            {"type":"rect","id":"a"}
        ]}"#;
        let loaded = parse_scene(json).unwrap();
        assert_eq!(loaded.scene.objects[0].id(), "qr");
    }

    #[test]
    fn test_unlisted_metadata_is_dropped() {
        let mut rect = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        rect.props.meta.name = Some("label".to_string());
        let value = object_to_value(&SceneObject::Rect(rect), &["id"]);
        let parsed = object_from_value(&value, "", &mut Vec::new()).unwrap();
        assert_eq!(parsed.meta().name, None);
    }

    #[test]
    fn test_deserialize_resolves_image_sizes() {
        let json = r#"{"objects":[{"type":"image","id":"logo","src":"logo.png"}]}"#;
        let loader = AssetCache::new().with("logo.png", 64, 32);
        let loaded = block_on(deserialize(json, &loader)).unwrap();
        let g = loaded.scene.objects[0].geometry();
        assert_eq!((g.width, g.height), (64.0, 32.0));
    }

    #[test]
    fn test_deserialize_skips_unloadable_images() {
        crate::test_util::init_logger();
        let json = r#"{"objects":[
            {"type":"image","id":"gone","src":"missing.png"},
            {"type":"group","id":"g","objects":[
                {"type":"image","id":"nested","src":"missing.png"},
                {"type":"rect","id":"r"}
            ]},
            {"type":"rect","id":"a"}
        ]}"#;
        let loaded = block_on(deserialize(json, &AssetCache::new())).unwrap();
        let ids: Vec<&str> = loaded.scene.objects.iter().map(SceneObject::id).collect();
        assert_eq!(ids, vec!["g", "a"]);
        let group = loaded.scene.objects[0].as_group().unwrap();
        assert_eq!(group.objects.len(), 1);
        assert_eq!(group.objects[0].kind(), ObjectKind::Rect);
        assert_eq!(loaded.skipped.len(), 2);
    }

    #[test]
    fn test_image_keeps_stored_size() {
        let asset = ImageAsset::new("photo.png", 400, 300);
        let mut image = Image::new(&asset, 0.0, 0.0);
        image.props.meta.id = "photo".to_string();
        image.fit_within(kurbo::Size::new(200.0, 200.0));
        let mut scene = Scene::new();
        scene.add(SceneObject::Image(image.clone()));

        let json = serialize(&scene).unwrap();
        let loader = AssetCache::new().with("photo.png", 400, 300);
        let loaded = block_on(deserialize(&json, &loader)).unwrap();
        assert_eq!(loaded.scene.objects[0], SceneObject::Image(image));
    }
}
