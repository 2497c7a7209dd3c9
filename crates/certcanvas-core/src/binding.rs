//! Binding recipient data to anchors and signatures to signature blocks.
//!
//! Both operations mutate a working copy of a scene (a preview or a signing
//! view), never the canonical design.

use crate::scene::Scene;
use crate::shapes::{ObjectRole, SIGNATURE_PREFIX, SceneObject, signature_prefix_for};
use kurbo::{Affine, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Allowed deviation from 16:9 when recognising unnamed signature blocks.
pub const SIGNATURE_ASPECT_TOLERANCE: f64 = 0.3;

/// Aspect of a signature block placeholder.
pub const SIGNATURE_BLOCK_ASPECT: f64 = 16.0 / 9.0;

/// Pixel size of rendered signature images.
pub const SIGNATURE_IMAGE_SIZE: Size = Size::new(800.0, 450.0);

/// Width of the fallback overlay as a fraction of the container.
pub const FALLBACK_WIDTH_RATIO: f64 = 0.35;

/// One recipient's data row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Map::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.data.insert(column.to_string(), value.into());
        self
    }

    /// Display text for a column. `None` when absent or null.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.data.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Write record values into every data anchor. Returns how many anchors
/// were filled. Anchors whose column is missing keep their text.
pub fn fill_anchors(scene: &mut Scene, record: &Record) -> usize {
    let mut filled = 0;
    scene.walk_mut(&mut |object| {
        if !object.meta().is_anchor {
            return;
        }
        let Some(column) = object.meta().bound_column().map(str::to_owned) else {
            return;
        };
        let Some(value) = record.text(&column) else {
            log::debug!("Record {} has no value for {column}", record.id);
            return;
        };
        match object {
            SceneObject::Group(group) => {
                if let Some(text) = group.text_mut() {
                    let center = text.props.geometry.center();
                    text.set_text(value);
                    text.props.geometry.set_center(center);
                    filled += 1;
                }
            }
            SceneObject::Textbox(text) => {
                text.set_text(value);
                filled += 1;
            }
            _ => {}
        }
    });
    filled
}

/// Columns referenced by data anchors, in scene order, without duplicates.
pub fn anchor_columns(scene: &Scene) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    scene.walk(&mut |object| {
        if let ObjectRole::DataAnchor { column } = object.role() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    });
    columns
}

/// Order record columns: those listed in `anchors` first, in that order,
/// then the rest alphabetically.
pub fn column_order<'a>(
    anchors: &[String],
    columns: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut rest: Vec<String> = columns.into_iter().map(str::to_owned).collect();
    rest.sort();
    rest.dedup();
    let mut ordered: Vec<String> = anchors
        .iter()
        .filter(|anchor| rest.contains(anchor))
        .cloned()
        .collect();
    ordered.dedup();
    rest.retain(|column| !ordered.contains(column));
    ordered.extend(rest);
    ordered
}

/// How a signature block was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// Id is `SIGNATURE-<signerId>` or starts with `SIGNATURE-<signerId>-`.
    ExactSigner,
    /// First id starting with `SIGNATURE-`.
    AnyPrefix,
    /// A group holding a roughly 16:9 rectangle.
    AspectHeuristic,
}

/// Index path from the scene root to a nested object.
type ObjectPath = Vec<usize>;

fn find_path(
    objects: &[SceneObject],
    matches: &impl Fn(&SceneObject) -> bool,
    path: &mut ObjectPath,
) -> bool {
    for (index, object) in objects.iter().enumerate() {
        path.push(index);
        if matches(object) {
            return true;
        }
        if let SceneObject::Group(group) = object {
            if find_path(&group.objects, matches, path) {
                return true;
            }
        }
        path.pop();
    }
    false
}

/// The object at `path` and the transform of its parent chain.
fn resolve<'a>(objects: &'a [SceneObject], path: &[usize]) -> Option<(&'a SceneObject, Affine)> {
    let (&last, parents) = path.split_last()?;
    let mut transform = Affine::IDENTITY;
    let mut level = objects;
    for &index in parents {
        let group = level.get(index)?.as_group()?;
        transform = transform * group.props.geometry.transform();
        level = &group.objects;
    }
    Some((level.get(last)?, transform))
}

fn resolve_mut<'a>(objects: &'a mut [SceneObject], path: &[usize]) -> Option<&'a mut SceneObject> {
    let (&first, rest) = path.split_first()?;
    let object = objects.get_mut(first)?;
    if rest.is_empty() {
        return Some(object);
    }
    resolve_mut(&mut object.as_group_mut()?.objects, rest)
}

fn is_signer_block(id: &str, signer_prefix: &str) -> bool {
    id.strip_prefix(signer_prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

/// A group drawing a 16:9 rect, measured with the group's own scale applied.
fn has_signature_aspect(object: &SceneObject) -> bool {
    object.as_group().is_some_and(|group| {
        let parent = group.props.geometry;
        if parent.scale_y.abs() <= f64::EPSILON {
            return false;
        }
        let group_stretch = parent.scale_x / parent.scale_y;
        group.objects.iter().filter_map(SceneObject::as_rect).any(|rect| {
            rect.aspect_ratio().is_some_and(|ratio| {
                (ratio * group_stretch - SIGNATURE_BLOCK_ASPECT).abs() <= SIGNATURE_ASPECT_TOLERANCE
            })
        })
    })
}

/// Find the signature block for `signer_id`, trying the exact id, any
/// signature id, then the aspect heuristic.
fn locate(scene: &Scene, signer_id: &str) -> Option<(ObjectPath, LocateStrategy)> {
    let signer_prefix = signature_prefix_for(signer_id);
    let strategies: [(LocateStrategy, Box<dyn Fn(&SceneObject) -> bool + '_>); 3] = [
        (
            LocateStrategy::ExactSigner,
            Box::new(|o: &SceneObject| is_signer_block(o.id(), &signer_prefix)),
        ),
        (
            LocateStrategy::AnyPrefix,
            Box::new(|o: &SceneObject| o.id().starts_with(SIGNATURE_PREFIX)),
        ),
        (
            LocateStrategy::AspectHeuristic,
            Box::new(has_signature_aspect),
        ),
    ];
    for (strategy, matches) in &strategies {
        let mut path = ObjectPath::new();
        if find_path(&scene.objects, matches, &mut path) {
            return Some((path, *strategy));
        }
    }
    None
}

/// A located signature block.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedBlock {
    pub id: String,
    pub strategy: LocateStrategy,
    /// Box the signature is fitted into, in scene coordinates.
    pub bounds: Rect,
}

/// Locate the block for `signer_id` and resolve its box: the inner
/// rectangle's bounds when there is one, else the object's own bounds.
pub fn locate_signature_block(scene: &Scene, signer_id: &str) -> Option<LocatedBlock> {
    let (path, strategy) = locate(scene, signer_id)?;
    describe(scene, &path, strategy)
}

fn describe(scene: &Scene, path: &[usize], strategy: LocateStrategy) -> Option<LocatedBlock> {
    let (object, parent) = resolve(&scene.objects, path)?;
    let bounds = match object.as_group() {
        Some(group) => match group.objects.iter().find(|m| m.as_rect().is_some()) {
            Some(rect) => group.member_bounds(rect, parent),
            None => object.geometry().bounding_rect(parent),
        },
        None => object.geometry().bounding_rect(parent),
    };
    Some(LocatedBlock {
        id: object.id().to_string(),
        strategy,
        bounds,
    })
}

/// Largest rectangle of `aspect` (width, height) centered inside `target`.
pub fn fit_centered(aspect: Size, target: Rect) -> Rect {
    if aspect.width <= 0.0 || aspect.height <= 0.0 {
        return Rect::from_center_size(target.center(), Size::ZERO);
    }
    let scale = (target.width() / aspect.width).min(target.height() / aspect.height);
    Rect::from_center_size(target.center(), aspect * scale)
}

/// Where to draw a signer's signature over a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SignaturePlacement {
    pub overlay: Rect,
    /// `None` when no block was found and the fallback box is used.
    pub block: Option<LocatedBlock>,
}

/// Compute the overlay for `signer_id` and hide the matching block.
///
/// Only the block's opacity changes. When no block exists the overlay is
/// `FALLBACK_WIDTH_RATIO` of the container wide, centered horizontally in
/// the lower third.
pub fn place_signature(scene: &mut Scene, signer_id: &str, container: Size) -> SignaturePlacement {
    if let Some((path, strategy)) = locate(scene, signer_id) {
        if let Some(block) = describe(scene, &path, strategy) {
            if let Some(object) = resolve_mut(&mut scene.objects, &path) {
                object.props_mut().style.opacity = 0.0;
            }
            return SignaturePlacement {
                overlay: fit_centered(SIGNATURE_IMAGE_SIZE, block.bounds),
                block: Some(block),
            };
        }
    }

    log::debug!("No signature block for signer {signer_id}, using fallback placement");
    let width = container.width * FALLBACK_WIDTH_RATIO;
    let size = Size::new(
        width,
        width * SIGNATURE_IMAGE_SIZE.height / SIGNATURE_IMAGE_SIZE.width,
    );
    let center = kurbo::Point::new(container.width / 2.0, container.height * 5.0 / 6.0);
    SignaturePlacement {
        overlay: Rect::from_center_size(center, size),
        block: None,
    }
}
