//! Snap-to-center for dragged and scaled objects.

use kurbo::{Rect, Size, Vec2};

/// Distance threshold for center snapping, in canonical units.
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Which part of the object's box landed on a centerline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    /// Left edge (horizontal axis) or top edge (vertical axis).
    Near,
    Center,
    /// Right edge or bottom edge.
    Far,
}

/// Result of a center snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Translation to apply to the object.
    pub offset: Vec2,
    /// Edge snapped onto the vertical centerline, if any.
    pub snapped_x: Option<SnapEdge>,
    /// Edge snapped onto the horizontal centerline, if any.
    pub snapped_y: Option<SnapEdge>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none() -> Self {
        Self {
            offset: Vec2::ZERO,
            snapped_x: None,
            snapped_y: None,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x.is_some() || self.snapped_y.is_some()
    }
}

/// Snap one axis: near edge, then center, then far edge. First match wins.
fn snap_axis(near: f64, far: f64, centerline: f64, threshold: f64) -> Option<(f64, SnapEdge)> {
    let center = (near + far) / 2.0;
    [
        (near, SnapEdge::Near),
        (center, SnapEdge::Center),
        (far, SnapEdge::Far),
    ]
    .into_iter()
    .find(|(value, _)| (value - centerline).abs() <= threshold)
    .map(|(value, edge)| (centerline - value, edge))
}

/// Snap an object's bounds onto the canvas centerlines.
///
/// `bounds` and `canvas` share one coordinate space; pass a threshold
/// already scaled to it (see [`scaled_threshold`]).
pub fn snap_to_center(bounds: Rect, canvas: Size, threshold: f64) -> SnapResult {
    let x = snap_axis(bounds.x0, bounds.x1, canvas.width / 2.0, threshold);
    let y = snap_axis(bounds.y0, bounds.y1, canvas.height / 2.0, threshold);
    SnapResult {
        offset: Vec2::new(
            x.map_or(0.0, |(dx, _)| dx),
            y.map_or(0.0, |(dy, _)| dy),
        ),
        snapped_x: x.map(|(_, edge)| edge),
        snapped_y: y.map(|(_, edge)| edge),
    }
}

/// Snap threshold for a surface drawn at `view_scale`.
pub fn scaled_threshold(view_scale: f64) -> f64 {
    SNAP_THRESHOLD * view_scale
}
