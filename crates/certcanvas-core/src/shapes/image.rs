//! Raster image shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};
use kurbo::Size;

/// A loaded image source and its natural pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// URL or data URL.
    pub src: String,
    pub width: u32,
    pub height: u32,
}

impl ImageAsset {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// An image placed on the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub props: ObjectProps,
    pub src: String,
    pub cross_origin: Option<String>,
}

impl Image {
    /// Place an asset at (`left`, `top`) at its natural size.
    pub fn new(asset: &ImageAsset, left: f64, top: f64) -> Self {
        let size = asset.size();
        let mut props = ObjectProps::new(Geometry::new(left, top, size.width, size.height));
        props.meta.id = generate_id("image");
        props.style.fill = None;
        Self {
            props,
            src: asset.src.clone(),
            cross_origin: Some("anonymous".to_string()),
        }
    }

    pub(crate) fn from_props(props: ObjectProps, src: String) -> Self {
        Self {
            props,
            src,
            cross_origin: None,
        }
    }

    /// Stretch to cover `target` exactly (independent X/Y scale).
    pub fn stretch_to(&mut self, target: Size) {
        let g = &mut self.props.geometry;
        if g.width > 0.0 && g.height > 0.0 {
            g.scale_x = target.width / g.width;
            g.scale_y = target.height / g.height;
        }
    }

    /// Scale uniformly so the longer side fits within `max`.
    pub fn fit_within(&mut self, max: Size) {
        let g = &mut self.props.geometry;
        if g.width > 0.0 && g.height > 0.0 {
            let scale = (max.width / g.width).min(max.height / g.height).min(1.0);
            g.scale_x = scale;
            g.scale_y = scale;
        }
    }
}

impl ShapeTrait for Image {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Image
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_to_canvas() {
        let asset = ImageAsset::new("bg.png", 1700, 1202);
        let mut image = Image::new(&asset, 0.0, 0.0);
        image.stretch_to(Size::new(850.0, 601.0));
        let size = image.props.geometry.scaled_size();
        assert!((size.width - 850.0).abs() < 1e-9);
        assert!((size.height - 601.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let asset = ImageAsset::new("logo.png", 100, 50);
        let mut image = Image::new(&asset, 0.0, 0.0);
        image.fit_within(Size::new(400.0, 400.0));
        assert!((image.props.geometry.scale_x - 1.0).abs() < f64::EPSILON);
        image.fit_within(Size::new(50.0, 400.0));
        assert!((image.props.geometry.scale_x - 0.5).abs() < f64::EPSILON);
    }
}
