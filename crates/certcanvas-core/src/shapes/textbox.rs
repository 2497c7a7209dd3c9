//! Text shape.

use super::{Geometry, ObjectKind, ObjectProps, ShapeTrait, generate_id};

/// Line height factor applied to the font size.
const LINE_HEIGHT: f64 = 1.16;

/// Default font size for new text.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// A wrapping text box.
#[derive(Debug, Clone, PartialEq)]
pub struct Textbox {
    pub props: ObjectProps,
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    pub font_style: String,
    pub text_align: String,
}

impl Textbox {
    /// Create a text box with a fixed width at (`left`, `top`).
    pub fn new(left: f64, top: f64, width: f64, text: impl Into<String>) -> Self {
        let mut props = ObjectProps::new(Geometry::new(left, top, width, 0.0));
        props.meta.id = generate_id("text");
        let mut textbox = Self::from_props(props, text.into());
        textbox.fit_height();
        textbox
    }

    pub(crate) fn from_props(props: ObjectProps, text: String) -> Self {
        Self {
            props,
            text,
            font_size: DEFAULT_FONT_SIZE,
            font_family: "Times New Roman".to_string(),
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            text_align: "left".to_string(),
        }
    }

    /// Replace the content, growing or shrinking the box to the line count.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.fit_height();
    }

    /// Recompute the unscaled height from the number of lines.
    pub fn fit_height(&mut self) {
        let lines = self.text.lines().count().max(1) as f64;
        self.props.geometry.height = lines * self.font_size * LINE_HEIGHT;
    }
}

impl ShapeTrait for Textbox {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Textbox
    }

    fn props(&self) -> &ObjectProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.props
    }
}
