use std::rc::Rc;

use taffy::{AlignItems, AlignSelf, JustifyContent};

use crate::{Brush, Color, Semantics, Size};

#[derive(Clone, Debug)]
pub struct Border {
    pub width: f32,
    pub color: Color,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaddingValues {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionType {
    Relative,
    Absolute,
}

#[derive(Clone, Default)]
pub struct Modifier {
    pub size: Option<Size>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub fill_max_w: bool,
    pub fill_max_h: bool,
    /// Width as a fraction of the parent, in `(0, 1]`.
    pub width_fraction: Option<f32>,
    pub padding: Option<f32>,
    pub padding_values: Option<PaddingValues>,
    pub min_height: Option<f32>,
    pub max_height: Option<f32>,
    pub background: Option<Brush>,
    pub border: Option<Border>,
    pub flex_grow: Option<f32>,
    pub align_self: Option<AlignSelf>,
    pub justify_content: Option<JustifyContent>,
    pub align_items_container: Option<AlignItems>,
    pub gap: Option<f32>,
    pub clip_rounded: Option<f32>,
    /// Drawn as a drop shadow border; does not affect layout.
    pub elevation: Option<f32>,
    pub click: bool,
    pub on_click: Option<Rc<dyn Fn()>>,
    pub semantics: Option<Semantics>,
    pub position_type: Option<PositionType>,
    pub offset_left: Option<f32>,
    pub offset_right: Option<f32>,
    pub offset_top: Option<f32>,
    pub offset_bottom: Option<f32>,
    pub aspect_ratio: Option<f32>,
}

impl std::fmt::Debug for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modifier")
            .field("size", &self.size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fill_max_w", &self.fill_max_w)
            .field("fill_max_h", &self.fill_max_h)
            .field("width_fraction", &self.width_fraction)
            .field("padding", &self.padding)
            .field("padding_values", &self.padding_values)
            .field("background", &self.background)
            .field("border", &self.border)
            .field("flex_grow", &self.flex_grow)
            .field("align_self", &self.align_self)
            .field("clip_rounded", &self.clip_rounded)
            .field("elevation", &self.elevation)
            .field("click", &self.click)
            .field("on_click", &self.on_click.as_ref().map(|_| "..."))
            .field("semantics", &self.semantics)
            .field("position_type", &self.position_type)
            .finish()
    }
}

impl Modifier {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn size(mut self, w: f32, h: f32) -> Self {
        self.size = Some(Size {
            width: w,
            height: h,
        });
        self
    }
    pub fn width(mut self, w: f32) -> Self {
        self.width = Some(w);
        self
    }
    pub fn height(mut self, h: f32) -> Self {
        self.height = Some(h);
        self
    }
    pub fn fill_max_size(mut self) -> Self {
        self.fill_max_w = true;
        self.fill_max_h = true;
        self
    }
    pub fn fill_max_width(mut self) -> Self {
        self.fill_max_w = true;
        self
    }
    pub fn fill_max_height(mut self) -> Self {
        self.fill_max_h = true;
        self
    }
    /// `fraction` of the parent's width, clamped into `(0, 1]`.
    pub fn fill_max_width_fraction(mut self, fraction: f32) -> Self {
        self.width_fraction = Some(fraction.clamp(f32::EPSILON, 1.0));
        self
    }
    pub fn padding(mut self, v: f32) -> Self {
        self.padding = Some(v);
        self
    }
    pub fn padding_values(mut self, padding: PaddingValues) -> Self {
        self.padding_values = Some(padding);
        self
    }
    pub fn padding_symmetric(self, horizontal: f32, vertical: f32) -> Self {
        self.padding_values(PaddingValues {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        })
    }
    pub fn min_height(mut self, h: f32) -> Self {
        self.min_height = Some(h);
        self
    }
    pub fn max_height(mut self, h: f32) -> Self {
        self.max_height = Some(h);
        self
    }
    /// Set a solid color background.
    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(Brush::Solid(color));
        self
    }
    pub fn background_brush(mut self, brush: Brush) -> Self {
        self.background = Some(brush);
        self
    }
    pub fn border(mut self, width: f32, color: Color, radius: f32) -> Self {
        self.border = Some(Border {
            width,
            color,
            radius,
        });
        self
    }
    /// Share of the remaining main-axis space, like a row/column weight.
    pub fn weight(mut self, w: f32) -> Self {
        self.flex_grow = Some(w);
        self
    }
    pub fn align_self(mut self, a: AlignSelf) -> Self {
        self.align_self = Some(a);
        self
    }
    pub fn align_self_center(mut self) -> Self {
        self.align_self = Some(AlignSelf::Center);
        self
    }
    pub fn justify_content(mut self, j: JustifyContent) -> Self {
        self.justify_content = Some(j);
        self
    }
    pub fn align_items(mut self, a: AlignItems) -> Self {
        self.align_items_container = Some(a);
        self
    }
    pub fn gap(mut self, g: f32) -> Self {
        self.gap = Some(g);
        self
    }
    pub fn clip_rounded(mut self, radius: f32) -> Self {
        self.clip_rounded = Some(radius);
        self
    }
    pub fn elevation(mut self, dp: f32) -> Self {
        self.elevation = Some(dp);
        self
    }
    pub fn clickable(mut self, on_click: impl Fn() + 'static) -> Self {
        self.click = true;
        self.on_click = Some(Rc::new(on_click));
        self
    }
    pub fn semantics(mut self, s: Semantics) -> Self {
        self.semantics = Some(s);
        self
    }
    pub fn absolute(mut self) -> Self {
        self.position_type = Some(PositionType::Absolute);
        self
    }
    pub fn offset(
        mut self,
        left: Option<f32>,
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
    ) -> Self {
        self.offset_left = left;
        self.offset_top = top;
        self.offset_right = right;
        self.offset_bottom = bottom;
        self
    }
    pub fn aspect_ratio(mut self, ratio: f32) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }
}
