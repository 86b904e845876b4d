use std::rc::Rc;

use crate::{AnnotatedString, Brush, Color, ImageHandle, Modifier, Rect, ScopeId};

pub type ViewId = u64;

pub type Callback = Rc<dyn Fn()>;
pub type ScrollCallback = Rc<dyn Fn(f32) -> f32>;
pub type TextCallback = Rc<dyn Fn(String)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentScale {
    #[default]
    Fit,
    Crop,
    FillBounds,
}

#[derive(Clone)]
pub enum ViewKind {
    Surface,
    Box,
    Row,
    Column,
    ScrollV {
        /// Consumes a vertical delta and returns what is left over.
        on_scroll: Option<ScrollCallback>,
        set_viewport_height: Option<Rc<dyn Fn(f32)>>,
        set_content_height: Option<Rc<dyn Fn(f32)>>,
        get_scroll_offset: Option<Rc<dyn Fn() -> f32>>,
    },
    Text {
        text: AnnotatedString,
        color: Color,
        font_size: f32,
        align: TextAlign,
    },
    Button {
        text: String,
        on_click: Option<Callback>,
    },
    /// Controlled field: `value` is always supplied by the owner.
    TextField {
        value: String,
        label: String,
        on_change: Option<TextCallback>,
        on_submit: Option<TextCallback>,
    },
    Image {
        /// `None` when the resource failed to load.
        handle: Option<ImageHandle>,
        description: Option<String>,
        scale: ContentScale,
    },
    /// Placeholder for the cached output of a restartable scope.
    Scope {
        id: ScopeId,
    },
}

impl std::fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Surface => write!(f, "Surface"),
            ViewKind::Box => write!(f, "Box"),
            ViewKind::Row => write!(f, "Row"),
            ViewKind::Column => write!(f, "Column"),
            ViewKind::ScrollV { .. } => write!(f, "ScrollV"),
            ViewKind::Text {
                text,
                color,
                font_size,
                align,
            } => f
                .debug_struct("Text")
                .field("text", &text.text)
                .field("color", color)
                .field("font_size", font_size)
                .field("align", align)
                .finish(),
            ViewKind::Button { text, .. } => f
                .debug_struct("Button")
                .field("text", text)
                .field("on_click", &"<callback>")
                .finish(),
            ViewKind::TextField { value, label, .. } => f
                .debug_struct("TextField")
                .field("value", value)
                .field("label", label)
                .finish(),
            ViewKind::Image {
                handle,
                description,
                scale,
            } => f
                .debug_struct("Image")
                .field("handle", handle)
                .field("description", description)
                .field("scale", scale)
                .finish(),
            ViewKind::Scope { id } => f.debug_struct("Scope").field("id", id).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct View {
    pub id: ViewId,
    pub kind: ViewKind,
    pub modifier: Modifier,
    pub children: Vec<View>,
    pub semantics: Option<crate::semantics::Semantics>,
}

impl View {
    pub fn new(id: ViewId, kind: ViewKind) -> Self {
        View {
            id,
            kind,
            modifier: Modifier::default(),
            children: vec![],
            semantics: None,
        }
    }
    pub fn modifier(mut self, m: Modifier) -> Self {
        self.modifier = m;
        self
    }
    pub fn with_children(mut self, kids: Vec<View>) -> Self {
        self.children = kids;
        self
    }
    pub fn semantics(mut self, s: crate::semantics::Semantics) -> Self {
        self.semantics = Some(s);
        self
    }

    /// Every visible string in document order: text, button labels and
    /// field values.
    pub fn collect_text(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |v| match &v.kind {
            ViewKind::Text { text, .. } => out.push(text.text.clone()),
            ViewKind::Button { text, .. } => out.push(text.clone()),
            ViewKind::TextField { value, .. } => out.push(value.clone()),
            _ => {}
        });
        out
    }

    /// Pre-order traversal.
    pub fn walk(&self, f: &mut dyn FnMut(&View)) {
        f(self);
        for c in &self.children {
            c.walk(f);
        }
    }
}

/// Renderable scene
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

#[derive(Clone, Debug)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        brush: Brush,
        radius: f32,
    },
    Border {
        rect: Rect,
        color: Color,
        width: f32,
        radius: f32,
    },
    Text {
        rect: Rect,
        text: String,
        color: Color,
        size: f32,
    },
    Image {
        rect: Rect,
        handle: ImageHandle,
    },
    PushClip {
        rect: Rect,
        radius: f32,
    },
    PopClip,
}
