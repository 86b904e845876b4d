#![allow(non_snake_case)]
//! Widgets: containers, text, buttons, images, text fields, lazy lists,
//! cards, scaffold and snackbars.
//!
//! Widgets are plain functions returning a `View`. Anything a widget needs to
//! remember across passes lives in the calling scope (`remember*`) or is
//! passed in by the owner.

pub mod lazy;
pub mod material;
pub mod scroll;
pub mod snackbar;
pub mod textfield;

use std::rc::Rc;

use composable_core::*;

pub use lazy::{LazyColumn, LazyListState, remember_lazy_list_state};
pub use material::{Card, Scaffold};
pub use scroll::{ScrollArea, ScrollState, remember_scroll_state};
pub use snackbar::{
    SnackbarData, SnackbarDuration, SnackbarHost, SnackbarHostState, SnackbarResult,
};
pub use textfield::{TextField, TextFieldState};

/// Default body text size in sp.
pub const BODY_SP: f32 = 16.0;

pub fn Surface(modifier: Modifier, child: View) -> View {
    let mut v = View::new(0, ViewKind::Surface).modifier(modifier);
    v.children = vec![child];
    v
}

pub fn Box(modifier: Modifier) -> View {
    View::new(0, ViewKind::Box).modifier(modifier)
}

pub fn Row(modifier: Modifier) -> View {
    View::new(0, ViewKind::Row).modifier(modifier)
}

pub fn Column(modifier: Modifier) -> View {
    View::new(0, ViewKind::Column).modifier(modifier)
}

pub fn Text(text: impl Into<String>) -> View {
    StyledText(AnnotatedString::plain(text))
}

pub fn StyledText(text: AnnotatedString) -> View {
    View::new(
        0,
        ViewKind::Text {
            text,
            color: theme().on_surface,
            font_size: BODY_SP,
            align: TextAlign::Start,
        },
    )
}

pub fn Spacer() -> View {
    Box(Modifier::new().weight(1.0))
}

pub fn Button(text: impl Into<String>, on_click: impl Fn() + 'static) -> View {
    let text = text.into();
    View::new(
        0,
        ViewKind::Button {
            text: text.clone(),
            on_click: Some(Rc::new(on_click)),
        },
    )
    .semantics(Semantics::new(Role::Button).label(text))
}

/// Image from the resource table. A resource that fails to load is logged
/// and drawn as a placeholder fill.
pub fn Image(modifier: Modifier, resource: &str, description: Option<&str>) -> View {
    let handle = match painter_resource(resource) {
        Ok(h) => Some(h),
        Err(e) => {
            log::warn!("Image: {e}; drawing placeholder");
            None
        }
    };
    let mut sem = Semantics::new(Role::Image);
    sem.label = description.map(str::to_string);
    View::new(
        0,
        ViewKind::Image {
            handle,
            description: description.map(str::to_string),
            scale: ContentScale::Fit,
        },
    )
    .modifier(modifier)
    .semantics(sem)
}

pub trait ImageExt {
    fn content_scale(self, scale: ContentScale) -> View;
}

impl ImageExt for View {
    fn content_scale(mut self, s: ContentScale) -> View {
        if let ViewKind::Image { scale, .. } = &mut self.kind {
            *scale = s;
        }
        self
    }
}

/// Extension trait for child building
pub trait ViewExt: Sized {
    fn child(self, children: impl IntoChildren) -> Self;
}

impl ViewExt for View {
    fn child(self, children: impl IntoChildren) -> Self {
        self.with_children(children.into_children())
    }
}

pub trait IntoChildren {
    fn into_children(self) -> Vec<View>;
}

impl IntoChildren for View {
    fn into_children(self) -> Vec<View> {
        vec![self]
    }
}

impl IntoChildren for Vec<View> {
    fn into_children(self) -> Vec<View> {
        self
    }
}

impl<const N: usize> IntoChildren for [View; N] {
    fn into_children(self) -> Vec<View> {
        self.into()
    }
}

macro_rules! impl_into_children_tuple {
    ($($idx:tt $t:ident),+) => {
        impl<$($t: IntoChildren),+> IntoChildren for ($($t,)+) {
            fn into_children(self) -> Vec<View> {
                let mut v = Vec::new();
                $(v.extend(self.$idx.into_children());)+
                v
            }
        }
    };
}

impl_into_children_tuple!(0 A, 1 B);
impl_into_children_tuple!(0 A, 1 B, 2 C);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);

/// Method styling
pub trait TextStyle {
    fn color(self, c: Color) -> View;
    fn size(self, sp: f32) -> View;
    fn align(self, a: TextAlign) -> View;
}

impl TextStyle for View {
    fn color(mut self, c: Color) -> View {
        if let ViewKind::Text {
            color: text_color, ..
        } = &mut self.kind
        {
            *text_color = c;
        }
        self
    }
    fn size(mut self, sp: f32) -> View {
        if let ViewKind::Text { font_size, .. } = &mut self.kind {
            *font_size = sp;
        }
        self
    }
    fn align(mut self, a: TextAlign) -> View {
        if let ViewKind::Text { align, .. } = &mut self.kind {
            *align = a;
        }
        self
    }
}
