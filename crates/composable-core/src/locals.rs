//! # Theming and locals
//!
//! Thread-local "composition locals" carry UI-wide parameters:
//!
//! - `Theme`: colors for surfaces, text and controls.
//! - `Density`: dp to px scale factor.
//! - `TextScale`: user text scaling.
//! - `ResourceTable`: drawable resources resolved by `painter_resource`.
//!
//! Override them for a subtree with `with_theme`, `with_density`,
//! `with_text_scale` and `with_resources`:
//!
//! ```rust
//! use composable_core::*;
//!
//! with_theme(Theme::light(), || {
//!     assert_eq!(theme().primary, Color::from_hex("#6200EE"));
//! });
//! ```
//!
//! A restartable scope captures the locals in effect where it was composed,
//! so re-running it on its own sees the same theme as its parent did.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Color, ResourceTable};

type LocalsFrame = HashMap<TypeId, Rc<dyn Any>>;

thread_local! {
    static LOCALS_STACK: RefCell<Vec<LocalsFrame>> = const { RefCell::new(Vec::new()) };
}

/// density-independent pixels (dp)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dp(pub f32);

impl Dp {
    pub fn to_px(self) -> f32 {
        self.0 * density().scale
    }
}

pub fn dp_to_px(dp: f32) -> f32 {
    Dp(dp).to_px()
}

/// Scaled pixels for text: dp times the user text scale.
pub fn sp_to_px(sp: f32) -> f32 {
    dp_to_px(sp) * text_scale().0
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // pops on unwind too
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local(t: TypeId, v: Rc<dyn Any>) {
    LOCALS_STACK.with(|st| {
        let mut st = st.borrow_mut();
        if let Some(top) = st.last_mut() {
            top.insert(t, v);
        } else {
            let mut m = HashMap::new();
            m.insert(t, v);
            st.push(m);
        }
    });
}

fn provide<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local(TypeId::of::<T>(), Rc::new(value));
        f()
    })
}

fn lookup<T: Clone + 'static>() -> Option<T> {
    LOCALS_STACK.with(|st| {
        for frame in st.borrow().iter().rev() {
            if let Some(v) = frame.get(&TypeId::of::<T>())
                && let Some(t) = v.downcast_ref::<T>()
            {
                return Some(t.clone());
            }
        }
        None
    })
}

/// Flattened view of every local in effect at the time it was taken.
#[derive(Clone, Default)]
pub struct LocalsSnapshot(LocalsFrame);

pub fn snapshot() -> LocalsSnapshot {
    LOCALS_STACK.with(|st| {
        let mut flat = HashMap::new();
        for frame in st.borrow().iter() {
            for (k, v) in frame {
                flat.insert(*k, v.clone());
            }
        }
        LocalsSnapshot(flat)
    })
}

/// Runs `f` with `snap` as the innermost locals frame.
pub fn with_snapshot<R>(snap: &LocalsSnapshot, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        for (k, v) in &snap.0 {
            set_local(*k, v.clone());
        }
        f()
    })
}

/// Color theme read by widgets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub on_surface: Color,
    pub primary: Color,
    pub primary_variant: Color,
    pub on_primary: Color,
    pub secondary: Color,
    pub outline: Color,
    pub focus: Color,
    pub button_bg: Color,
    pub snackbar_bg: Color,
    pub on_snackbar: Color,
    pub error: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Color::WHITE,
            surface: Color::WHITE,
            on_surface: Color::BLACK,
            primary: Color::from_hex("#6200EE"),
            primary_variant: Color::from_hex("#3700B3"),
            on_primary: Color::WHITE,
            secondary: Color::from_hex("#03DAC5"),
            outline: Color::from_hex("#9E9E9E"),
            focus: Color::from_hex("#3700B3"),
            button_bg: Color::from_hex("#6200EE"),
            snackbar_bg: Color::from_hex("#323232"),
            on_snackbar: Color::WHITE,
            error: Color::from_hex("#B00020"),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::from_hex("#121212"),
            surface: Color::from_hex("#1E1E1E"),
            on_surface: Color::WHITE,
            primary: Color::from_hex("#BB86FC"),
            primary_variant: Color::from_hex("#3700B3"),
            on_primary: Color::BLACK,
            secondary: Color::from_hex("#03DAC5"),
            outline: Color::from_hex("#555555"),
            focus: Color::from_hex("#BB86FC"),
            button_bg: Color::from_hex("#BB86FC"),
            snackbar_bg: Color::from_hex("#F5F5F5"),
            on_snackbar: Color::BLACK,
            error: Color::from_hex("#CF6679"),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    pub scale: f32, // dp→px multiplier
}

impl Default for Density {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextScale(pub f32);

impl Default for TextScale {
    fn default() -> Self {
        Self(1.0)
    }
}

pub fn with_theme<R>(theme: Theme, f: impl FnOnce() -> R) -> R {
    provide(theme, f)
}

pub fn with_density<R>(density: Density, f: impl FnOnce() -> R) -> R {
    provide(density, f)
}

pub fn with_text_scale<R>(ts: TextScale, f: impl FnOnce() -> R) -> R {
    provide(ts, f)
}

pub fn with_resources<R>(table: Rc<ResourceTable>, f: impl FnOnce() -> R) -> R {
    provide(table, f)
}

// Getters with defaults if not set

pub fn theme() -> Theme {
    lookup::<Theme>().unwrap_or_default()
}

pub fn density() -> Density {
    lookup::<Density>().unwrap_or_default()
}

pub fn text_scale() -> TextScale {
    lookup::<TextScale>().unwrap_or_default()
}

pub fn resources() -> Rc<ResourceTable> {
    lookup::<Rc<ResourceTable>>().unwrap_or_default()
}
