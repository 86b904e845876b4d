//! Headless platform runner.
//!
//! `HeadlessApp` plays the part of a windowed runner without a window: it
//! owns the composition, runs frames, lays them out with taffy, paints into a
//! `Scene`, and dispatches input through the last frame's semantics nodes and
//! hit regions. Time comes from a `TestClock` the app installs, so timers
//! only move when `advance` is called.
//!
//! ```rust
//! use composable_core::*;
//! use composable_headless::{HeadlessApp, HeadlessConfig};
//! use composable_ui::{Button, Column, Text, ViewExt};
//!
//! let clicks = mutable_state_of(0);
//! let mut app = HeadlessApp::new(
//!     {
//!         let clicks = clicks.clone();
//!         move || {
//!             let n = clicks.observe();
//!             let c = clicks.clone();
//!             Column(Modifier::new()).child((
//!                 Text(format!("Clicked {n} times")),
//!                 Button("Click", move || c.update(|v| *v += 1)),
//!             ))
//!         }
//!     },
//!     HeadlessConfig::default(),
//! );
//! app.frame().unwrap();
//! app.click("Click").unwrap();
//! assert!(app.texts().contains(&"Clicked 1 times".to_string()));
//! ```

pub mod hud;
pub mod layout;

use std::collections::HashMap;
use std::rc::Rc;

use composable_core::{
    Composition, Density, Frame, HitRegion, Role, Scene, SemNode, TestClock, TextScale, View,
    clock, with_density, with_text_scale,
};
use composable_ui::TextFieldState;
use web_time::Duration;

pub use hud::{FrameWork, Hud, Metrics};
pub use layout::layout_and_paint;

/// Recompose/layout rounds per frame. Layout may write state (viewport
/// heights), which can invalidate scopes again.
const MAX_PASSES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("layout failed: {0}")]
    Layout(#[from] taffy::TaffyError),
    #[error("view {0} has no layout node")]
    MissingLayout(u64),
    #[error("no {} labelled {label:?} on screen", describe(.role))]
    NoSuchNode { role: Option<Role>, label: String },
    #[error("no text field is focused")]
    NoFocus,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessConfig {
    /// Window size in px.
    pub size: (u32, u32),
    pub density: f32,
    pub text_scale: f32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            size: (411, 891),
            density: 1.0,
            text_scale: 1.0,
        }
    }
}

fn describe(role: &Option<Role>) -> String {
    role.map_or_else(|| "node".to_string(), |r| format!("{r:?}"))
}

fn with_locals<R>(config: &HeadlessConfig, f: impl FnOnce() -> R) -> R {
    with_density(
        Density {
            scale: config.density,
        },
        || with_text_scale(TextScale(config.text_scale), f),
    )
}

fn empty_frame() -> Frame {
    Frame {
        scene: Scene::default(),
        hit_regions: Vec::new(),
        semantics_nodes: Vec::new(),
        focus_chain: Vec::new(),
    }
}

pub struct HeadlessApp {
    composition: Composition,
    config: HeadlessConfig,
    clock: TestClock,
    frame: Frame,
    focused: Option<String>,
    // caret bookkeeping per field label; the text itself always comes from the view
    text_fields: HashMap<String, TextFieldState>,
    hud: Hud,
}

impl HeadlessApp {
    /// Installs a `TestClock` and builds the composition. Nothing runs until
    /// the first `frame`.
    pub fn new(root: impl Fn() -> View + 'static, config: HeadlessConfig) -> Self {
        let clock = TestClock::new();
        clock::set_clock(Rc::new(clock.clone()));
        let composition = with_locals(&config, || Composition::new(root));
        log::info!(
            "headless app {}x{} @{}x",
            config.size.0,
            config.size.1,
            config.density
        );
        Self {
            composition,
            config,
            clock,
            frame: empty_frame(),
            focused: None,
            text_fields: HashMap::new(),
            hud: Hud::new(),
        }
    }

    /// Runs one frame: recomposes invalidated scopes, polls tasks, lays out
    /// and paints. A frame without invalidations recomposes nothing.
    pub fn frame(&mut self) -> Result<&Frame, HeadlessError> {
        let config = self.config;
        let mut work = FrameWork::empty();
        let mut recomposed = 0;
        let mut pending_tasks = 0;

        for pass in 0..MAX_PASSES {
            if self.composition.needs_recompose() {
                recomposed += with_locals(&config, || self.composition.recompose());
                work |= FrameWork::COMPOSE;
            }
            if pass == 0 {
                pending_tasks = self.composition.poll_tasks();
                work |= FrameWork::TASKS;
                if self.composition.needs_recompose() {
                    continue;
                }
            }

            let tree = self.composition.tree();
            let focused = self.focused.as_deref();
            let (scene, hits, sems) =
                with_locals(&config, || layout_and_paint(&tree, config.size, focused))?;
            work |= FrameWork::LAYOUT;
            let focus_chain = hits.iter().filter(|h| h.focusable).map(|h| h.id).collect();
            self.frame = Frame {
                scene,
                hit_regions: hits,
                semantics_nodes: sems,
                focus_chain,
            };
            if !self.composition.needs_recompose() {
                break;
            }
            if pass + 1 == MAX_PASSES {
                log::warn!("layout still invalidating after {MAX_PASSES} passes");
            }
        }

        self.hud.record(
            recomposed,
            pending_tasks,
            work,
            &self.frame.scene,
            self.frame.hit_regions.len(),
        );
        self.hud.overlay(&mut self.frame.scene);
        Ok(&self.frame)
    }

    pub fn last_frame(&self) -> &Frame {
        &self.frame
    }

    fn find(&self, role: Option<Role>, label: &str) -> Result<&SemNode, HeadlessError> {
        self.frame
            .semantics_nodes
            .iter()
            .find(|n| role.is_none_or(|r| n.role == r) && n.label.as_deref() == Some(label))
            .ok_or_else(|| HeadlessError::NoSuchNode {
                role,
                label: label.to_string(),
            })
    }

    fn region(&self, id: u64) -> Option<&HitRegion> {
        self.frame.hit_regions.iter().find(|h| h.id == id)
    }

    /// Clicks the first clickable node labelled `label`.
    pub fn click(&mut self, label: &str) -> Result<(), HeadlessError> {
        let on_click = self
            .frame
            .semantics_nodes
            .iter()
            .filter(|n| n.label.as_deref() == Some(label))
            .find_map(|n| self.region(n.id).and_then(|h| h.on_click.clone()))
            .ok_or_else(|| HeadlessError::NoSuchNode {
                role: None,
                label: label.to_string(),
            })?;
        log::debug!("click {label:?}");
        on_click();
        self.frame()?;
        Ok(())
    }

    pub fn click_role(&mut self, role: Role, label: &str) -> Result<(), HeadlessError> {
        let id = self.find(Some(role), label)?.id;
        let on_click = self
            .region(id)
            .and_then(|h| h.on_click.clone())
            .ok_or_else(|| HeadlessError::NoSuchNode {
                role: Some(role),
                label: label.to_string(),
            })?;
        log::debug!("click {role:?} {label:?}");
        on_click();
        self.frame()?;
        Ok(())
    }

    fn text_field(&self, label: &str) -> Result<HitRegion, HeadlessError> {
        let id = self.find(Some(Role::TextField), label)?.id;
        self.region(id)
            .cloned()
            .ok_or_else(|| HeadlessError::NoSuchNode {
                role: Some(Role::TextField),
                label: label.to_string(),
            })
    }

    pub fn focus_text_field(&mut self, label: &str) -> Result<(), HeadlessError> {
        self.text_field(label)?;
        log::debug!("focus {label:?}");
        self.focused = Some(label.to_string());
        self.frame()?;
        Ok(())
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Applies one edit to the focused field. The field is re-synced from
    /// the value in the last frame first; the result goes to `on_change`.
    fn edit(&mut self, apply: impl FnOnce(&mut TextFieldState)) -> Result<(), HeadlessError> {
        let label = self.focused.clone().ok_or(HeadlessError::NoFocus)?;
        let hit = self.text_field(&label)?;
        let value = hit.text_value.unwrap_or_default();

        let state = self.text_fields.entry(label).or_default();
        state.sync(&value);
        apply(state);
        if state.text != value {
            let next = state.text.clone();
            if let Some(on_change) = &hit.on_text_change {
                on_change(next);
            }
        }
        self.frame()?;
        Ok(())
    }

    /// Types `text` into the focused field one keystroke at a time.
    pub fn type_text(&mut self, text: &str) -> Result<(), HeadlessError> {
        for ch in text.chars() {
            let key = ch.to_string();
            self.edit(move |st| st.insert_text(&key))?;
        }
        Ok(())
    }

    pub fn backspace(&mut self) -> Result<(), HeadlessError> {
        self.edit(|st| st.delete_backward())
    }

    /// Delete the grapheme after the caret.
    pub fn delete(&mut self) -> Result<(), HeadlessError> {
        self.edit(|st| st.delete_forward())
    }

    /// Move the caret by `delta` graphemes, collapsing any selection.
    pub fn move_caret(&mut self, delta: isize) -> Result<(), HeadlessError> {
        self.edit(|st| st.move_cursor(delta, false))
    }

    /// Enter in the focused field.
    pub fn submit(&mut self) -> Result<(), HeadlessError> {
        let label = self.focused.clone().ok_or(HeadlessError::NoFocus)?;
        let hit = self.text_field(&label)?;
        if let Some(on_submit) = &hit.on_text_submit {
            on_submit(hit.text_value.clone().unwrap_or_default());
        }
        self.frame()?;
        Ok(())
    }

    /// Scrolls by `dy` px at the center of the node labelled `label`. The
    /// innermost scroll container consumes first; leftovers go outward.
    /// Returns what nobody consumed.
    pub fn scroll_at(&mut self, label: &str, dy: f32) -> Result<f32, HeadlessError> {
        let at = self.find(None, label)?.rect.center();
        let handlers: Vec<_> = self
            .frame
            .hit_regions
            .iter()
            .rev()
            .filter(|h| h.rect.contains(at))
            .filter_map(|h| h.on_scroll.clone())
            .collect();
        log::debug!("scroll {dy} at {label:?} ({} containers)", handlers.len());

        let mut left = dy;
        for on_scroll in handlers {
            left = on_scroll(left);
            if left.abs() < 0.001 {
                left = 0.0;
                break;
            }
        }
        self.frame()?;
        Ok(left)
    }

    /// Moves the test clock and runs a frame.
    pub fn advance(&mut self, by: Duration) -> Result<(), HeadlessError> {
        self.clock.advance(by);
        self.frame()?;
        Ok(())
    }

    pub fn clock(&self) -> &TestClock {
        &self.clock
    }

    pub fn semantics(&self) -> &[SemNode] {
        &self.frame.semantics_nodes
    }

    /// Labels of every text node in the last frame, in paint order.
    pub fn texts(&self) -> Vec<String> {
        self.frame
            .semantics_nodes
            .iter()
            .filter(|n| n.role == Role::Text)
            .filter_map(|n| n.label.clone())
            .collect()
    }

    pub fn stats(&self) -> &Metrics {
        self.hud.metrics()
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }
}
