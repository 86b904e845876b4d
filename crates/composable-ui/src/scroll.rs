//! # Scroll model
//!
//! Scroll containers are `ViewKind::ScrollV` nodes; their offsets live in a
//! `ScrollState` owned by the caller. The layout pass reports viewport and
//! content heights back through the node's callbacks, reads the offset to
//! translate and clip the content, and routes wheel/drag deltas to
//! `on_scroll`, which consumes what it can and returns the leftover for the
//! enclosing scroll container.
//!
//! Offsets are observable, but `ScrollArea` itself never observes them:
//! scrolling moves pixels without recomposing anything.

use std::rc::Rc;

use composable_core::*;

/// Vertical scroll position in px.
#[derive(Clone, Debug)]
pub struct ScrollState {
    scroll_offset: MutableState<f32>,
    viewport_height: MutableState<f32>,
    content_height: MutableState<f32>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollState {
    pub fn new() -> Self {
        Self {
            scroll_offset: mutable_state_of(0.0),
            viewport_height: mutable_state_of(0.0),
            content_height: mutable_state_of(0.0),
        }
    }

    pub fn set_viewport_height(&self, h: f32) {
        self.viewport_height.set(h.max(0.0));
        self.clamp_offset();
    }

    pub fn set_content_height(&self, h: f32) {
        self.content_height.set(h.max(0.0));
        self.clamp_offset();
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_height.get() - self.viewport_height.get()).max(0.0)
    }

    pub fn set_offset(&self, off: f32) {
        self.scroll_offset.set(off.clamp(0.0, self.max_offset()));
    }

    fn clamp_offset(&self) {
        let off = self.scroll_offset.get();
        let clamped = off.clamp(0.0, self.max_offset());
        self.scroll_offset.set(clamped);
    }

    pub fn get(&self) -> f32 {
        self.scroll_offset.get()
    }

    /// Consume dy (px), clamp to bounds, return leftover.
    pub fn scroll_immediate(&self, dy: f32) -> f32 {
        let before = self.scroll_offset.get();
        let new_off = (before + dy).clamp(0.0, self.max_offset());
        self.scroll_offset.set(new_off);
        dy - (new_off - before)
    }
}

pub fn remember_scroll_state(key: impl Into<String>) -> ScrollState {
    (*remember_with_key(key, ScrollState::new)).clone()
}

/// Vertically scrolling container around `content`.
pub fn ScrollArea(modifier: Modifier, state: ScrollState, content: View) -> View {
    let on_scroll = {
        let st = state.clone();
        Rc::new(move |dy: f32| st.scroll_immediate(dy))
    };
    let set_viewport = {
        let st = state.clone();
        Rc::new(move |h: f32| st.set_viewport_height(h))
    };
    let set_content = {
        let st = state.clone();
        Rc::new(move |h: f32| st.set_content_height(h))
    };
    let get_scroll = {
        let st = state.clone();
        Rc::new(move || st.get())
    };

    View::new(
        0,
        ViewKind::ScrollV {
            on_scroll: Some(on_scroll),
            set_viewport_height: Some(set_viewport),
            set_content_height: Some(set_content),
            get_scroll_offset: Some(get_scroll),
        },
    )
    .modifier(modifier)
    .with_children(vec![content])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_clamps_and_returns_leftover() {
        let st = ScrollState::new();
        st.set_viewport_height(100.0);
        st.set_content_height(250.0);

        assert_eq!(st.scroll_immediate(120.0), 0.0);
        assert_eq!(st.get(), 120.0);

        // only 30 px left before the end
        assert_eq!(st.scroll_immediate(50.0), 20.0);
        assert_eq!(st.get(), 150.0);

        assert_eq!(st.scroll_immediate(-400.0), -250.0);
        assert_eq!(st.get(), 0.0);
    }

    #[test]
    fn test_shrinking_content_clamps_offset() {
        let st = ScrollState::new();
        st.set_viewport_height(100.0);
        st.set_content_height(300.0);
        st.set_offset(200.0);
        st.set_content_height(150.0);
        assert_eq!(st.get(), 50.0);
    }
}
