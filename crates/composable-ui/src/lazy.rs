use std::rc::Rc;

use composable_core::*;

/// Rows kept materialized above and below the viewport.
pub const BUFFER_ROWS: usize = 2;

/// Scroll position and viewport of a `LazyColumn`, in px. Both are
/// observable: the list's scope re-runs when either changes.
#[derive(Clone, Debug)]
pub struct LazyListState {
    scroll_offset: MutableState<f32>,
    viewport_height: MutableState<f32>,
}

impl Default for LazyListState {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyListState {
    pub fn new() -> Self {
        Self {
            scroll_offset: mutable_state_of(0.0),
            // until layout reports the real height
            viewport_height: mutable_state_of(600.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.scroll_offset.get()
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height.get()
    }

    pub fn set_viewport_height(&self, h: f32) {
        self.viewport_height.set(h.max(0.0));
    }

    pub fn set_offset(&self, off: f32, content_height: f32) {
        let max_off = (content_height - self.viewport_height.get()).max(0.0);
        self.scroll_offset.set(off.clamp(0.0, max_off));
    }

    /// Consume delta in px. Returns leftover in px (for nested scroll).
    pub fn scroll_immediate(&self, delta_px: f32, content_height_px: f32) -> f32 {
        let before = self.scroll_offset.get();
        let max_offset = (content_height_px - self.viewport_height.get()).max(0.0);
        let new_offset = (before + delta_px).clamp(0.0, max_offset);
        self.scroll_offset.set(new_offset);
        delta_px - (new_offset - before)
    }

    /// Half-open range of row indices to materialize for `count` rows of
    /// `item_h_px`.
    pub fn window(&self, count: usize, item_h_px: f32) -> std::ops::Range<usize> {
        window_for(
            self.scroll_offset.get(),
            self.viewport_height.get(),
            count,
            item_h_px,
        )
    }
}

fn window_for(offset: f32, viewport: f32, count: usize, item_h_px: f32) -> std::ops::Range<usize> {
    if count == 0 || item_h_px <= 0.0 {
        return 0..0;
    }
    let first_visible = (offset / item_h_px).floor().max(0.0) as usize;
    let last_visible = ((offset + viewport) / item_h_px).ceil().max(0.0) as usize;
    let start = first_visible.saturating_sub(BUFFER_ROWS).min(count);
    let end = (last_visible + BUFFER_ROWS).min(count).max(start);
    start..end
}

pub fn remember_lazy_list_state(key: impl Into<String>) -> LazyListState {
    (*remember_with_key(key, LazyListState::new)).clone()
}

/// Virtualized column of `count` rows of a fixed height. Only rows inside
/// the viewport (plus `BUFFER_ROWS` each side) are built; spacers stand in
/// for the rest so content height is always `count × item_height_dp`.
///
/// The rows live in their own restartable scope keyed by `key`: scrolling
/// re-runs only that scope.
pub fn LazyColumn(
    key: &str,
    count: usize,
    item_height_dp: f32,
    state: LazyListState,
    modifier: Modifier,
    item_builder: impl Fn(usize) -> View + 'static,
) -> View {
    let item_builder: Rc<dyn Fn(usize) -> View> = Rc::new(item_builder);
    compose_scope(key, (count, item_height_dp), move || {
        let item_h_px = dp_to_px(item_height_dp);
        let content_height_px = count as f32 * item_h_px;

        let offset = state.scroll_offset.observe();
        let viewport = state.viewport_height.observe();
        let range = window_for(offset, viewport, count, item_h_px);
        log::debug!("LazyColumn rows {range:?} of {count}");

        let mut children = Vec::with_capacity(range.len() + 2);
        if range.start > 0 {
            children.push(crate::Box(
                Modifier::new()
                    .fill_max_width()
                    .height(range.start as f32 * item_height_dp),
            ));
        }
        for i in range.clone() {
            children.push(
                crate::Box(Modifier::new().fill_max_width().height(item_height_dp))
                    .with_children(vec![item_builder(i)]),
            );
        }
        if range.end < count {
            children.push(crate::Box(
                Modifier::new()
                    .fill_max_width()
                    .height((count - range.end) as f32 * item_height_dp),
            ));
        }

        let on_scroll = {
            let st = state.clone();
            Rc::new(move |dy: f32| st.scroll_immediate(dy, content_height_px))
        };
        let set_viewport = {
            let st = state.clone();
            Rc::new(move |h_px: f32| st.set_viewport_height(h_px))
        };
        let set_content = {
            let st = state.clone();
            Rc::new(move |h_px: f32| st.set_offset(st.offset(), h_px))
        };
        let get_scroll = {
            let st = state.clone();
            Rc::new(move || st.offset())
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
        .modifier(modifier.clone())
        .with_children(vec![crate::Column(Modifier::new().fill_max_width()).with_children(children)])
    })
}
