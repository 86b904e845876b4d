//! Layout with taffy and painting into a display list.
//!
//! Widths and heights come from the view modifiers (dp, converted with the
//! current `Density`); text, buttons and fields are measured with a fixed
//! advance estimate, so layouts are identical on every machine.

use std::collections::HashMap;

use composable_core::{
    Brush, Color, HitRegion, Modifier, PositionType, Rect, Role, Scene, SceneNode, SemNode,
    TextAlign, View, ViewId, ViewKind, dp_to_px, sp_to_px, theme,
};
use composable_ui::textfield::{TF_FONT_SP, TF_HEIGHT_DP, TF_PADDING_X_DP};
use taffy::prelude::{
    AvailableSpace, Display, FlexDirection, NodeId, Position, Style, TaffyTree, auto, length,
    percent,
};
use taffy::{AlignItems, Overflow, Point, TaffyError};

use crate::HeadlessError;

const BUTTON_HEIGHT_DP: f32 = 36.0;
const BUTTON_PADDING_X_DP: f32 = 12.0;
const BUTTON_LABEL_SP: f32 = 16.0;
const TEXT_FIELD_WIDTH_DP: f32 = 220.0;

#[derive(Clone)]
enum NodeCtx {
    Text { text: String, font_sp: f32 },
    Button { label: String },
    TextField,
    Container,
    Scroll,
}

/// Scene, hit regions and semantics of one laid out tree.
pub type Painted = (Scene, Vec<HitRegion>, Vec<SemNode>);

/// Advance estimate in px for `text` at `size_px`.
pub fn approx_text_width(text: &str, size_px: f32) -> f32 {
    text.chars().count() as f32 * size_px * 0.6
}

fn line_height(size_px: f32) -> f32 {
    size_px * 1.3
}

/// Lays out `root` in a `size_px` window and paints it.
///
/// Ids are stamped in preorder starting at 1, so a `SemNode` and the
/// `HitRegion` of the same view share an id. Scroll containers report their
/// viewport and content heights through their callbacks while painting.
/// `focused` is the label of the focused text field.
pub fn layout_and_paint(
    root: &View,
    size_px: (u32, u32),
    focused: Option<&str>,
) -> Result<Painted, HeadlessError> {
    let mut next_id = 1u64;
    let root = stamp(root.clone(), &mut next_id);

    let mut taffy: TaffyTree<NodeCtx> = TaffyTree::new();
    let mut nodes = HashMap::new();
    let root_node = build_node(&root, None, &mut taffy, &mut nodes)?;

    let mut rs = taffy.style(root_node)?.clone();
    rs.size.width = length(size_px.0 as f32);
    rs.size.height = length(size_px.1 as f32);
    taffy.set_style(root_node, rs)?;

    let available = taffy::geometry::Size {
        width: AvailableSpace::Definite(size_px.0 as f32),
        height: AvailableSpace::Definite(size_px.1 as f32),
    };
    taffy.compute_layout_with_measure(root_node, available, |known, _avail, _node, ctx, _style| {
        measure(known, ctx.as_deref())
    })?;

    let mut painter = Painter {
        taffy: &taffy,
        nodes: &nodes,
        focused,
        scene: Scene {
            clear_color: theme().background,
            nodes: Vec::new(),
        },
        hits: Vec::new(),
        sems: Vec::new(),
    };
    painter.walk(&root, (0.0, 0.0))?;
    Ok((painter.scene, painter.hits, painter.sems))
}

fn stamp(mut v: View, id: &mut u64) -> View {
    v.id = *id;
    *id += 1;
    v.children = v.children.into_iter().map(|c| stamp(c, id)).collect();
    v
}

fn measure(known: taffy::geometry::Size<Option<f32>>, ctx: Option<&NodeCtx>) -> taffy::geometry::Size<f32> {
    let (w, h) = match ctx {
        Some(NodeCtx::Text { text, font_sp }) => {
            let size_px = sp_to_px(*font_sp);
            (approx_text_width(text, size_px), line_height(size_px))
        }
        Some(NodeCtx::Button { label }) => (
            approx_text_width(label, sp_to_px(BUTTON_LABEL_SP)) + 2.0 * dp_to_px(BUTTON_PADDING_X_DP),
            dp_to_px(BUTTON_HEIGHT_DP),
        ),
        Some(NodeCtx::TextField) => (dp_to_px(TEXT_FIELD_WIDTH_DP), dp_to_px(TF_HEIGHT_DP)),
        Some(NodeCtx::Container) | Some(NodeCtx::Scroll) | None => (0.0, 0.0),
    };
    taffy::geometry::Size {
        width: known.width.unwrap_or(w),
        height: known.height.unwrap_or(h),
    }
}

fn build_node(
    v: &View,
    parent: Option<&ViewKind>,
    t: &mut TaffyTree<NodeCtx>,
    nodes: &mut HashMap<ViewId, NodeId>,
) -> Result<NodeId, TaffyError> {
    let style = style_from_modifier(&v.modifier, &v.kind, parent);
    let node = match &v.kind {
        ViewKind::Text {
            text, font_size, ..
        } => t.new_leaf_with_context(
            style,
            NodeCtx::Text {
                text: text.text.clone(),
                font_sp: *font_size,
            },
        )?,
        ViewKind::Button { text, .. } => t.new_leaf_with_context(
            style,
            NodeCtx::Button {
                label: text.clone(),
            },
        )?,
        ViewKind::TextField { .. } => t.new_leaf_with_context(style, NodeCtx::TextField)?,
        ViewKind::Image { .. } => t.new_leaf_with_context(style, NodeCtx::Container)?,
        kind => {
            let children = v
                .children
                .iter()
                .map(|c| build_node(c, Some(kind), t, nodes))
                .collect::<Result<Vec<_>, _>>()?;
            let n = t.new_with_children(style, &children)?;
            let ctx = if matches!(kind, ViewKind::ScrollV { .. }) {
                NodeCtx::Scroll
            } else {
                NodeCtx::Container
            };
            t.set_node_context(n, Some(ctx))?;
            n
        }
    };
    nodes.insert(v.id, node);
    Ok(node)
}

fn style_from_modifier(m: &Modifier, kind: &ViewKind, parent: Option<&ViewKind>) -> Style {
    let px = dp_to_px;
    let mut s = Style {
        display: Display::Flex,
        ..Default::default()
    };

    s.flex_direction = if matches!(kind, ViewKind::Row) {
        FlexDirection::Row
    } else {
        FlexDirection::Column
    };
    s.align_items = Some(m.align_items_container.unwrap_or(AlignItems::Stretch));
    s.justify_content = m.justify_content;
    if let Some(g) = m.gap {
        s.gap = taffy::geometry::Size {
            width: length(px(g)),
            height: length(px(g)),
        };
    }

    if let Some(a) = m.align_self {
        s.align_self = Some(a);
    }
    if let Some(g) = m.flex_grow {
        s.flex_grow = g;
        s.flex_basis = length(0.0);
    }
    if let Some(r) = m.aspect_ratio {
        s.aspect_ratio = Some(r.max(0.0));
    }

    if m.position_type == Some(PositionType::Absolute) {
        s.position = Position::Absolute;
        s.inset = taffy::geometry::Rect {
            left: m.offset_left.map(|v| length(px(v))).unwrap_or_else(auto),
            right: m.offset_right.map(|v| length(px(v))).unwrap_or_else(auto),
            top: m.offset_top.map(|v| length(px(v))).unwrap_or_else(auto),
            bottom: m.offset_bottom.map(|v| length(px(v))).unwrap_or_else(auto),
        };
    }

    if matches!(kind, ViewKind::ScrollV { .. }) {
        s.overflow = Point {
            x: Overflow::Hidden,
            y: Overflow::Hidden,
        };
    }

    if let Some(pv) = m.padding_values {
        s.padding = taffy::geometry::Rect {
            left: length(px(pv.left)),
            right: length(px(pv.right)),
            top: length(px(pv.top)),
            bottom: length(px(pv.bottom)),
        };
    } else if let Some(p) = m.padding {
        let v = length(px(p));
        s.padding = taffy::geometry::Rect {
            left: v,
            right: v,
            top: v,
            bottom: v,
        };
    }

    let mut width_set = false;
    let mut height_set = false;
    if let Some(sz) = m.size {
        s.size.width = length(px(sz.width.max(0.0)));
        s.size.height = length(px(sz.height.max(0.0)));
        width_set = true;
        height_set = true;
    }
    if let Some(w) = m.width {
        s.size.width = length(px(w.max(0.0)));
        width_set = true;
    }
    if let Some(h) = m.height {
        s.size.height = length(px(h.max(0.0)));
        height_set = true;
    }
    if let Some(f) = m.width_fraction {
        s.size.width = percent(f.clamp(0.0, 1.0));
        width_set = true;
    }

    let parent_is_row = matches!(parent, Some(ViewKind::Row));
    let parent_scrolls = matches!(parent, Some(ViewKind::ScrollV { .. }));

    // content of a scroll container keeps its full height
    if parent_scrolls {
        s.flex_shrink = 0.0;
    }

    // main axis fill grows, cross axis fill is a full percentage
    if m.fill_max_w && !width_set {
        if parent_is_row {
            s.flex_grow = s.flex_grow.max(1.0);
            s.flex_basis = length(0.0);
            s.min_size.width = length(0.0);
        } else {
            s.size.width = percent(1.0);
        }
    }
    if m.fill_max_h && !height_set && !parent_scrolls {
        if parent_is_row {
            s.size.height = percent(1.0);
        } else {
            s.flex_grow = s.flex_grow.max(1.0);
            s.flex_shrink = 1.0;
            s.flex_basis = length(0.0);
            s.min_size.height = length(0.0);
        }
    }

    if let Some(h) = m.min_height {
        s.min_size.height = length(px(h.max(0.0)));
    }
    if let Some(h) = m.max_height {
        s.max_size.height = length(px(h.max(0.0)));
    }

    s
}

/// Rect inside the padding of `rect`.
fn content_rect(rect: Rect, m: &Modifier) -> Rect {
    let (l, t, r, b) = if let Some(pv) = m.padding_values {
        (
            dp_to_px(pv.left),
            dp_to_px(pv.top),
            dp_to_px(pv.right),
            dp_to_px(pv.bottom),
        )
    } else if let Some(p) = m.padding {
        let p = dp_to_px(p);
        (p, p, p, p)
    } else {
        return rect;
    };
    Rect {
        x: rect.x + l,
        y: rect.y + t,
        w: (rect.w - l - r).max(0.0),
        h: (rect.h - t - b).max(0.0),
    }
}

fn region(id: u64, rect: Rect) -> HitRegion {
    HitRegion {
        id,
        rect,
        on_click: None,
        on_scroll: None,
        focusable: false,
        on_text_change: None,
        on_text_submit: None,
        text_value: None,
    }
}

fn sem(id: u64, role: Role, label: Option<String>, rect: Rect) -> SemNode {
    SemNode {
        id,
        role,
        label,
        value: None,
        rect,
        focused: false,
        enabled: true,
    }
}

struct Painter<'a> {
    taffy: &'a TaffyTree<NodeCtx>,
    nodes: &'a HashMap<ViewId, NodeId>,
    focused: Option<&'a str>,
    scene: Scene,
    hits: Vec<HitRegion>,
    sems: Vec<SemNode>,
}

impl Painter<'_> {
    fn node(&self, id: ViewId) -> Result<NodeId, HeadlessError> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(HeadlessError::MissingLayout(id))
    }

    fn local_rect(&self, id: ViewId) -> Result<Rect, HeadlessError> {
        let l = self.taffy.layout(self.node(id)?)?;
        Ok(Rect {
            x: l.location.x,
            y: l.location.y,
            w: l.size.width,
            h: l.size.height,
        })
    }

    /// Bottom edge of everything under `node`, relative to `node`.
    fn subtree_height(&self, node: NodeId) -> Result<f32, HeadlessError> {
        let mut h = self.taffy.layout(node)?.size.height;
        for ch in self.taffy.children(node)? {
            let y = self.taffy.layout(ch)?.location.y;
            h = h.max(y + self.subtree_height(ch)?);
        }
        Ok(h)
    }

    fn walk(&mut self, v: &View, offset: (f32, f32)) -> Result<(), HeadlessError> {
        let rect = self.local_rect(v.id)?.translate(offset.0, offset.1);
        let content = content_rect(rect, &v.modifier);
        let th = theme();
        let radius = v.modifier.clip_rounded.map(dp_to_px).unwrap_or(0.0);

        if let Some(e) = v.modifier.elevation.filter(|e| *e > 0.0) {
            self.scene.nodes.push(SceneNode::Rect {
                rect: rect.translate(0.0, dp_to_px(e)),
                brush: Brush::Solid(Color::BLACK.with_alpha(0.12)),
                radius,
            });
        }
        if let Some(bg) = v.modifier.background {
            self.scene.nodes.push(SceneNode::Rect {
                rect,
                brush: bg,
                radius,
            });
        }
        if let Some(b) = &v.modifier.border {
            self.scene.nodes.push(SceneNode::Border {
                rect,
                color: b.color,
                width: dp_to_px(b.width),
                radius: dp_to_px(b.radius).max(radius),
            });
        }
        if let Some(on_click) = &v.modifier.on_click {
            let mut hit = region(v.id, rect);
            hit.on_click = Some(on_click.clone());
            hit.focusable = true;
            self.hits.push(hit);
        }

        match &v.kind {
            ViewKind::Text {
                text,
                color,
                font_size,
                align,
            } => {
                let base_px = sp_to_px(*font_size);
                let total_w = approx_text_width(&text.text, base_px);
                let mut x = match align {
                    TextAlign::Start => content.x,
                    TextAlign::Center => content.x + (content.w - total_w).max(0.0) * 0.5,
                    TextAlign::End => content.x + (content.w - total_w).max(0.0),
                };
                let y = content.y + (content.h - line_height(base_px)).max(0.0) * 0.5;
                for (piece, style) in text.fragments() {
                    let size = style.font_size.map(sp_to_px).unwrap_or(base_px);
                    let w = approx_text_width(piece, size);
                    self.scene.nodes.push(SceneNode::Text {
                        rect: Rect {
                            x,
                            y,
                            w,
                            h: line_height(size),
                        },
                        text: piece.to_string(),
                        color: style.color.unwrap_or(*color),
                        size,
                    });
                    x += w;
                }
                self.sems
                    .push(sem(v.id, Role::Text, Some(text.text.clone()), rect));
            }
            ViewKind::Button { text, on_click } => {
                if v.modifier.background.is_none() {
                    self.scene.nodes.push(SceneNode::Rect {
                        rect,
                        brush: Brush::Solid(th.button_bg),
                        radius: v.modifier.clip_rounded.map(dp_to_px).unwrap_or(dp_to_px(6.0)),
                    });
                }
                let label_px = sp_to_px(BUTTON_LABEL_SP);
                let w = approx_text_width(text, label_px);
                self.scene.nodes.push(SceneNode::Text {
                    rect: Rect {
                        x: rect.x + (rect.w - w).max(0.0) * 0.5,
                        y: rect.y + (rect.h - label_px).max(0.0) * 0.5,
                        w,
                        h: label_px,
                    },
                    text: text.clone(),
                    color: th.on_primary,
                    size: label_px,
                });
                let mut hit = region(v.id, rect);
                hit.on_click = on_click.clone();
                hit.focusable = true;
                self.hits.push(hit);
                self.sems
                    .push(sem(v.id, Role::Button, Some(text.clone()), rect));
            }
            ViewKind::TextField {
                value,
                label,
                on_change,
                on_submit,
            } => {
                let is_focused = self.focused == Some(label.as_str());
                self.scene.nodes.push(SceneNode::Rect {
                    rect,
                    brush: Brush::Solid(th.surface),
                    radius: dp_to_px(4.0),
                });
                self.scene.nodes.push(SceneNode::Border {
                    rect,
                    color: if is_focused { th.focus } else { th.outline },
                    width: dp_to_px(if is_focused { 2.0 } else { 1.0 }),
                    radius: dp_to_px(4.0),
                });
                let size = sp_to_px(TF_FONT_SP);
                let (shown, color) = if value.is_empty() {
                    (label.clone(), th.outline)
                } else {
                    (value.clone(), th.on_surface)
                };
                self.scene.nodes.push(SceneNode::PushClip { rect, radius: 0.0 });
                self.scene.nodes.push(SceneNode::Text {
                    rect: Rect {
                        x: rect.x + dp_to_px(TF_PADDING_X_DP),
                        y: rect.y + (rect.h - line_height(size)).max(0.0) * 0.5,
                        w: approx_text_width(&shown, size),
                        h: line_height(size),
                    },
                    text: shown,
                    color,
                    size,
                });
                self.scene.nodes.push(SceneNode::PopClip);

                let mut hit = region(v.id, rect);
                hit.focusable = true;
                hit.on_text_change = on_change.clone();
                hit.on_text_submit = on_submit.clone();
                hit.text_value = Some(value.clone());
                self.hits.push(hit);

                let mut node = sem(v.id, Role::TextField, Some(label.clone()), rect);
                node.value = Some(value.clone());
                node.focused = is_focused;
                self.sems.push(node);
            }
            ViewKind::Image {
                handle,
                description,
                ..
            } => {
                match handle {
                    Some(handle) => self.scene.nodes.push(SceneNode::Image {
                        rect,
                        handle: handle.clone(),
                    }),
                    None => self.scene.nodes.push(SceneNode::Rect {
                        rect,
                        brush: Brush::Solid(th.outline.with_alpha(0.3)),
                        radius,
                    }),
                }
                self.sems
                    .push(sem(v.id, Role::Image, description.clone(), rect));
            }
            ViewKind::ScrollV {
                on_scroll,
                set_viewport_height,
                set_content_height,
                get_scroll_offset,
            } => {
                let mut hit = region(v.id, rect);
                hit.on_scroll = on_scroll.clone();
                self.hits.push(hit);

                let vp = content;
                if let Some(set_vh) = set_viewport_height {
                    set_vh(vp.h.max(0.0));
                }
                let mut content_h = 0.0f32;
                for c in &v.children {
                    let node = self.node(c.id)?;
                    let y = self.taffy.layout(node)?.location.y - (vp.y - rect.y);
                    content_h = content_h.max(y + self.subtree_height(node)?);
                }
                if let Some(set_ch) = set_content_height {
                    set_ch(content_h);
                }
                let scroll = get_scroll_offset.as_ref().map(|get| get()).unwrap_or(0.0);

                self.scene.nodes.push(SceneNode::PushClip { rect: vp, radius });
                let hit_start = self.hits.len();
                for c in &v.children {
                    self.walk(c, (rect.x, rect.y - scroll))?;
                }
                // descendants only receive input inside the viewport
                let mut i = hit_start;
                while i < self.hits.len() {
                    let clipped = self.hits[i].rect.intersect(&vp);
                    if clipped.is_empty() {
                        self.hits.remove(i);
                    } else {
                        self.hits[i].rect = clipped;
                        i += 1;
                    }
                }
                self.scene.nodes.push(SceneNode::PopClip);
                return Ok(());
            }
            _ => {
                if let Some(s) = &v.semantics {
                    let mut node = sem(v.id, s.role, s.label.clone(), rect);
                    node.value = s.value.clone();
                    node.enabled = s.enabled;
                    self.sems.push(node);
                }
            }
        }

        let clip = v.modifier.clip_rounded.is_some() && !v.children.is_empty();
        if clip {
            self.scene.nodes.push(SceneNode::PushClip { rect, radius });
        }
        for c in &v.children {
            self.walk(c, (rect.x, rect.y))?;
        }
        if clip {
            self.scene.nodes.push(SceneNode::PopClip);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use composable_ui::{Button, Column, LazyColumn, LazyListState, Row, Spacer, Text, ViewExt};

    use super::*;

    #[test]
    fn test_ids_shared_between_hits_and_semantics() {
        let root = Column(Modifier::new().fill_max_size()).child((
            Text("Title"),
            Button("Go", || {}),
        ));
        let (_scene, hits, sems) = layout_and_paint(&root, (400, 300), None).unwrap();
        let button = sems.iter().find(|s| s.role == Role::Button).unwrap();
        assert_eq!(button.label.as_deref(), Some("Go"));
        let hit = hits.iter().find(|h| h.id == button.id).unwrap();
        assert!(hit.on_click.is_some());
        assert_eq!(hit.rect.h, 36.0);
    }

    #[test]
    fn test_weighted_child_takes_remaining_width() {
        let root = Column(Modifier::new().fill_max_size()).child(
            Row(Modifier::new().fill_max_width()).child((
                composable_ui::Box(Modifier::new().weight(1.0).height(50.0)),
                Button("Go", || {}),
            )),
        );
        let (scene, _hits, sems) = layout_and_paint(&root, (400, 300), None).unwrap();
        let button = sems.iter().find(|s| s.role == Role::Button).unwrap();
        assert_eq!(button.rect.x + button.rect.w, 400.0);
        assert!(scene.nodes.iter().any(|n| matches!(n, SceneNode::Text { text, .. } if text == "Go")));
    }

    #[test]
    fn test_scroll_reports_viewport_and_clips_hits() {
        let state = LazyListState::new();
        let list = LazyColumn("list", 100, 40.0, state.clone(), Modifier::new().height(200.0), |i| {
            Button(format!("Item {i}"), || {})
        });
        let root = Column(Modifier::new().fill_max_size()).child((list, Spacer()));
        let (_scene, hits, sems) = layout_and_paint(&root, (400, 600), None).unwrap();
        assert_eq!(state.viewport_height(), 200.0);

        // "Item 5" lies past the 200 px viewport: painted but not clickable
        let item5 = sems
            .iter()
            .find(|s| s.label.as_deref() == Some("Item 5"))
            .unwrap();
        assert!(!hits.iter().any(|h| h.id == item5.id && h.on_click.is_some()));
        let item0 = sems
            .iter()
            .find(|s| s.label.as_deref() == Some("Item 0"))
            .unwrap();
        assert!(hits.iter().any(|h| h.id == item0.id));
    }

    #[test]
    fn test_text_field_region_carries_value() {
        let changed = Rc::new(Cell::new(false));
        let c = changed.clone();
        let root = Column(Modifier::new()).child(composable_ui::TextField(
            "Ada",
            "Enter name",
            Modifier::new(),
            move |_| c.set(true),
            |_| {},
        ));
        let (_scene, hits, sems) = layout_and_paint(&root, (400, 300), Some("Enter name")).unwrap();
        let field = sems.iter().find(|s| s.role == Role::TextField).unwrap();
        assert!(field.focused);
        assert_eq!(field.value.as_deref(), Some("Ada"));
        let hit = hits.iter().find(|h| h.id == field.id).unwrap();
        assert_eq!(hit.text_value.as_deref(), Some("Ada"));
        if let Some(cb) = &hit.on_text_change {
            cb("Adam".into());
        }
        assert!(changed.get());
    }

    #[test]
    fn test_images_paint_loaded_handle_or_placeholder() {
        let mut table = composable_core::ResourceTable::new();
        table.register_image("dot", 1, 1, vec![255, 0, 0, 255]).unwrap();
        let root = composable_core::with_resources(Rc::new(table), || {
            Column(Modifier::new().fill_max_size()).child((
                composable_ui::Image(Modifier::new().size(20.0, 20.0), "dot", Some("Dot")),
                composable_ui::Image(Modifier::new().size(20.0, 20.0), "missing", None),
            ))
        });
        let (scene, _hits, sems) = layout_and_paint(&root, (200, 200), None).unwrap();

        assert!(scene.nodes.iter().any(
            |n| matches!(n, SceneNode::Image { handle, .. } if handle.id == "dot" && handle.width == 1)
        ));
        assert_eq!(
            scene
                .nodes
                .iter()
                .filter(|n| matches!(n, SceneNode::Image { .. }))
                .count(),
            1
        );
        let images: Vec<_> = sems.iter().filter(|s| s.role == Role::Image).collect();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].label.as_deref(), Some("Dot"));
    }
}
