use bitflags::bitflags;
use composable_core::{Color, Rect, Scene, SceneNode};

bitflags! {
    /// Work a frame actually did.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FrameWork: u8 {
        const COMPOSE = 1 << 0;
        const TASKS = 1 << 1;
        const LAYOUT = 1 << 2;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metrics {
    pub frames: u64,
    /// Scope passes run by the last frame.
    pub recomposed_scopes: usize,
    /// Scope passes run since the app started.
    pub total_recomposed: u64,
    pub pending_tasks: usize,
    pub scene_nodes: usize,
    pub hit_regions: usize,
    pub work: FrameWork,
}

/// Developer overlay: per-frame counters, optionally drawn over the scene.
#[derive(Default)]
pub struct Hud {
    pub enabled: bool,
    metrics: Metrics,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn record(
        &mut self,
        recomposed: usize,
        pending_tasks: usize,
        work: FrameWork,
        scene: &Scene,
        hits: usize,
    ) {
        let m = &mut self.metrics;
        m.frames += 1;
        m.recomposed_scopes = recomposed;
        m.total_recomposed += recomposed as u64;
        m.pending_tasks = pending_tasks;
        m.scene_nodes = scene.nodes.len();
        m.hit_regions = hits;
        m.work = work;
        log::debug!(
            "frame {}: {:?}, {} scopes recomposed, {} nodes, {} tasks pending",
            m.frames,
            work,
            recomposed,
            m.scene_nodes,
            pending_tasks
        );
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn overlay(&self, scene: &mut Scene) {
        if !self.enabled {
            return;
        }
        let m = &self.metrics;
        let text = format!(
            "frame: {}  |  recomposed: {}  |  nodes: {}",
            m.frames, m.recomposed_scopes, m.scene_nodes
        );
        scene.nodes.push(SceneNode::Text {
            rect: Rect {
                x: 8.0,
                y: 8.0,
                w: 240.0,
                h: 16.0,
            },
            text,
            color: Color::from_hex("#AAAAAA"),
            size: 14.0,
        });
    }
}
