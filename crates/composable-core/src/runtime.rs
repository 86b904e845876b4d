use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::locals::{self, LocalsSnapshot};
use crate::reactive::{self, ScopeId, StateId};
use crate::scope::Scope;
use crate::tasks::TaskScope;
use crate::{MutableState, Rect, Scene, View, ViewKind, semantics::Role};

thread_local! {
    static CURRENT: RefCell<Option<Rc<Composer>>> = const { RefCell::new(None) };
}

struct ScopeRecord {
    key: String,
    parent: Option<ScopeId>,
    depth: usize,
    children: HashMap<String, ScopeId>,
    content: Rc<dyn Fn() -> View>,
    inputs: Option<Box<dyn Any>>,
    output: Option<View>,
    slots: Vec<Box<dyn Any>>,
    keyed_slots: HashMap<String, Box<dyn Any>>,
    lifecycle: Scope,
    locals: LocalsSnapshot,
    recompositions: u64,
}

impl ScopeRecord {
    fn new(key: String, parent: Option<ScopeId>, depth: usize, content: Rc<dyn Fn() -> View>) -> Self {
        Self {
            key,
            parent,
            depth,
            children: HashMap::new(),
            content,
            inputs: None,
            output: None,
            slots: Vec::new(),
            keyed_slots: HashMap::new(),
            lifecycle: Scope::new(),
            locals: locals::snapshot(),
            recompositions: 0,
        }
    }
}

struct ActiveFrame {
    scope: ScopeId,
    cursor: usize,
    visited: HashSet<String>,
}

/// Owns every scope record of one composition and the work queued while a
/// pass runs.
struct Composer {
    root: ScopeId,
    records: RefCell<HashMap<ScopeId, ScopeRecord>>,
    stack: RefCell<Vec<ActiveFrame>>,
    pending_effects: RefCell<Vec<Box<dyn FnOnce()>>>,
    pending_disposal: RefCell<Vec<(ScopeId, ScopeRecord)>>,
    task_scopes: RefCell<Vec<TaskScope>>,
    runs: Cell<usize>,
}

fn current() -> Option<Rc<Composer>> {
    CURRENT.with(|c| c.borrow().clone())
}

fn current_frame_scope() -> Option<ScopeId> {
    current().and_then(|c| c.stack.borrow().last().map(|f| f.scope))
}

struct CurrentGuard {
    prev: Option<Rc<Composer>>,
}

impl CurrentGuard {
    fn install(composer: Rc<Composer>) -> Self {
        let prev = CURRENT.with(|c| c.borrow_mut().replace(composer));
        Self { prev }
    }
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT.with(|c| *c.borrow_mut() = prev);
    }
}

impl Composer {
    /// Re-runs one scope's content. Children the content no longer reaches
    /// are queued for disposal.
    fn run(&self, id: ScopeId) {
        let Some((content, lifecycle, snapshot)) = self
            .records
            .borrow()
            .get(&id)
            .map(|r| (r.content.clone(), r.lifecycle.clone(), r.locals.clone()))
        else {
            return;
        };

        reactive::clear_scope(id);
        self.stack.borrow_mut().push(ActiveFrame {
            scope: id,
            cursor: 0,
            visited: HashSet::new(),
        });
        let view = locals::with_snapshot(&snapshot, || lifecycle.run(|| content()));
        let frame = self.stack.borrow_mut().pop();
        self.runs.set(self.runs.get() + 1);

        let mut stale = Vec::new();
        {
            let mut records = self.records.borrow_mut();
            if let Some(record) = records.get_mut(&id) {
                if let Some(frame) = &frame {
                    record.children.retain(|key, child| {
                        let keep = frame.visited.contains(key);
                        if !keep {
                            stale.push(*child);
                        }
                        keep
                    });
                }
                record.output = Some(view);
                record.recompositions += 1;
                log::trace!("recomposed scope '{}' ({} runs)", record.key, record.recompositions);
            }
        }
        for child in stale {
            self.detach(child);
        }
    }

    /// Removes a scope and its descendants from the record table.
    fn detach(&self, id: ScopeId) {
        let mut queue = vec![id];
        while let Some(id) = queue.pop() {
            let record = self.records.borrow_mut().remove(&id);
            if let Some(record) = record {
                queue.extend(record.children.values().copied());
                log::debug!("scope '{}' left the composition", record.key);
                self.pending_disposal.borrow_mut().push((id, record));
            }
        }
    }

    fn dispose_detached(&self) {
        let detached = std::mem::take(&mut *self.pending_disposal.borrow_mut());
        for (id, record) in detached {
            record.lifecycle.dispose();
            reactive::remove_scope(id);
            drop(record);
        }
    }

    fn commit(&self) {
        let effects = std::mem::take(&mut *self.pending_effects.borrow_mut());
        for effect in effects {
            effect();
        }
        self.dispose_detached();
    }

    fn path_of(&self, id: ScopeId) -> String {
        let records = self.records.borrow();
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(id) = cursor {
            match records.get(&id) {
                Some(r) => {
                    parts.push(r.key.clone());
                    cursor = r.parent;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join("/")
    }
}

/// Subscribe the scope that is currently composing to `state`. Outside a
/// composition this is a no-op.
pub fn observe_state(state: StateId) {
    if let Some(scope) = current_frame_scope() {
        reactive::subscribe(state, scope);
    }
}

/// Queues `effect` for commit when a pass is running; hands it back
/// otherwise.
pub(crate) fn defer_effect(effect: Box<dyn FnOnce()>) -> Option<Box<dyn FnOnce()>> {
    match current() {
        Some(c) if !c.stack.borrow().is_empty() => {
            c.pending_effects.borrow_mut().push(effect);
            None
        }
        _ => Some(effect),
    }
}

pub(crate) fn register_task_scope(tasks: TaskScope) {
    if let Some(c) = current() {
        c.task_scopes.borrow_mut().push(tasks);
    }
}

/// Restartable scope.
///
/// Within a composition, `content` runs in its own scope keyed by `key`
/// under the calling scope. It is skipped (and its cached output reused)
/// when the scope is not dirty and `inputs` equal the previous pass's.
/// The returned view is a placeholder that `Composition::tree` replaces
/// with the cached output.
///
/// Outside a composition `content` simply runs.
pub fn compose_scope<K: PartialEq + 'static>(
    key: impl Into<String>,
    inputs: K,
    content: impl Fn() -> View + 'static,
) -> View {
    let Some(composer) = current() else {
        return content();
    };
    let Some(parent) = composer.stack.borrow().last().map(|f| f.scope) else {
        return content();
    };

    let mut key = key.into();
    {
        let mut stack = composer.stack.borrow_mut();
        if let Some(frame) = stack.last_mut() {
            if frame.visited.contains(&key) {
                let mut n = 1;
                while frame.visited.contains(&format!("{key}#{n}")) {
                    n += 1;
                }
                log::warn!("compose_scope: duplicate key '{key}'; using '{key}#{n}'");
                key = format!("{key}#{n}");
            }
            frame.visited.insert(key.clone());
        }
    }

    let content: Rc<dyn Fn() -> View> = Rc::new(content);
    let (id, should_run) = {
        let mut records = composer.records.borrow_mut();
        let existing = records.get(&parent).and_then(|p| p.children.get(&key).copied());
        match existing.and_then(|id| records.get_mut(&id).map(|r| (id, r))) {
            Some((id, record)) => {
                let same_inputs = record
                    .inputs
                    .as_ref()
                    .and_then(|prev| prev.downcast_ref::<K>())
                    .is_some_and(|prev| *prev == inputs);
                if !same_inputs {
                    record.inputs = Some(Box::new(inputs));
                }
                record.content = content;
                record.locals = locals::snapshot();
                let run = !same_inputs || record.output.is_none() || reactive::is_dirty(id);
                (id, run)
            }
            None => {
                let depth = records.get(&parent).map_or(1, |p| p.depth + 1);
                let id = reactive::new_scope();
                let mut record = ScopeRecord::new(key.clone(), Some(parent), depth, content);
                record.inputs = Some(Box::new(inputs));
                records.insert(id, record);
                if let Some(p) = records.get_mut(&parent) {
                    p.children.insert(key, id);
                }
                (id, true)
            }
        }
    };

    if should_run {
        composer.run(id);
    }
    View::new(0, ViewKind::Scope { id })
}

/// Slot-based remember, per scope (sequential composition only).
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let Some(composer) = current() else {
        return Rc::new(init());
    };
    let Some((scope, cursor)) = composer.stack.borrow_mut().last_mut().map(|f| {
        let cursor = f.cursor;
        f.cursor += 1;
        (f.scope, cursor)
    }) else {
        return Rc::new(init());
    };

    let found = {
        let records = composer.records.borrow();
        records
            .get(&scope)
            .and_then(|r| r.slots.get(cursor))
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned())
    };
    match found {
        Some(Some(rc)) => rc,
        found => {
            if found.is_some() {
                log::warn!(
                    "remember: slot {cursor} type changed; replacing. \
                     If this is due to conditional composition, prefer remember_with_key."
                );
            }
            let rc: Rc<T> = Rc::new(init());
            let mut records = composer.records.borrow_mut();
            if let Some(r) = records.get_mut(&scope) {
                if cursor < r.slots.len() {
                    r.slots[cursor] = Box::new(rc.clone());
                } else {
                    r.slots.push(Box::new(rc.clone()));
                }
            }
            rc
        }
    }
}

/// Key-based remember, per scope.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let key = key.into();
    let Some(composer) = current() else {
        return Rc::new(init());
    };
    let Some(scope) = composer.stack.borrow().last().map(|f| f.scope) else {
        return Rc::new(init());
    };

    let found = {
        let records = composer.records.borrow();
        records
            .get(&scope)
            .and_then(|r| r.keyed_slots.get(&key))
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned())
    };
    match found {
        Some(Some(rc)) => rc,
        found => {
            if found.is_some() {
                log::warn!("remember_with_key: key '{key}' reused with a different type; replacing.");
            }
            let rc: Rc<T> = Rc::new(init());
            if let Some(r) = composer.records.borrow_mut().get_mut(&scope) {
                r.keyed_slots.insert(key, Box::new(rc.clone()));
            }
            rc
        }
    }
}

/// An observable cell that lives as long as the calling scope.
pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> MutableState<T> {
    (*remember(|| MutableState::new(init()))).clone()
}

/// A tree of restartable scopes rooted at one content function.
pub struct Composition {
    composer: Rc<Composer>,
}

impl Composition {
    pub fn new(content: impl Fn() -> View + 'static) -> Self {
        let root = reactive::new_scope();
        let mut records = HashMap::new();
        records.insert(root, ScopeRecord::new("root".into(), None, 0, Rc::new(content)));
        Self {
            composer: Rc::new(Composer {
                root,
                records: RefCell::new(records),
                stack: RefCell::new(Vec::new()),
                pending_effects: RefCell::new(Vec::new()),
                pending_disposal: RefCell::new(Vec::new()),
                task_scopes: RefCell::new(Vec::new()),
                runs: Cell::new(0),
            }),
        }
    }

    /// Drains the invalidation queue, re-runs dirty scopes top-down and
    /// commits. Returns how many scopes ran.
    pub fn recompose(&self) -> usize {
        let _guard = CurrentGuard::install(self.composer.clone());
        let c = &self.composer;
        c.runs.set(0);
        reactive::flush();

        let mut dirty: Vec<(usize, ScopeId)> = c
            .records
            .borrow()
            .iter()
            .filter(|(id, r)| r.output.is_none() || reactive::is_dirty(**id))
            .map(|(id, r)| (r.depth, *id))
            .collect();
        dirty.sort_by_key(|(depth, _)| *depth);

        for (_, id) in dirty {
            // an ancestor's pass may already have re-run or removed it
            let still = c
                .records
                .borrow()
                .get(&id)
                .is_some_and(|r| r.output.is_none() || reactive::is_dirty(id));
            if still {
                log::debug!("recompose '{}'", c.path_of(id));
                c.run(id);
            }
        }

        c.commit();
        c.runs.get()
    }

    /// True when a state some scope observes was written since the last pass.
    pub fn needs_recompose(&self) -> bool {
        reactive::flush();
        self.composer
            .records
            .borrow()
            .iter()
            .any(|(id, r)| r.output.is_none() || reactive::is_dirty(*id))
    }

    /// Marks the root dirty; the next `recompose` re-runs it.
    pub fn invalidate_all(&self) {
        reactive::mark_dirty(self.composer.root);
    }

    /// The full tree, with every scope placeholder replaced by the scope's
    /// cached output.
    pub fn tree(&self) -> View {
        let records = self.composer.records.borrow();
        records
            .get(&self.composer.root)
            .and_then(|r| r.output.as_ref())
            .map(|v| materialize(v, &records))
            .unwrap_or_else(|| View::new(0, ViewKind::Box))
    }

    /// Completed passes of the scope at `path` (`"root"`, `"root/child"`).
    /// Unknown paths report 0.
    pub fn recompositions(&self, path: &str) -> u64 {
        let records = self.composer.records.borrow();
        let mut parts = path.split('/');
        if parts.next() != Some("root") {
            return 0;
        }
        let mut id = self.composer.root;
        for part in parts {
            match records.get(&id).and_then(|r| r.children.get(part)) {
                Some(child) => id = *child,
                None => return 0,
            }
        }
        records.get(&id).map_or(0, |r| r.recompositions)
    }

    /// `(path, completed passes)` for every live scope, sorted by path.
    pub fn scope_stats(&self) -> Vec<(String, u64)> {
        let ids: Vec<(ScopeId, u64)> = self
            .composer
            .records
            .borrow()
            .iter()
            .map(|(id, r)| (*id, r.recompositions))
            .collect();
        let mut out: Vec<(String, u64)> = ids
            .into_iter()
            .map(|(id, n)| (self.composer.path_of(id), n))
            .collect();
        out.sort();
        out
    }

    pub fn scope_count(&self) -> usize {
        self.composer.records.borrow().len()
    }

    /// Polls every live task scope once. Returns the number of tasks still
    /// pending.
    pub fn poll_tasks(&self) -> usize {
        let _guard = CurrentGuard::install(self.composer.clone());
        let scopes: Vec<TaskScope> = {
            let mut scopes = self.composer.task_scopes.borrow_mut();
            scopes.retain(|s| s.is_active());
            scopes.clone()
        };
        scopes.iter().map(|s| s.poll()).sum()
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        let c = &self.composer;
        c.detach(c.root);
        c.pending_effects.borrow_mut().clear();
        c.dispose_detached();
        for tasks in c.task_scopes.borrow_mut().drain(..) {
            tasks.cancel();
        }
    }
}

fn materialize(view: &View, records: &HashMap<ScopeId, ScopeRecord>) -> View {
    if let ViewKind::Scope { id } = view.kind {
        return records
            .get(&id)
            .and_then(|r| r.output.as_ref())
            .map(|v| materialize(v, records))
            .unwrap_or_else(|| View::new(0, ViewKind::Box));
    }
    View {
        id: view.id,
        kind: view.kind.clone(),
        modifier: view.modifier.clone(),
        children: view
            .children
            .iter()
            .map(|c| materialize(c, records))
            .collect(),
        semantics: view.semantics.clone(),
    }
}

/// Frame: output of one tick, scene plus input/semantics.
pub struct Frame {
    pub scene: Scene,
    pub hit_regions: Vec<HitRegion>,
    pub semantics_nodes: Vec<SemNode>,
    pub focus_chain: Vec<u64>,
}

#[derive(Clone)]
pub struct HitRegion {
    pub id: u64,
    pub rect: Rect,
    pub on_click: Option<Rc<dyn Fn()>>,
    /// Vertical delta in, unconsumed delta out.
    pub on_scroll: Option<Rc<dyn Fn(f32) -> f32>>,
    pub focusable: bool,
    pub on_text_change: Option<Rc<dyn Fn(String)>>,
    pub on_text_submit: Option<Rc<dyn Fn(String)>>,
    /// Value of the controlled field this region belongs to.
    pub text_value: Option<String>,
}

/// Flattened semantics node produced by layout.
///
/// Carries the resolved screen rect, role, label, value and focus state.
/// Drivers route events by label through these.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SemNode {
    /// Shared with the associated `HitRegion`.
    pub id: u64,
    pub role: Role,
    pub label: Option<String>,
    pub value: Option<String>,
    pub rect: Rect,
    pub focused: bool,
    pub enabled: bool,
}
