//! Invalidation queue and the state → scope subscription graph.
//!
//! Writes never run anything. `state_changed` appends the written `StateId`
//! to a queue; `flush` turns queued ids into dirty scopes by following the
//! explicit subscriptions recorded with `subscribe`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;
use smallvec::SmallVec;

slotmap::new_key_type! {
    /// Identity of an observable cell.
    pub struct StateId;
    /// Identity of a restartable composition scope.
    pub struct ScopeId;
}

thread_local! {
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

#[derive(Default)]
struct DepGraph {
    states: SlotMap<StateId, ()>,
    scopes: SlotMap<ScopeId, ()>,
    // state -> scopes that observe it
    edges: HashMap<StateId, SmallVec<[ScopeId; 4]>>,
    // scope -> states it observes
    back: HashMap<ScopeId, SmallVec<[StateId; 4]>>,
    pending: Vec<StateId>,
    dirty: HashSet<ScopeId>,
}

impl DepGraph {
    fn unlink_scope(&mut self, scope: ScopeId) {
        if let Some(states) = self.back.remove(&scope) {
            for s in states {
                if let Some(set) = self.edges.get_mut(&s) {
                    set.retain(|o| *o != scope);
                }
            }
        }
    }
}

pub fn new_state() -> StateId {
    GRAPH.with(|g| g.borrow_mut().states.insert(()))
}

/// Forget a state cell. Safe to call while the thread is shutting down.
pub fn release_state(id: StateId) {
    let _ = GRAPH.try_with(|g| {
        let mut g = g.borrow_mut();
        g.states.remove(id);
        if let Some(observers) = g.edges.remove(&id) {
            for scope in observers {
                if let Some(states) = g.back.get_mut(&scope) {
                    states.retain(|s| *s != id);
                }
            }
        }
        g.pending.retain(|s| *s != id);
    });
}

pub fn new_scope() -> ScopeId {
    GRAPH.with(|g| g.borrow_mut().scopes.insert(()))
}

pub fn remove_scope(scope: ScopeId) {
    let _ = GRAPH.try_with(|g| {
        let mut g = g.borrow_mut();
        g.unlink_scope(scope);
        g.dirty.remove(&scope);
        g.scopes.remove(scope);
    });
}

/// Record that `scope` read `state` and must re-run when it changes.
pub fn subscribe(state: StateId, scope: ScopeId) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        if !g.states.contains_key(state) || !g.scopes.contains_key(scope) {
            return;
        }
        let observers = g.edges.entry(state).or_default();
        if !observers.contains(&scope) {
            observers.push(scope);
        }
        let states = g.back.entry(scope).or_default();
        if !states.contains(&state) {
            states.push(state);
        }
    });
}

/// Drop a scope's subscriptions and dirty mark before it re-runs.
pub fn clear_scope(scope: ScopeId) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        g.unlink_scope(scope);
        g.dirty.remove(&scope);
    });
}

pub fn state_changed(id: StateId) {
    let _ = GRAPH.try_with(|g| {
        let mut g = g.borrow_mut();
        if !g.pending.contains(&id) {
            g.pending.push(id);
        }
    });
}

pub fn mark_dirty(scope: ScopeId) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        if g.scopes.contains_key(scope) {
            g.dirty.insert(scope);
        }
    });
}

/// Drain the invalidation queue into dirty scopes. Returns the drained ids in
/// write order.
pub fn flush() -> Vec<StateId> {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let drained = std::mem::take(&mut g.pending);
        for id in &drained {
            let observers = g.edges.get(id).cloned().unwrap_or_default();
            for scope in observers {
                g.dirty.insert(scope);
            }
        }
        drained
    })
}

pub fn is_dirty(scope: ScopeId) -> bool {
    GRAPH.with(|g| g.borrow().dirty.contains(&scope))
}

pub fn observer_count(state: StateId) -> usize {
    GRAPH.with(|g| g.borrow().edges.get(&state).map_or(0, |o| o.len()))
}
