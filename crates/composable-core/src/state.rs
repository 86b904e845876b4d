use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::reactive::{self, StateId};
use crate::runtime;

pub type SubId = usize;

/// Observable cell. Cloning yields another handle to the same cell.
pub struct MutableState<T: 'static>(Rc<StateCell<T>>);

struct StateCell<T> {
    id: StateId,
    value: RefCell<T>,
    subs: RefCell<Vec<(SubId, Rc<dyn Fn(&T)>)>>,
    next_sub: Cell<SubId>,
}

impl<T> Drop for StateCell<T> {
    fn drop(&mut self) {
        reactive::release_state(self.id);
    }
}

impl<T: 'static> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("id", &self.0.id)
            .field("value", &*self.0.value.borrow())
            .finish()
    }
}

impl<T: 'static> MutableState<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(StateCell {
            id: reactive::new_state(),
            value: RefCell::new(value),
            subs: RefCell::new(Vec::new()),
            next_sub: Cell::new(0),
        }))
    }

    pub fn id(&self) -> StateId {
        self.0.id
    }

    /// Untracked read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    /// Read and subscribe the scope that is currently composing.
    pub fn observe(&self) -> T
    where
        T: Clone,
    {
        runtime::observe_state(self.0.id);
        self.get()
    }

    /// Mutate in place. Always counts as a change.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.0.value.borrow_mut());
        self.notify();
    }

    /// Register a callback observer. Callbacks must not write back into
    /// this same state.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let id = self.0.next_sub.get();
        self.0.next_sub.set(id + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) {
        self.0.subs.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self) {
        reactive::state_changed(self.0.id);
        let subs: Vec<Rc<dyn Fn(&T)>> = self.0.subs.borrow().iter().map(|(_, s)| s.clone()).collect();
        let value = self.0.value.borrow();
        for s in subs {
            s(&value);
        }
    }
}

impl<T: PartialEq + 'static> MutableState<T> {
    /// Replace the value. Writing an equal value is not a change.
    pub fn set(&self, v: T) {
        if *self.0.value.borrow() == v {
            return;
        }
        *self.0.value.borrow_mut() = v;
        self.notify();
    }
}

pub fn mutable_state_of<T: 'static>(value: T) -> MutableState<T> {
    MutableState::new(value)
}
