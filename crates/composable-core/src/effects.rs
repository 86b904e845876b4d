use std::cell::RefCell;
use std::rc::Rc;

use crate::{remember, runtime, scoped_effect};

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }
}

/// Helper to register cleanup inside an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Runs once after the current pass commits, every time the calling scope
/// completes a pass. Never part of the pass's output.
///
/// Outside a composition the effect runs immediately.
pub fn side_effect(effect: impl FnOnce() + 'static) {
    if let Some(effect) = runtime::defer_effect(Box::new(effect)) {
        effect();
    }
}

/// Runs `effect` when `key` changes (and on first composition); the previous
/// cleanup runs first. The last cleanup runs when the scope is disposed.
pub fn disposable_effect<K: PartialEq + Clone + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    let last_key = remember(|| RefCell::new(None::<K>));
    let cleanup_slot = remember(|| {
        let slot = Rc::new(RefCell::new(None::<Dispose>));
        let on_dispose = slot.clone();
        scoped_effect(move || {
            on_unmount(move || {
                let d = on_dispose.borrow_mut().take();
                if let Some(d) = d {
                    d.run();
                }
            })
        });
        slot
    });

    let changed = last_key.borrow().as_ref() != Some(&key);
    if changed {
        *last_key.borrow_mut() = Some(key);
        let previous = cleanup_slot.borrow_mut().take();
        if let Some(d) = previous {
            d.run();
        }
        *cleanup_slot.borrow_mut() = Some(effect());
    }
}
