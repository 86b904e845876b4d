//! Cooperative task scope tied to a composition scope.
//!
//! Tasks are plain `!Send` futures polled on the UI thread, once per frame,
//! with a no-op waker. Dropping a task is how it is cancelled.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use web_time::{Duration, Instant};

use crate::{clock, on_unmount, remember, runtime, scoped_effect};

type Task = Pin<Box<dyn Future<Output = ()>>>;

#[derive(Clone, Default)]
pub struct TaskScope {
    inner: Rc<TaskScopeInner>,
}

#[derive(Default)]
struct TaskScopeInner {
    tasks: RefCell<Vec<Task>>,
    // launched while a poll is running
    incoming: RefCell<Vec<Task>>,
    cancelled: Cell<bool>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `fut`; it first runs on the next `poll`. Ignored once the
    /// scope is cancelled.
    pub fn launch(&self, fut: impl Future<Output = ()> + 'static) {
        if self.inner.cancelled.get() {
            log::debug!("launch on a cancelled task scope ignored");
            return;
        }
        self.inner.incoming.borrow_mut().push(Box::pin(fut));
    }

    /// Polls every task once and drops the finished ones. Returns how many
    /// are still pending.
    pub fn poll(&self) -> usize {
        if self.inner.cancelled.get() {
            return 0;
        }
        let incoming = std::mem::take(&mut *self.inner.incoming.borrow_mut());
        let mut tasks = std::mem::take(&mut *self.inner.tasks.borrow_mut());
        tasks.extend(incoming);

        let mut cx = Context::from_waker(Waker::noop());
        tasks.retain_mut(|task| task.as_mut().poll(&mut cx).is_pending());

        if self.inner.cancelled.get() {
            return 0;
        }
        let pending = tasks.len();
        *self.inner.tasks.borrow_mut() = tasks;
        pending + self.inner.incoming.borrow().len()
    }

    /// Drops every task. Later launches are ignored.
    pub fn cancel(&self) {
        if self.inner.cancelled.replace(true) {
            return;
        }
        let tasks = std::mem::take(&mut *self.inner.tasks.borrow_mut());
        let incoming = std::mem::take(&mut *self.inner.incoming.borrow_mut());
        log::debug!("task scope cancelled ({} tasks)", tasks.len() + incoming.len());
        drop(tasks);
        drop(incoming);
    }

    pub fn is_active(&self) -> bool {
        !self.inner.cancelled.get()
    }

    pub fn active_tasks(&self) -> usize {
        self.inner.tasks.borrow().len() + self.inner.incoming.borrow().len()
    }
}

/// A task scope that lives as long as the calling composition scope. The
/// composition polls it every frame and cancels it when the scope leaves.
pub fn remember_task_scope() -> TaskScope {
    (*remember(|| {
        let tasks = TaskScope::new();
        runtime::register_task_scope(tasks.clone());
        let on_dispose = tasks.clone();
        scoped_effect(move || on_unmount(move || on_dispose.cancel()));
        tasks
    }))
    .clone()
}

/// Completes once `duration` has passed on the installed clock.
pub fn delay(duration: Duration) -> Delay {
    Delay {
        deadline: clock::now() + duration,
    }
}

pub struct Delay {
    deadline: Instant,
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if clock::now() >= self.deadline {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
