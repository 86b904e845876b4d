//! Transient notifications.
//!
//! `SnackbarHostState::show_snackbar` queues a message and returns a future
//! that resolves once the message has been shown and dismissed. Requests are
//! shown one at a time in the order they were made; a newer request never
//! cuts the current one short. Launch the future on a `TaskScope` tied to the
//! screen so that tearing the screen down cancels whatever is still queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::{Future, poll_fn};
use std::rc::Rc;
use std::task::Poll;

use composable_core::{clock, *};
use web_time::{Duration, Instant};

use crate::{Box, Surface, Text, TextStyle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnackbarDuration {
    #[default]
    Short,
    Long,
    Indefinite,
}

impl SnackbarDuration {
    /// `None` for `Indefinite`.
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            SnackbarDuration::Short => Some(Duration::from_secs(4)),
            SnackbarDuration::Long => Some(Duration::from_secs(10)),
            SnackbarDuration::Indefinite => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnackbarResult {
    Dismissed,
    ActionPerformed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnackbarData {
    pub message: String,
    pub duration: SnackbarDuration,
}

struct Showing {
    id: u64,
    deadline: Option<Instant>,
    outcome: Option<SnackbarResult>,
}

struct HostInner {
    current: MutableState<Option<SnackbarData>>,
    queue: RefCell<VecDeque<u64>>,
    showing: RefCell<Option<Showing>>,
    next_id: Cell<u64>,
    requests: RefCell<Vec<String>>,
}

/// Queue of snackbar requests plus the one currently on screen. Clones
/// share the same queue.
#[derive(Clone)]
pub struct SnackbarHostState {
    inner: Rc<HostInner>,
}

impl Default for SnackbarHostState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnackbarHostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnackbarHostState")
            .field("current", &self.current_message())
            .field("pending", &self.pending())
            .finish()
    }
}

impl SnackbarHostState {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(HostInner {
                current: mutable_state_of(None),
                queue: RefCell::new(VecDeque::new()),
                showing: RefCell::new(None),
                next_id: Cell::new(1),
                requests: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn show_snackbar(&self, message: String) -> impl Future<Output = SnackbarResult> + use<> {
        self.show_snackbar_with(message, SnackbarDuration::Short)
    }

    /// Enqueues `message` right away; the returned future completes after
    /// the message has had its turn. Dropping the future withdraws the
    /// request (or takes it off screen).
    pub fn show_snackbar_with(
        &self,
        message: String,
        duration: SnackbarDuration,
    ) -> impl Future<Output = SnackbarResult> + use<> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.queue.borrow_mut().push_back(id);
        self.inner.requests.borrow_mut().push(message.clone());
        log::debug!("snackbar #{id} queued: {message:?}");

        let ticket = Ticket {
            host: self.clone(),
            id,
        };
        async move {
            let host = ticket.host.clone();
            poll_fn(|_| {
                if host.try_begin(id, &message, duration) {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            })
            .await;
            let result = poll_fn(|_| match host.poll_showing(id) {
                Some(r) => Poll::Ready(r),
                None => Poll::Pending,
            })
            .await;
            drop(ticket);
            result
        }
    }

    /// Dismisses the snackbar on screen, if any.
    pub fn dismiss(&self) {
        self.resolve(SnackbarResult::Dismissed);
    }

    /// Resolves the snackbar on screen with `ActionPerformed`.
    pub fn perform_action(&self) {
        self.resolve(SnackbarResult::ActionPerformed);
    }

    /// The message on screen, without subscribing.
    pub fn current_message(&self) -> Option<String> {
        self.inner.current.with(|c| c.as_ref().map(|d| d.message.clone()))
    }

    /// Requests waiting behind the one on screen.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Every message ever requested, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.inner.requests.borrow().clone()
    }

    fn resolve(&self, result: SnackbarResult) {
        if let Some(showing) = self.inner.showing.borrow_mut().as_mut() {
            showing.outcome.get_or_insert(result);
        }
    }

    fn try_begin(&self, id: u64, message: &str, duration: SnackbarDuration) -> bool {
        if self.inner.showing.borrow().is_some() {
            return false;
        }
        {
            let mut queue = self.inner.queue.borrow_mut();
            if queue.front() != Some(&id) {
                return false;
            }
            queue.pop_front();
        }
        *self.inner.showing.borrow_mut() = Some(Showing {
            id,
            deadline: duration.as_duration().map(|d| clock::now() + d),
            outcome: None,
        });
        log::debug!("snackbar #{id} shown");
        self.inner.current.set(Some(SnackbarData {
            message: message.to_string(),
            duration,
        }));
        true
    }

    fn poll_showing(&self, id: u64) -> Option<SnackbarResult> {
        let result = {
            let showing = self.inner.showing.borrow();
            let s = showing.as_ref().filter(|s| s.id == id)?;
            match (s.outcome, s.deadline) {
                (Some(r), _) => r,
                (None, Some(deadline)) if clock::now() >= deadline => SnackbarResult::Dismissed,
                _ => return None,
            }
        };
        self.finish(id);
        Some(result)
    }

    fn finish(&self, id: u64) {
        let was_showing = {
            let mut showing = self.inner.showing.borrow_mut();
            if showing.as_ref().is_some_and(|s| s.id == id) {
                *showing = None;
                true
            } else {
                false
            }
        };
        if was_showing {
            log::debug!("snackbar #{id} hidden");
            self.inner.current.set(None);
        } else {
            self.inner.queue.borrow_mut().retain(|q| *q != id);
        }
    }
}

/// Withdraws its request when the future holding it is dropped.
struct Ticket {
    host: SnackbarHostState,
    id: u64,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.host.finish(self.id);
    }
}

/// Renders the snackbar on screen. Lives in its own scope, so showing or
/// hiding a message re-runs only the host.
pub fn SnackbarHost(state: SnackbarHostState) -> View {
    compose_scope("snackbar_host", (), move || {
        let th = theme();
        match state.inner.current.observe() {
            Some(data) => Surface(
                Modifier::new()
                    .fill_max_width()
                    .background(th.snackbar_bg)
                    .clip_rounded(4.0)
                    .padding_symmetric(16.0, 14.0)
                    .semantics(Semantics::new(Role::Container).label("Snackbar")),
                Text(data.message).color(th.on_snackbar),
            ),
            None => Box(Modifier::new()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Rc<RefCell<Vec<(String, SnackbarResult)>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn launch(
        tasks: &TaskScope,
        host: &SnackbarHostState,
        msg: &str,
        out: &Rc<RefCell<Vec<(String, SnackbarResult)>>>,
    ) {
        let fut = host.show_snackbar(msg.to_string());
        let out = out.clone();
        let msg = msg.to_string();
        tasks.launch(async move {
            let r = fut.await;
            out.borrow_mut().push((msg, r));
        });
    }

    #[test]
    fn test_requests_are_shown_in_order() {
        let test_clock = TestClock::new();
        clock::set_clock(Rc::new(test_clock.clone()));
        let host = SnackbarHostState::new();
        let tasks = TaskScope::new();
        let out = results();

        launch(&tasks, &host, "first", &out);
        launch(&tasks, &host, "second", &out);
        assert_eq!(host.requests(), vec!["first", "second"]);

        tasks.poll();
        assert_eq!(host.current_message().as_deref(), Some("first"));
        assert_eq!(host.pending(), 1);

        test_clock.advance(Duration::from_secs(3));
        tasks.poll();
        assert_eq!(host.current_message().as_deref(), Some("first"));

        test_clock.advance(Duration::from_secs(1));
        tasks.poll();
        assert_eq!(host.current_message().as_deref(), Some("second"));

        test_clock.advance(Duration::from_secs(4));
        assert_eq!(tasks.poll(), 0);
        assert_eq!(host.current_message(), None);
        assert_eq!(
            *out.borrow(),
            vec![
                ("first".to_string(), SnackbarResult::Dismissed),
                ("second".to_string(), SnackbarResult::Dismissed),
            ]
        );
    }

    #[test]
    fn test_dismiss_and_action() {
        let host = SnackbarHostState::new();
        let tasks = TaskScope::new();
        let out = Rc::new(RefCell::new(Vec::new()));
        {
            let out = out.clone();
            let fut = host.show_snackbar_with("stay".into(), SnackbarDuration::Indefinite);
            tasks.launch(async move { out.borrow_mut().push(fut.await) });
        }
        tasks.poll();
        tasks.poll();
        assert_eq!(host.current_message().as_deref(), Some("stay"));

        host.perform_action();
        host.dismiss();
        tasks.poll();
        assert_eq!(*out.borrow(), vec![SnackbarResult::ActionPerformed]);
        assert_eq!(host.current_message(), None);
    }

    #[test]
    fn test_cancel_withdraws_everything() {
        let host = SnackbarHostState::new();
        let tasks = TaskScope::new();
        let out = results();
        launch(&tasks, &host, "a", &out);
        launch(&tasks, &host, "b", &out);
        tasks.poll();
        assert_eq!(host.current_message().as_deref(), Some("a"));

        tasks.cancel();
        assert_eq!(host.current_message(), None);
        assert_eq!(host.pending(), 0);
        assert!(out.borrow().is_empty());
    }

    #[test]
    fn test_host_shows_current_message() {
        let host = SnackbarHostState::new();
        assert!(SnackbarHost(host.clone()).collect_text().is_empty());

        let tasks = TaskScope::new();
        let fut = host.show_snackbar("Hello Ada".into());
        tasks.launch(async move {
            fut.await;
        });
        tasks.poll();
        assert_eq!(SnackbarHost(host).collect_text(), vec!["Hello Ada"]);
    }
}
