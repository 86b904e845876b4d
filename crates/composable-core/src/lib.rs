//! # State, scopes, and effects
//!
//! The core runtime recomposes a UI description (`View`) out of plain
//! functions. Three pieces cooperate:
//!
//! - `MutableState<T>`: an observable cell with a stable `StateId`.
//! - restartable scopes (`compose_scope`): keyed regions of composition whose
//!   output is cached and re-run on their own.
//! - effects (`side_effect`, `disposable_effect`, `remember_task_scope`):
//!   work that runs after a pass commits, or for as long as a scope lives.
//!
//! ## Observable state
//!
//! ```rust
//! use composable_core::*;
//!
//! let count = mutable_state_of(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Subscriptions are explicit. `get()` is an untracked read; `observe()`
//! reads and subscribes the scope that is currently composing, so a later
//! write re-runs that scope and nothing else. Writes go onto an invalidation
//! queue keyed by `StateId`; the queue is drained by
//! `Composition::recompose`.
//!
//! ## Restartable scopes
//!
//! ```rust
//! use composable_core::*;
//!
//! let color = mutable_state_of(Color::RED);
//! let composition = Composition::new({
//!     let color = color.clone();
//!     move || {
//!         let color = color.clone();
//!         compose_scope("swatch", (), move || {
//!             let c = color.observe();
//!             View::new(0, ViewKind::Box).modifier(Modifier::new().background(c))
//!         })
//!     }
//! });
//! composition.recompose();
//! color.set(Color::BLUE);
//! // only "root/swatch" runs again
//! composition.recompose();
//! assert_eq!(composition.recompositions("root"), 1);
//! assert_eq!(composition.recompositions("root/swatch"), 2);
//! ```
//!
//! A child scope is skipped when it is not dirty and the `inputs` passed by
//! its parent compare equal to the previous pass. Skipped scopes keep their
//! cached output; `Composition::tree` splices every cached output into one
//! materialized tree.
//!
//! ## Remembered values
//!
//! `remember` and `remember_state` are order-based per scope: the Nth call
//! inside a scope always refers to the Nth stored value. `remember_with_key`
//! is stable across conditional branches. Remembered values are dropped when
//! their scope leaves the composition.
//!
//! ## Effects
//!
//! - `side_effect` runs once after every completed pass of the calling scope.
//! - `disposable_effect` runs when its key changes and cleans up on key change
//!   or when the scope is disposed.
//! - `remember_task_scope` returns a cooperative executor whose tasks are
//!   dropped (cancelled) with the scope.

pub mod clock;
pub mod color;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod locals;
pub mod modifier;
pub mod prelude;
pub mod reactive;
pub mod resources;
pub mod runtime;
pub mod scope;
pub mod semantics;
pub mod state;
pub mod tasks;
pub mod tests;
pub mod text;
pub mod view;

pub use color::*;
pub use effects::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use locals::*;
pub use modifier::*;
pub use prelude::*;
pub use reactive::{ScopeId, StateId};
pub use resources::*;
pub use runtime::*;
pub use semantics::*;
pub use state::*;
pub use tasks::*;
pub use text::*;
pub use view::*;
