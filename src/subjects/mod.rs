//! The `subjects` module provides subjects: values that are both observers and
//! observables, letting many observers share a single source.
//!
//! Subjects are split into an emitter and a receiver by their `emitter_receiver`
//! function. Both halves are cheap clones of one shared state.
//!
//! The emitter behaves as an `Observer`, enabling `next()`, `error()` and
//! `complete()` calls. It converts into a `Subscriber`, so it can be subscribed to
//! another `Observable` (see `ObservableExt::bind_to`).
//!
//! The receiver functions as an `Observable`. Calling `unsubscribe` on it closes
//! the subject: it no longer emits nor registers observers.
//!
//! Three varieties differ in what late subscribers receive:
//!
//! - [`Subject`] forwards only live values.
//! - [`ReplaySubject`] replays a bounded or unbounded buffer of past values,
//!   optionally limited to a time window.
//! - [`BehaviorSubject`] replays its single current value.
//!
//! Observer callbacks must not emit into the same subject synchronously for the
//! subscriber currently being notified.

mod behavior_subject;
mod shared;
mod replay_subject;
mod subject;

pub use shared::BufSize;
pub use behavior_subject::*;
pub use replay_subject::*;
pub use subject::*;
