//! Schedulers decide where and when a unit of work runs.
//!
//! Every operator that needs to defer work or hop to another execution context
//! takes a scheduler as an explicit argument; there is no global default.
//!
//! - [`ImmediateScheduler`] runs work inline on the calling thread.
//! - [`EventLoopScheduler`] runs work in order on one dedicated thread, the
//!   designated context consumers usually want notifications delivered on.
//! - [`TokioScheduler`] spawns work concurrently on a Tokio runtime.
//! - [`VirtualTimeScheduler`] queues work against a virtual clock that only moves
//!   when told to, for deterministic tests of timed operators.

mod event_loop;
mod immediate;
mod tokio_scheduler;
mod virtual_time;

use std::time::Duration;

use crate::subscribe::Subscription;

pub use event_loop::EventLoopScheduler;
pub use immediate::ImmediateScheduler;
pub use tokio_scheduler::TokioScheduler;
pub use virtual_time::VirtualTimeScheduler;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context for deferred or relocated work.
pub trait Scheduler: Send + Sync + 'static {
    /// Runs `task` after `delay` (or as soon as possible when `None`).
    ///
    /// Unsubscribing the returned `Subscription` cancels the task if it did not
    /// start yet. Tasks scheduled with equal deadlines run in scheduling order on
    /// the serial schedulers.
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription;
}
