use std::time::Duration;

use super::{Scheduler, Task};
use crate::subscribe::Subscription;

/// Runs every task inline, on the thread that scheduled it.
///
/// A delay blocks the calling thread for its duration, so this scheduler suits
/// synchronous pipelines and tests rather than timed operators.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        task();
        Subscription::empty()
    }
}
