use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{
        atomic::{self, AtomicBool},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::trace;

use super::{Scheduler, Task};
use crate::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic};

struct VirtualTask {
    due: Duration,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: Task,
}

impl PartialEq for VirtualTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for VirtualTask {}

impl PartialOrd for VirtualTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct VirtualState {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<VirtualTask>,
}

/// A scheduler driven by a virtual clock.
///
/// Nothing runs until the clock is moved with [`advance_by`](Self::advance_by)
/// or the queue is drained with [`flush`](Self::flush). Tasks run on the thread
/// that moves the clock, in deadline order, which makes timed operators such as
/// `debounce` testable without sleeping.
#[derive(Clone, Default)]
pub struct VirtualTimeScheduler {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualTimeScheduler {
    #[must_use]
    pub fn new() -> Self {
        VirtualTimeScheduler::default()
    }

    /// Current virtual time, measured from the creation of the scheduler.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks waiting for their deadline, cancelled ones included.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Moves the clock forward by `by`, running every task that becomes due.
    ///
    /// Tasks scheduled by running tasks are honored if they fall inside the
    /// window.
    pub fn advance_by(&self, by: Duration) {
        let target = self.state.lock().now + by;
        self.run_until(Some(target));
        self.state.lock().now = target;
    }

    /// Runs every queued task, moving the clock to each deadline in turn.
    pub fn flush(&self) {
        self.run_until(None);
    }

    fn run_until(&self, target: Option<Duration>) {
        loop {
            let next = {
                let mut state = self.state.lock();
                let due = match state.queue.peek() {
                    Some(t) if target.map_or(true, |target| t.due <= target) => t.due,
                    _ => return,
                };
                state.now = state.now.max(due);
                state.queue.pop()
            };

            // The lock is released so the task may schedule more work.
            if let Some(next) = next {
                if !next.cancelled.load(atomic::Ordering::Acquire) {
                    trace!(at = ?next.due, "running virtual task");
                    (next.task)();
                }
            }
        }
    }
}

impl Scheduler for VirtualTimeScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let mut state = self.state.lock();
            let due = state.now + delay.unwrap_or(Duration::ZERO);
            let seq = state.seq;
            state.seq += 1;
            state.queue.push(VirtualTask {
                due,
                seq,
                cancelled: Arc::clone(&cancelled),
                task,
            });
        }

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                cancelled.store(true, atomic::Ordering::Release);
            })),
            SubscriptionHandle::Nil,
        )
    }
}
