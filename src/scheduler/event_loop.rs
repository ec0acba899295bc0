use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{
        atomic::{self, AtomicBool, AtomicU64},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread::{self, ThreadId},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Scheduler, Task};
use crate::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic};

struct QueuedTask {
    due: Instant,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: Task,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on the deadline, FIFO for equal deadlines.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct EventLoopInner {
    sender: Mutex<mpsc::Sender<QueuedTask>>,
    seq: AtomicU64,
    thread_id: ThreadId,
}

/// Runs tasks one at a time, in deadline order, on a dedicated thread.
///
/// This is the designated context of an application: work observed on it never
/// runs concurrently with other work observed on it. Clones share the same
/// thread. The thread exits once every handle (including handles captured by
/// pending tasks) has been dropped.
#[derive(Clone)]
pub struct EventLoopScheduler {
    inner: Arc<EventLoopInner>,
}

impl EventLoopScheduler {
    /// Starts a new event loop thread with the given name.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the thread.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run_loop(&receiver, &thread_name))
            .expect("failed to spawn event loop thread");

        EventLoopScheduler {
            inner: Arc::new(EventLoopInner {
                sender: Mutex::new(sender),
                seq: AtomicU64::new(0),
                thread_id: handle.thread().id(),
            }),
        }
    }

    /// Returns `true` when called from the event loop thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }
}

fn run_loop(receiver: &mpsc::Receiver<QueuedTask>, name: &str) {
    let mut queue: BinaryHeap<QueuedTask> = BinaryHeap::new();

    loop {
        while queue.peek().map_or(false, |t| t.due <= Instant::now()) {
            if let Some(queued) = queue.pop() {
                if !queued.cancelled.load(atomic::Ordering::Acquire) {
                    (queued.task)();
                }
            }
        }

        let received = match queue.peek() {
            Some(next) => receiver.recv_timeout(next.due.saturating_duration_since(Instant::now())),
            None => receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(task) => queue.push(task),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => {
                debug!(event_loop = name, pending = queue.len(), "event loop stopped");
                return;
            }
        }
    }
}

impl Scheduler for EventLoopScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        let cancelled = Arc::new(AtomicBool::new(false));
        let queued = QueuedTask {
            due: Instant::now() + delay.unwrap_or(Duration::ZERO),
            seq: self.inner.seq.fetch_add(1, atomic::Ordering::Relaxed),
            cancelled: Arc::clone(&cancelled),
            task,
        };

        if self.inner.sender.lock().send(queued).is_err() {
            warn!("task scheduled on a stopped event loop was dropped");
            return Subscription::empty();
        }

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                cancelled.store(true, atomic::Ordering::Release);
            })),
            SubscriptionHandle::Nil,
        )
    }
}
