use std::time::Duration;

use tokio::runtime::Handle;

use super::{Scheduler, Task};
use crate::{
    errors::RxError,
    subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic},
};

/// Spawns every task on a Tokio runtime, so tasks may run concurrently.
///
/// Delays are implemented with `tokio::time::sleep`; no thread is blocked while
/// a task waits for its deadline.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Uses the runtime the caller is currently running in.
    ///
    /// # Errors
    ///
    /// Returns `RxError::NoRuntime` when called outside of a Tokio runtime.
    pub fn current() -> Result<Self, RxError> {
        Ok(TokioScheduler {
            handle: Handle::try_current()?,
        })
    }

    /// Uses the runtime behind `handle`.
    #[must_use]
    pub fn from_handle(handle: Handle) -> Self {
        TokioScheduler { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        let join_handle = self.handle.spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            task();
        });
        let abort_handle = join_handle.abort_handle();

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || abort_handle.abort())),
            SubscriptionHandle::JoinTask(join_handle),
        )
    }
}
