use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tracing::debug;

use super::{forward_to, Observable, SharedSubscriber, Upstream};
use crate::{
    errors::SharedError,
    observer::Observer,
    subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

pub(super) fn catch_error<S, T, F>(source: S, handler: F) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    F: Fn(SharedError) -> Observable<T> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let downstream_e = downstream.clone();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let fallback = Upstream::new();
        let fallback_c = Arc::clone(&fallback);
        let fallback_j = Arc::clone(&fallback);
        let handler = Arc::clone(&handler);

        let u = Subscriber::new(
            move |v| o_shared.lock().next(v),
            move |observable_error| {
                if fallback_c.is_cancelled() {
                    return;
                }
                debug!(error = %observable_error, "switching to fallback observable");
                let next = handler(observable_error);
                let forward = forward_to(&o_cloned_e).stopped_by(downstream_e.clone());
                let s = next.subscribe(fallback_c.attach(forward));
                fallback_c.set(s);
            },
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);

        let inner = source.subscribe(u);
        let inner_c = inner.clone();
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                inner_c.unsubscribe();
                fallback.cancel();
            })),
            // The fallback is only known once the source failed.
            SubscriptionHandle::JoinThen(vec![inner], Box::new(move || fallback_j.current())),
        )
    })
}

#[derive(Default)]
struct Resubscribe {
    running: bool,
    requested: bool,
}

struct Retry<S, T> {
    source: Arc<S>,
    downstream: SharedSubscriber<T>,
    downstream_flags: Vec<Arc<AtomicBool>>,
    retries_left: Mutex<usize>,
    current: Mutex<Option<Arc<Upstream>>>,
    cancelled: AtomicBool,
    resubscribe: Mutex<Resubscribe>,
}

impl<S, T> Retry<S, T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
{
    // Subscribes until an attempt no longer fails while being subscribed. A
    // source that errors synchronously asks this loop for the next attempt
    // instead of subscribing from inside its own error handler.
    fn run(self: &Arc<Self>) {
        {
            let mut resubscribe = self.resubscribe.lock();
            if resubscribe.running {
                resubscribe.requested = true;
                return;
            }
            resubscribe.running = true;
        }

        loop {
            self.subscribe_once();
            let mut resubscribe = self.resubscribe.lock();
            if resubscribe.requested {
                resubscribe.requested = false;
                continue;
            }
            resubscribe.running = false;
            break;
        }
    }

    fn subscribe_once(self: &Arc<Self>) {
        let upstream = Upstream::new();
        let previous = {
            let mut current = self.current.lock();
            if self.cancelled.load(Ordering::Acquire) {
                return;
            }
            current.replace(Arc::clone(&upstream))
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        let o_next = Arc::clone(&self.downstream);
        let this_e = Arc::clone(self);
        let this_c = Arc::clone(self);
        let u = Subscriber::new(
            move |v| o_next.lock().next(v),
            move |e| this_e.on_error(e),
            move || {
                this_c.downstream.lock().complete();
                this_c.release();
            },
        )
        .stopped_by(self.downstream_flags.clone());

        let inner = self.source.subscribe(upstream.attach(u));
        upstream.set(inner);
    }

    fn on_error(self: &Arc<Self>, e: SharedError) {
        let retries_left = {
            let mut left = self.retries_left.lock();
            let current = *left;
            *left = current.saturating_sub(1);
            current
        };

        if retries_left > 0 && !self.cancelled.load(Ordering::Acquire) {
            debug!(retries_left = retries_left - 1, error = %e, "resubscribing after error");
            self.run();
        } else {
            self.downstream.lock().error(e);
            self.release();
        }
    }

    // Drops the current attempt, which also breaks the reference cycle between
    // this state and the subscriber handed to the source.
    fn release(&self) {
        let current = self.current.lock().take();
        if let Some(upstream) = current {
            upstream.cancel();
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.release();
    }
}

pub(super) fn retry<S, T>(source: S, max_retries: usize) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
{
    let source = Arc::new(source);
    Observable::new(move |o| {
        let state = Arc::new(Retry {
            source: Arc::clone(&source),
            downstream_flags: o.stop_flags(),
            downstream: Arc::new(Mutex::new(o)),
            retries_left: Mutex::new(max_retries),
            current: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            resubscribe: Mutex::new(Resubscribe::default()),
        });
        state.run();

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || state.cancel())),
            SubscriptionHandle::Nil,
        )
    })
}
