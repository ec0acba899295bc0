use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;

use super::{Observable, SharedSubscriber};
use crate::{
    observer::Observer,
    scheduler::Scheduler,
    subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

struct DebounceState<T> {
    pending: Option<T>,
    // Bumped on every value and on termination; a timer only fires for the
    // generation it was scheduled in.
    generation: u64,
    timer: Option<Subscription>,
}

impl<T> DebounceState<T> {
    fn invalidate(&mut self) -> Option<Subscription> {
        self.generation += 1;
        self.timer.take()
    }
}

pub(super) fn debounce<S, T, Sch>(source: S, duration: Duration, scheduler: Sch) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: Send + 'static,
    Sch: Scheduler,
{
    let scheduler = Arc::new(scheduler);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let state = Arc::new(Mutex::new(DebounceState {
            pending: None,
            generation: 0,
            timer: None,
        }));
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let state_u = Arc::clone(&state);
        let scheduler = Arc::clone(&scheduler);

        let u = Subscriber::new(
            move |v| {
                let (generation, previous) = {
                    let mut st = state.lock();
                    let previous = st.invalidate();
                    st.pending = Some(v);
                    (st.generation, previous)
                };
                if let Some(timer) = previous {
                    timer.unsubscribe();
                }

                let state_t = Arc::clone(&state);
                let o_t = Arc::clone(&o_shared);
                let timer = scheduler.schedule(
                    Some(duration),
                    Box::new(move || {
                        let mut st = state_t.lock();
                        if st.generation != generation {
                            return;
                        }
                        st.timer = None;
                        if let Some(v) = st.pending.take() {
                            o_t.lock().next(v);
                        }
                    }),
                );

                let mut st = state.lock();
                if st.generation == generation && st.pending.is_some() {
                    st.timer = Some(timer);
                }
            },
            move |observable_error| {
                let timer = {
                    let mut st = state_e.lock();
                    st.pending = None;
                    let timer = st.invalidate();
                    o_cloned_e.lock().error(observable_error);
                    timer
                };
                if let Some(timer) = timer {
                    timer.unsubscribe();
                }
            },
            move || {
                let timer = {
                    let mut st = state_c.lock();
                    let timer = st.invalidate();
                    let mut o = o_cloned_c.lock();
                    if let Some(v) = st.pending.take() {
                        o.next(v);
                    }
                    o.complete();
                    timer
                };
                if let Some(timer) = timer {
                    timer.unsubscribe();
                }
            },
        )
        .stopped_by(downstream);

        let inner = source.subscribe(u);
        let inner_c = inner.clone();
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                inner_c.unsubscribe();
                let timer = {
                    let mut st = state_u.lock();
                    st.pending = None;
                    st.invalidate()
                };
                if let Some(timer) = timer {
                    timer.unsubscribe();
                }
            })),
            SubscriptionHandle::JoinSubscriptions(vec![inner]),
        )
    })
}

struct Ticker<Sch> {
    scheduler: Arc<Sch>,
    period: Duration,
    stopped: Arc<AtomicBool>,
    pending: Arc<Mutex<Option<Subscription>>>,
}

impl<Sch: Scheduler> Ticker<Sch> {
    fn clone_handles(&self) -> Self {
        Ticker {
            scheduler: Arc::clone(&self.scheduler),
            period: self.period,
            stopped: Arc::clone(&self.stopped),
            pending: Arc::clone(&self.pending),
        }
    }

    fn schedule(self, o: SharedSubscriber<u64>, tick: u64) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let next = self.clone_handles();
        let task = self.scheduler.schedule(
            Some(self.period),
            Box::new(move || {
                if next.stopped.load(Ordering::Acquire) {
                    return;
                }
                {
                    let mut downstream = o.lock();
                    if downstream.is_stopped() {
                        return;
                    }
                    downstream.next(tick);
                }
                next.schedule(o, tick + 1);
            }),
        );
        *self.pending.lock() = Some(task);
    }
}

pub(super) fn interval<Sch: Scheduler>(period: Duration, scheduler: Sch) -> Observable<u64> {
    let scheduler = Arc::new(scheduler);
    Observable::new(move |o| {
        let ticker = Ticker {
            scheduler: Arc::clone(&scheduler),
            period,
            stopped: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(Mutex::new(None)),
        };
        let stopped = Arc::clone(&ticker.stopped);
        let pending = Arc::clone(&ticker.pending);
        ticker.schedule(Arc::new(Mutex::new(o)), 0);

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                stopped.store(true, Ordering::Release);
                let task = pending.lock().take();
                if let Some(task) = task {
                    task.unsubscribe();
                }
            })),
            SubscriptionHandle::Nil,
        )
    })
}
