use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use super::{Observable, SharedSubscriber, Upstream};
use crate::{
    errors::SharedError,
    observer::Observer,
    scheduler::Scheduler,
    subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

enum Notification<T> {
    Next(T),
    Error(SharedError),
    Complete,
}

struct Delivery<T> {
    queue: VecDeque<Notification<T>>,
    // A drain task is scheduled or running; only one exists at a time.
    draining: bool,
}

struct ObserveOn<T, Sch> {
    delivery: Mutex<Delivery<T>>,
    downstream: SharedSubscriber<T>,
    scheduler: Arc<Sch>,
}

impl<T: Send + 'static, Sch: Scheduler> ObserveOn<T, Sch> {
    fn push(self: &Arc<Self>, notification: Notification<T>) {
        let start = {
            let mut delivery = self.delivery.lock();
            delivery.queue.push_back(notification);
            !std::mem::replace(&mut delivery.draining, true)
        };
        if start {
            let this = Arc::clone(self);
            self.scheduler.schedule(None, Box::new(move || this.drain()));
        }
    }

    fn drain(&self) {
        loop {
            let notification = {
                let mut delivery = self.delivery.lock();
                match delivery.queue.pop_front() {
                    Some(n) => n,
                    None => {
                        delivery.draining = false;
                        return;
                    }
                }
            };
            let mut o = self.downstream.lock();
            match notification {
                Notification::Next(v) => o.next(v),
                Notification::Error(e) => o.error(e),
                Notification::Complete => o.complete(),
            }
        }
    }
}

pub(super) fn observe_on<S, T, Sch>(source: S, scheduler: Sch) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: Send + 'static,
    Sch: Scheduler,
{
    let scheduler = Arc::new(scheduler);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let state = Arc::new(ObserveOn {
            delivery: Mutex::new(Delivery {
                queue: VecDeque::new(),
                draining: false,
            }),
            downstream: Arc::new(Mutex::new(o)),
            scheduler: Arc::clone(&scheduler),
        });
        let (state_n, state_e, state_c) =
            (Arc::clone(&state), Arc::clone(&state), Arc::clone(&state));

        let u = Subscriber::new(
            move |v| state_n.push(Notification::Next(v)),
            move |e| state_e.push(Notification::Error(e)),
            move || state_c.push(Notification::Complete),
        )
        .stopped_by(downstream);

        let inner = source.subscribe(u);
        let inner_c = inner.clone();
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                inner_c.unsubscribe();
                state.delivery.lock().queue.clear();
            })),
            SubscriptionHandle::JoinSubscriptions(vec![inner]),
        )
    })
}

pub(super) fn subscribe_on<S, T, Sch>(source: S, scheduler: Sch) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    Sch: Scheduler,
{
    let source = Arc::new(source);
    let scheduler = Arc::new(scheduler);
    Observable::new(move |o| {
        let upstream = Upstream::new();
        let upstream_t = Arc::clone(&upstream);
        let source = Arc::clone(&source);

        let task = scheduler.schedule(
            None,
            Box::new(move || {
                if upstream_t.is_cancelled() {
                    return;
                }
                upstream_t.set(source.subscribe(o));
            }),
        );

        let task_c = task.clone();
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                task_c.unsubscribe();
                upstream.cancel();
            })),
            SubscriptionHandle::JoinSubscriptions(vec![task]),
        )
    })
}
