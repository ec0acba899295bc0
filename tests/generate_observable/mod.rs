#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use rxkit::{
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable, Observer,
};

/// Emits `0..=end` from an OS thread, one value per millisecond, and stops early
/// once unsubscribed. The last value the thread emitted is stored in `last_emit`.
pub fn generate_u32_observable(end: u32, last_emit: Arc<Mutex<Option<u32>>>) -> Observable<u32> {
    Observable::new(move |mut o: Subscriber<_>| {
        let done = Arc::new(AtomicBool::new(false));
        let done_c = Arc::clone(&done);
        let last_emit = Arc::clone(&last_emit);

        let jh = std::thread::spawn(move || {
            for i in 0..=end {
                if done_c.load(Ordering::Acquire) {
                    break;
                }
                *last_emit.lock() = Some(i);
                o.next(i);
                // Give unsubscribe a chance between emissions.
                std::thread::sleep(Duration::from_millis(1));
            }
            o.complete();
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || done.store(true, Ordering::Release))),
            SubscriptionHandle::JoinThread(jh),
        )
    })
}

/// Emits `0..=end` from a Tokio task, one value per millisecond.
pub fn generate_u32_observable_async(end: u32) -> Observable<u32> {
    Observable::new(move |mut o: Subscriber<_>| {
        let jh = tokio::task::spawn(async move {
            for i in 0..=end {
                o.next(i);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            o.complete();
        });
        let abort = jh.abort_handle();

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || abort.abort())),
            SubscriptionHandle::JoinTask(jh),
        )
    })
}
