use std::sync::Arc;

use parking_lot::Mutex;

use super::{subscribe_through, Observable, Upstream};
use crate::{
    observer::Observer,
    subscribe::{Subscribeable, Subscriber, Subscription},
};

pub(super) fn take<S, T>(source: S, n: usize) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
{
    Observable::new(move |mut o| {
        if n == 0 {
            o.complete();
            return Subscription::empty();
        }

        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let upstream = Upstream::new();
        let upstream_c = Arc::clone(&upstream);
        let mut taken = 0;

        let u = Subscriber::new(
            move |v| {
                if taken >= n {
                    return;
                }
                taken += 1;
                let mut o = o_shared.lock();
                o.next(v);
                if taken == n {
                    o.complete();
                    drop(o);
                    upstream_c.cancel();
                }
            },
            move |observable_error| o_cloned_e.lock().error(observable_error),
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);
        subscribe_through(&source, &upstream, u)
    })
}

pub(super) fn skip<S, T>(source: S, n: usize) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
{
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);

        let mut n = n;
        let u = Subscriber::new(
            move |v| {
                if n > 0 {
                    n -= 1;
                    return;
                }
                o_shared.lock().next(v);
            },
            move |observable_error| o_cloned_e.lock().error(observable_error),
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);
        source.subscribe(u)
    })
}
