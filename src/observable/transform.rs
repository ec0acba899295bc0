use std::{error::Error, sync::Arc};

use parking_lot::Mutex;

use super::{subscribe_through, Observable, Upstream};
use crate::{
    errors::RxError,
    observer::Observer,
    subscribe::{Subscribeable, Subscriber},
};

pub(super) fn map<S, T, U, F>(source: S, f: F) -> Observable<U>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    U: 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let f = Arc::clone(&f);

        let u = Subscriber::new(
            move |v| {
                let t = f(v);
                o_shared.lock().next(t);
            },
            move |observable_error| o_cloned_e.lock().error(observable_error),
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);
        source.subscribe(u)
    })
}

pub(super) fn try_map<S, T, U, E, F>(source: S, f: F) -> Observable<U>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    U: 'static,
    E: Error + Send + Sync + 'static,
    F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let f = Arc::clone(&f);
        let upstream = Upstream::new();
        let upstream_c = Arc::clone(&upstream);

        let u = Subscriber::new(
            move |v| match f(v) {
                Ok(t) => o_shared.lock().next(t),
                Err(e) => {
                    o_shared.lock().error(RxError::operator("try_map", e));
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

pub(super) fn filter<S, T, P>(source: S, predicate: P) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let predicate = Arc::clone(&predicate);

        let u = Subscriber::new(
            move |v| {
                if predicate(&v) {
                    o_shared.lock().next(v);
                }
            },
            move |observable_error| o_cloned_e.lock().error(observable_error),
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);
        source.subscribe(u)
    })
}

pub(super) fn scan<S, T, A, F>(source: S, seed: A, combine: F) -> Observable<A>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    A: Clone + Send + Sync + 'static,
    F: Fn(&A, T) -> A + Send + Sync + 'static,
{
    let combine = Arc::new(combine);
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);
        let combine = Arc::clone(&combine);
        // Private to this subscription.
        let mut acc = seed.clone();

        let u = Subscriber::new(
            move |v| {
                acc = combine(&acc, v);
                o_shared.lock().next(acc.clone());
            },
            move |observable_error| o_cloned_e.lock().error(observable_error),
            move || o_cloned_c.lock().complete(),
        )
        .stopped_by(downstream);
        source.subscribe(u)
    })
}
