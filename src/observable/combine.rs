use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use super::{Observable, SharedSubscriber, Upstream};
use crate::{
    observer::Observer,
    subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
    },
};

fn cancel_all(upstreams: &[Arc<Upstream>]) {
    for upstream in upstreams {
        upstream.cancel();
    }
}

// Subscribes to every source in order through its own upstream slot. Sources
// whose slot was cancelled meanwhile (an earlier source failed synchronously)
// are not subscribed at all.
fn subscribe_each<T: 'static>(
    sources: &[Observable<T>],
    upstreams: &Arc<Vec<Arc<Upstream>>>,
    mut make_subscriber: impl FnMut(usize) -> Subscriber<T>,
) -> Subscription {
    let mut inners = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let upstream = &upstreams[i];
        if upstream.is_cancelled() {
            continue;
        }
        let inner = source.subscribe(upstream.attach(make_subscriber(i)));
        upstream.set(inner.clone());
        inners.push(inner);
    }

    let upstreams = Arc::clone(upstreams);
    Subscription::new(
        UnsubscribeLogic::Logic(Box::new(move || cancel_all(&upstreams))),
        SubscriptionHandle::JoinSubscriptions(inners),
    )
}

fn upstreams_for(n: usize) -> Arc<Vec<Arc<Upstream>>> {
    Arc::new((0..n).map(|_| Upstream::new()).collect())
}

pub(super) fn merge_all<T: 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
    Observable::new(move |mut o| {
        if sources.is_empty() {
            o.complete();
            return Subscription::empty();
        }

        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let remaining = Arc::new(AtomicUsize::new(sources.len()));
        let upstreams = upstreams_for(sources.len());

        subscribe_each(&sources, &upstreams, |_| {
            let o_next = Arc::clone(&o_shared);
            let o_error = Arc::clone(&o_shared);
            let o_complete = Arc::clone(&o_shared);
            let all = Arc::clone(&upstreams);
            let remaining = Arc::clone(&remaining);

            Subscriber::new(
                move |v| o_next.lock().next(v),
                move |e| {
                    o_error.lock().error(e);
                    cancel_all(&all);
                },
                move || {
                    if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                        o_complete.lock().complete();
                    }
                },
            )
            .stopped_by(downstream.clone())
        })
    })
}

struct ZipAllState<T> {
    buffers: Vec<VecDeque<T>>,
    done: Vec<bool>,
    finished: bool,
}

impl<T> ZipAllState<T> {
    fn pop_row(&mut self) -> Option<Vec<T>> {
        if self.buffers.iter().any(VecDeque::is_empty) {
            return None;
        }
        Some(self.buffers.iter_mut().filter_map(VecDeque::pop_front).collect())
    }

    // A completed source with nothing buffered can never contribute again.
    fn exhausted(&self) -> bool {
        self.buffers
            .iter()
            .zip(&self.done)
            .any(|(buffer, done)| *done && buffer.is_empty())
    }

    // Emits every complete row and completes downstream once exhausted.
    // Returns `true` when the zip just finished.
    fn drain(&mut self, o: &SharedSubscriber<Vec<T>>) -> bool {
        while let Some(row) = self.pop_row() {
            o.lock().next(row);
        }
        if self.exhausted() {
            self.finished = true;
            o.lock().complete();
            return true;
        }
        false
    }
}

pub(super) fn zip_all<T: Send + 'static>(sources: Vec<Observable<T>>) -> Observable<Vec<T>> {
    Observable::new(move |mut o| {
        if sources.is_empty() {
            o.complete();
            return Subscription::empty();
        }

        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let state = Arc::new(Mutex::new(ZipAllState {
            buffers: sources.iter().map(|_| VecDeque::new()).collect(),
            done: vec![false; sources.len()],
            finished: false,
        }));
        let upstreams = upstreams_for(sources.len());

        subscribe_each(&sources, &upstreams, |i| {
            let (state_n, state_e, state_c) =
                (Arc::clone(&state), Arc::clone(&state), Arc::clone(&state));
            let (o_n, o_e, o_c) = (
                Arc::clone(&o_shared),
                Arc::clone(&o_shared),
                Arc::clone(&o_shared),
            );
            let (all_n, all_e, all_c) = (
                Arc::clone(&upstreams),
                Arc::clone(&upstreams),
                Arc::clone(&upstreams),
            );

            Subscriber::new(
                move |v| {
                    let finished = {
                        let mut st = state_n.lock();
                        if st.finished {
                            return;
                        }
                        st.buffers[i].push_back(v);
                        st.drain(&o_n)
                    };
                    if finished {
                        cancel_all(&all_n);
                    }
                },
                move |e| {
                    {
                        let mut st = state_e.lock();
                        if st.finished {
                            return;
                        }
                        st.finished = true;
                        o_e.lock().error(e);
                    }
                    cancel_all(&all_e);
                },
                move || {
                    let finished = {
                        let mut st = state_c.lock();
                        if st.finished {
                            return;
                        }
                        st.done[i] = true;
                        st.drain(&o_c)
                    };
                    if finished {
                        cancel_all(&all_c);
                    }
                },
            )
            .stopped_by(downstream.clone())
        })
    })
}

struct ZipState<A, B> {
    left: VecDeque<A>,
    right: VecDeque<B>,
    left_done: bool,
    right_done: bool,
    finished: bool,
}

impl<A, B> ZipState<A, B> {
    fn drain(&mut self, o: &SharedSubscriber<(A, B)>) -> bool {
        while !self.left.is_empty() && !self.right.is_empty() {
            if let (Some(a), Some(b)) = (self.left.pop_front(), self.right.pop_front()) {
                o.lock().next((a, b));
            }
        }
        let exhausted = (self.left_done && self.left.is_empty())
            || (self.right_done && self.right.is_empty());
        if exhausted {
            self.finished = true;
            o.lock().complete();
        }
        exhausted
    }
}

enum Side<A, B> {
    Left(A),
    Right(B),
}

fn zip_subscriber<A, B, V>(
    state: &Arc<Mutex<ZipState<A, B>>>,
    o: &SharedSubscriber<(A, B)>,
    upstreams: &[Arc<Upstream>; 2],
    side: fn(V) -> Side<A, B>,
    mark_done: fn(&mut ZipState<A, B>),
) -> Subscriber<V>
where
    A: Send + 'static,
    B: Send + 'static,
    V: 'static,
{
    let (state_n, state_e, state_c) = (Arc::clone(state), Arc::clone(state), Arc::clone(state));
    let (o_n, o_e, o_c) = (Arc::clone(o), Arc::clone(o), Arc::clone(o));
    let (ups_n, ups_e, ups_c) = (upstreams.clone(), upstreams.clone(), upstreams.clone());

    Subscriber::new(
        move |v| {
            let finished = {
                let mut st = state_n.lock();
                if st.finished {
                    return;
                }
                match side(v) {
                    Side::Left(a) => st.left.push_back(a),
                    Side::Right(b) => st.right.push_back(b),
                }
                st.drain(&o_n)
            };
            if finished {
                cancel_all(&ups_n);
            }
        },
        move |e| {
            {
                let mut st = state_e.lock();
                if st.finished {
                    return;
                }
                st.finished = true;
                o_e.lock().error(e);
            }
            cancel_all(&ups_e);
        },
        move || {
            let finished = {
                let mut st = state_c.lock();
                if st.finished {
                    return;
                }
                mark_done(&mut st);
                st.drain(&o_c)
            };
            if finished {
                cancel_all(&ups_c);
            }
        },
    )
}

pub(super) fn zip<S, A, B>(source: S, other: Observable<B>) -> Observable<(A, B)>
where
    S: Subscribeable<ObsType = A> + Send + Sync + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    Observable::new(move |o| {
        let downstream = o.stop_flags();
        let o_shared = Arc::new(Mutex::new(o));
        let state = Arc::new(Mutex::new(ZipState {
            left: VecDeque::new(),
            right: VecDeque::new(),
            left_done: false,
            right_done: false,
            finished: false,
        }));
        let upstreams = [Upstream::new(), Upstream::new()];

        let left = zip_subscriber(
            &state,
            &o_shared,
            &upstreams,
            Side::Left,
            |st| st.left_done = true,
        )
        .stopped_by(downstream.clone());
        let left_inner = source.subscribe(upstreams[0].attach(left));
        upstreams[0].set(left_inner.clone());

        let mut inners = vec![left_inner];
        if !upstreams[1].is_cancelled() {
            let right = zip_subscriber(
                &state,
                &o_shared,
                &upstreams,
                Side::Right,
                |st| st.right_done = true,
            )
            .stopped_by(downstream);
            let right_inner = other.subscribe(upstreams[1].attach(right));
            upstreams[1].set(right_inner.clone());
            inners.push(right_inner);
        }

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || cancel_all(&upstreams))),
            SubscriptionHandle::JoinSubscriptions(inners),
        )
    })
}
