//! The `observable` module provides the building blocks for creating and manipulating
//! observables.
//!
//! An [`Observable`] is cold: every subscription runs its subscribe function
//! again. Operators are provided by [`ObservableExt`] and work on anything that is
//! [`Subscribeable`], subject receivers included.

mod combine;
mod multicast;
mod recover;
mod schedule;
mod take;
mod time;
mod transform;

use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    errors::SharedError,
    observer::Observer,
    scheduler::Scheduler,
    subjects::BufSize,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

pub use multicast::Connectable;

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// Cloning an `Observable` is cheap and yields the same source: both clones run
/// the same subscribe function, once per subscription.
///
/// # Example: synchronous `Observable`
///
/// This `Observable` emits values and completes before `subscribe` returns. It
/// checks `is_stopped` so that operators such as `take` can end the loop early.
///
/// ```no_run
/// use rxkit::subscribe::{Subscriber, Subscription};
/// use rxkit::{Observable, ObservableExt, Observer, Subscribeable};
///
/// let emit_10 = Observable::new(|mut subscriber| {
///     for i in 1..=10 {
///         if subscriber.is_stopped() {
///             break;
///         }
///         subscriber.next(i);
///     }
///     subscriber.complete();
///     Subscription::empty()
/// });
///
/// let mut observer = Subscriber::on_next(|v| println!("Emitted {}", v));
/// observer.on_complete(|| println!("Completed"));
///
/// emit_10.take(3).subscribe(observer);
/// ```
///
/// # Example: asynchronous `Observable` with `unsubscribe`
///
/// Emits from an OS thread and stops when the returned `Subscription` is
/// unsubscribed. The thread handle lets the caller await the producer.
///
/// ```no_run
/// use std::{
///     sync::{
///         atomic::{AtomicBool, Ordering},
///         Arc,
///     },
///     time::Duration,
/// };
///
/// use rxkit::{
///     subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
///     Observable, ObservableExt, Observer, Subscribeable, Unsubscribeable,
/// };
///
/// let observable = Observable::new(|mut o| {
///     let done = Arc::new(AtomicBool::new(false));
///     let done_c = Arc::clone(&done);
///
///     let join_handle = std::thread::spawn(move || {
///         for i in 0..=10000 {
///             if done_c.load(Ordering::Acquire) {
///                 break;
///             }
///             o.next(i);
///             std::thread::sleep(Duration::from_millis(1));
///         }
///         o.complete();
///     });
///
///     Subscription::new(
///         UnsubscribeLogic::Logic(Box::new(move || done.store(true, Ordering::Release))),
///         SubscriptionHandle::JoinThread(join_handle),
///     )
/// });
///
/// let subscription = observable
///     .map(|v| format!("Mapped {}", v))
///     .subscribe(Subscriber::on_next(|v| println!("{}", v)));
///
/// std::thread::sleep(Duration::from_millis(50));
/// subscription.unsubscribe();
/// subscription.join().ok();
/// ```
///
/// # Example: asynchronous `Observable` with `Tokio`
///
///```no_run
/// use rxkit::{
///     subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
///     Observable, ObservableExt, Observer, Subscribeable,
/// };
///
/// #[tokio::main]
/// async fn main() {
///     let observable = Observable::new(|mut o| {
///         let join_handle = tokio::task::spawn(async move {
///             for i in 0..=15 {
///                 o.next(i);
///                 tokio::time::sleep(std::time::Duration::from_millis(1)).await;
///             }
///             o.complete();
///         });
///         let abort = join_handle.abort_handle();
///
///         Subscription::new(
///             UnsubscribeLogic::Logic(Box::new(move || abort.abort())),
///             SubscriptionHandle::JoinTask(join_handle),
///         )
///     });
///
///     let subscription = observable
///         .filter(|v| v % 2 == 0)
///         .subscribe(Subscriber::on_next(|v| println!("Emitted {}", v)));
///
///     if subscription.join_concurrent().await.is_err() {
///         // Handle error
///     }
/// }
///```
pub struct Observable<T> {
    subscribe_fn: Arc<dyn Fn(Subscriber<T>) -> Subscription + Send + Sync>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// `sf` runs once for every call to `subscribe` and must deliver signals to
    /// the `Subscriber` it receives. It returns a `Subscription` that releases
    /// whatever the producer holds and, for asynchronous producers, carries the
    /// handle used to await them.
    pub fn new(sf: impl Fn(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Arc::new(sf),
        }
    }

    /// Emits `value` once and completes.
    pub fn just(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Observable::new(move |mut o| {
            o.next(value.clone());
            o.complete();
            Subscription::empty()
        })
    }

    /// Emits every item of `iter` in order, then completes.
    ///
    /// Iteration stops as soon as the subscriber is stopped, so infinite iterators
    /// can be combined with `take`.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Observable::new(move |mut o| {
            for v in iter.clone() {
                if o.is_stopped() {
                    return Subscription::empty();
                }
                o.next(v);
            }
            o.complete();
            Subscription::empty()
        })
    }

    /// Completes immediately without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Observable::new(|mut o| {
            o.complete();
            Subscription::empty()
        })
    }

    /// Never emits and never terminates.
    #[must_use]
    pub fn never() -> Self {
        Observable::new(|_| Subscription::empty())
    }

    /// Signals `error` to every subscriber without emitting.
    pub fn throw<E: Error + Send + Sync + 'static>(error: E) -> Self {
        let error: SharedError = Arc::new(error);
        Observable::new(move |mut o| {
            o.error(Arc::clone(&error));
            Subscription::empty()
        })
    }

    /// Subscribes to every source and forwards their values as they arrive.
    ///
    /// Completes when all sources completed; the first error is forwarded and
    /// unsubscribes the remaining sources. An empty list completes immediately.
    #[must_use]
    pub fn merge_all(sources: Vec<Observable<T>>) -> Self {
        combine::merge_all(sources)
    }

    /// Combines the sources index by index, emitting a vector with one value from
    /// each source.
    #[must_use]
    pub fn zip_all(sources: Vec<Observable<T>>) -> Observable<Vec<T>>
    where
        T: Send,
    {
        combine::zip_all(sources)
    }
}

impl Observable<u64> {
    /// Emits `0, 1, 2, ...` every `period`, timed by `scheduler`.
    ///
    /// The scheduler must run delayed tasks asynchronously (or virtually);
    /// `ImmediateScheduler` would never return.
    pub fn interval<S: Scheduler>(period: Duration, scheduler: S) -> Self {
        time::interval(period, scheduler)
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&self, v: Subscriber<Self::ObsType>) -> Subscription {
        trace!("subscribing to observable");
        let closed = v.closed_flag();
        let inner = (self.subscribe_fn)(v);
        Subscription::silencing(inner, closed)
    }
}

type SharedSubscriber<T> = Arc<Mutex<Subscriber<T>>>;

fn into_observable<S, T>(source: S) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
{
    Observable::new(move |o| source.subscribe(o))
}

// Forwards every signal to a subscriber shared between several upstreams.
fn forward_to<T: 'static>(o: &SharedSubscriber<T>) -> Subscriber<T> {
    let o_next = Arc::clone(o);
    let o_error = Arc::clone(o);
    let o_complete = Arc::clone(o);
    Subscriber::new(
        move |v| o_next.lock().next(v),
        move |e| o_error.lock().error(e),
        move || o_complete.lock().complete(),
    )
}

/// The subscription an operator holds on its source.
///
/// A synchronous source emits before `subscribe` returns, so an operator that
/// wants to stop early cannot reach the `Subscription` yet. Cancelling marks the
/// attached subscriber closed right away (which stops well-behaved producers)
/// and unsubscribes the source as soon as its subscription is known.
pub(crate) struct Upstream {
    closed: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl Upstream {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Upstream {
            closed: Arc::new(AtomicBool::new(false)),
            subscription: Mutex::new(None),
        })
    }

    pub(crate) fn attach<T>(&self, s: Subscriber<T>) -> Subscriber<T> {
        s.stopped_by([Arc::clone(&self.closed)])
    }

    pub(crate) fn set(&self, subscription: Subscription) {
        let mut slot = self.subscription.lock();
        if self.closed.load(Ordering::SeqCst) {
            drop(slot);
            subscription.unsubscribe();
        } else {
            *slot = Some(subscription);
        }
    }

    pub(crate) fn cancel(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let subscription = self.subscription.lock().take();
        if let Some(s) = subscription {
            s.unsubscribe();
        }
    }

    pub(crate) fn current(&self) -> Option<Subscription> {
        self.subscription.lock().clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// Subscribes `s` to `source` through `upstream` and returns the subscription an
// operator hands downstream: unsubscribing it cancels the upstream and awaiting
// it awaits the source.
fn subscribe_through<S, T>(source: &S, upstream: &Arc<Upstream>, s: Subscriber<T>) -> Subscription
where
    S: Subscribeable<ObsType = T>,
{
    let inner = source.subscribe(upstream.attach(s));
    upstream.set(inner.clone());
    let upstream = Arc::clone(upstream);
    Subscription::new(
        UnsubscribeLogic::Logic(Box::new(move || upstream.cancel())),
        SubscriptionHandle::JoinSubscriptions(vec![inner]),
    )
}

/// The `ObservableExt` trait provides a set of extension methods that can be applied
/// to observables to transform and manipulate their behavior.
///
/// Every method consumes the source and returns a new `Observable`; the source
/// itself is never modified. It is implemented for every [`Subscribeable`], so
/// subject receivers can be used as sources as well.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
        U: 'static,
    {
        transform::map(self, f)
    }

    /// Like `map`, but `f` may fail.
    ///
    /// An `Err` is delivered downstream as an `RxError::Operator` error carrying
    /// the original error as its source; the observable is then unsubscribed
    /// and later values are dropped.
    fn try_map<U, E, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
        U: 'static,
    {
        transform::try_map(self, f)
    }

    /// Filters the items emitted by the observable based on a predicate function.
    fn filter<P>(self, predicate: P) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        transform::filter(self, predicate)
    }

    /// Emits the running accumulation of the items, starting from `seed`.
    ///
    /// Each subscription keeps its own accumulator.
    fn scan<A, F>(self, seed: A, combine: F) -> Observable<A>
    where
        Self: Sized + Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        F: Fn(&A, T) -> A + Send + Sync + 'static,
    {
        transform::scan(self, seed, combine)
    }

    /// Emits at most the first `n` items, then completes and unsubscribes.
    ///
    /// `take(0)` completes without subscribing to the source.
    fn take(self, n: usize) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        take::take(self, n)
    }

    /// Skips the first `n` items emitted by the observable and then emits the rest.
    fn skip(self, n: usize) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        take::skip(self, n)
    }

    /// Emits an item only once `duration` passed without a newer item.
    ///
    /// Every item restarts the timer. When the source completes, the pending item
    /// (if any) is emitted before completion; when it errors, the pending item is
    /// dropped. Timers run on `scheduler`.
    fn debounce<S>(self, duration: Duration, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
        S: Scheduler,
    {
        time::debounce(self, duration, scheduler)
    }

    /// Merges the current observable with a vector of observables, emitting items
    /// from all of them as they arrive.
    fn merge(self, sources: Vec<Observable<T>>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        let mut all = Vec::with_capacity(sources.len() + 1);
        all.push(into_observable(self));
        all.extend(sources);
        combine::merge_all(all)
    }

    /// Merges the current observable with another observable.
    fn merge_one(self, source: Observable<T>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        combine::merge_all(vec![into_observable(self), source])
    }

    /// Pairs the items of both observables by index.
    ///
    /// Completes as soon as one side completed and has no buffered item left.
    fn zip<U>(self, other: Observable<U>) -> Observable<(T, U)>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
        U: Send + 'static,
    {
        combine::zip(self, other)
    }

    /// Delivers every notification through `scheduler`, keeping their order.
    fn observe_on<S>(self, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
        S: Scheduler,
    {
        schedule::observe_on(self, scheduler)
    }

    /// Subscribes to the source from a task run by `scheduler`.
    ///
    /// Unsubscribing before the task ran cancels the subscription.
    fn subscribe_on<S>(self, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        S: Scheduler,
    {
        schedule::subscribe_on(self, scheduler)
    }

    /// On error, continues with the observable returned by `handler`.
    fn catch_error<F>(self, handler: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(SharedError) -> Observable<T> + Send + Sync + 'static,
    {
        recover::catch_error(self, handler)
    }

    /// On error, emits `value` and completes.
    fn catch_and_return(self, value: T) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send + Sync,
    {
        recover::catch_error(self, move |_| Observable::just(value.clone()))
    }

    /// Resubscribes to the source after an error, at most `max_retries` times,
    /// then forwards the last error.
    fn retry(self, max_retries: usize) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        recover::retry(self, max_retries)
    }

    /// Subscribes anything convertible into a `Subscriber`, such as a subject
    /// emitter.
    fn bind_to<O>(self, observer: O) -> Subscription
    where
        Self: Sized,
        O: Into<Subscriber<T>>,
    {
        self.subscribe(observer.into())
    }

    /// Shares one subscription to the source through a `Subject`, once
    /// `connect` is called.
    fn publish(self) -> Connectable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send,
    {
        Connectable::publish(into_observable(self))
    }

    /// Like `publish`, through a `ReplaySubject` with a buffer of `buf_size`.
    fn replay(self, buf_size: BufSize) -> Connectable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send,
    {
        Connectable::replay(into_observable(self), buf_size)
    }

    /// `publish().ref_count()`: the source is subscribed while at least one
    /// subscriber is.
    fn share(self) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send,
    {
        self.publish().ref_count()
    }

    /// `replay(BufSize::Bounded(n)).ref_count()`.
    fn share_replay(self, n: usize) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send,
    {
        self.replay(BufSize::Bounded(n)).ref_count()
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}
