use std::{sync::Arc, time::Duration};

use crate::{
    errors::SharedError,
    observer::Observer,
    subscribe::{Subscribeable, Subscriber, Subscription, Unsubscribeable},
    Observable,
};

use super::shared::{BufSize, Multicast, ReplayBuffer};

/// Replaying old values to new subscribers, this variant of `Subject` emits these
/// values upon subscription.
///
/// This specialized variant of a `Subject` maintains a cache of previous values
/// and transmits them to new subscribers upon subscription, before any live
/// value.
///
/// Even when in a stopped state due to completion or an error, `ReplaySubject`
/// replays cached values before notifying new subscribers of the terminal
/// signal.
///
/// `emitter_receiver` takes the buffer size; `emitter_receiver_time_aware`
/// additionally takes how long a value stays eligible for replay.
///
/// # Examples
///
///```no_run
/// use rxkit::{
///     subjects::{BufSize, ReplaySubject},
///     subscribe::Subscriber,
/// };
/// use rxkit::{Observer, Subscribeable};
///
/// let (mut emitter, receiver) = ReplaySubject::emitter_receiver(BufSize::Bounded(2));
///
/// emitter.next("A");
/// emitter.next("B");
/// emitter.next("C");
///
/// // Receives "B" and "C".
/// receiver.subscribe(Subscriber::on_next(|v| println!("replayed {}", v)));
///```
pub struct ReplaySubject;

impl ReplaySubject {
    /// Creates a `ReplaySubject` that replays up to `buf_size` past values.
    #[must_use]
    pub fn emitter_receiver<T: Clone + Send + 'static>(
        buf_size: BufSize,
    ) -> (ReplaySubjectEmitter<T>, ReplaySubjectReceiver<T>) {
        Self::build(ReplayBuffer::new(buf_size, None))
    }

    /// Creates a `ReplaySubject` whose values are dropped from the replay buffer
    /// once they are older than `window`.
    #[must_use]
    pub fn emitter_receiver_time_aware<T: Clone + Send + 'static>(
        buf_size: BufSize,
        window: Duration,
    ) -> (ReplaySubjectEmitter<T>, ReplaySubjectReceiver<T>) {
        Self::build(ReplayBuffer::new(buf_size, Some(window)))
    }

    fn build<T: Clone + Send + 'static>(
        buffer: ReplayBuffer<T>,
    ) -> (ReplaySubjectEmitter<T>, ReplaySubjectReceiver<T>) {
        let inner = Multicast::new(buffer);
        (
            ReplaySubjectEmitter(Arc::clone(&inner)),
            ReplaySubjectReceiver(inner),
        )
    }
}

/// Multicasting emitter for `ReplaySubject`. Every value is recorded before it is
/// delivered.
pub struct ReplaySubjectEmitter<T>(Arc<Multicast<T, ReplayBuffer<T>>>);

/// Subscription handler for `ReplaySubject`.
pub struct ReplaySubjectReceiver<T>(Arc<Multicast<T, ReplayBuffer<T>>>);

impl<T> Clone for ReplaySubjectEmitter<T> {
    fn clone(&self) -> Self {
        ReplaySubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> Clone for ReplaySubjectReceiver<T> {
    fn clone(&self) -> Self {
        ReplaySubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T: Clone + Send + 'static> ReplaySubjectReceiver<T> {
    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + 'static> Subscribeable for ReplaySubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription {
        self.0.subscribe(s)
    }
}

impl<T: Clone + Send + 'static> Unsubscribeable for ReplaySubjectReceiver<T> {
    fn unsubscribe(&self) {
        self.0.close();
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

impl<T: Clone + Send + 'static> Observer for ReplaySubjectEmitter<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        self.0.next(v);
    }

    fn complete(&mut self) {
        self.0.complete();
    }

    fn error(&mut self, e: SharedError) {
        self.0.error(e);
    }
}

impl<T: Clone + Send + 'static> From<ReplaySubjectEmitter<T>> for Subscriber<T> {
    fn from(value: ReplaySubjectEmitter<T>) -> Self {
        let next = Arc::clone(&value.0);
        let error = Arc::clone(&value.0);
        Subscriber::new(
            move |v| next.next(v),
            move |e| error.error(e),
            move || value.0.complete(),
        )
    }
}

impl<T: Clone + Send + Sync + 'static> From<ReplaySubjectReceiver<T>> for Observable<T> {
    fn from(value: ReplaySubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}
