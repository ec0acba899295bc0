use std::sync::Arc;

use crate::{
    errors::SharedError,
    observer::Observer,
    subscribe::{Subscribeable, Subscriber, Subscription, Unsubscribeable},
    Observable,
};

use super::shared::{Multicast, NoHistory};

/// A `Subject` represents a unique variant of an `Observable` that enables
/// multicasting values to multiple `Observers`.
///
/// Unlike regular `Observables`, which are unicast (each subscribed `Observer` has
/// its independent execution of the `Observable`), `Subjects` are multicast. A
/// `Subject` forwards each value only to the observers registered at the moment it
/// is emitted.
///
/// If the subject terminated, new subscribers receive only the terminal
/// notification.
///
/// Use `Subject::emitter_receiver` to get a [`SubjectEmitter`] for emitting values
/// and a [`SubjectReceiver`] for subscribing to emitted values.
///
/// # Examples
///
///```no_run
/// use rxkit::{subjects::Subject, subscribe::Subscriber};
/// use rxkit::{ObservableExt, Observer, Subscribeable};
///
/// pub fn create_subscriber(subscriber_id: i32) -> Subscriber<i32> {
///     Subscriber::new(
///         move |v| println!("Subscriber #{} emitted: {}", subscriber_id, v),
///         |_| eprintln!("Error"),
///         move || println!("Completed {}", subscriber_id),
///     )
/// }
///
/// let (mut emitter, receiver) = Subject::emitter_receiver();
///
/// receiver.subscribe(create_subscriber(1));
///
/// emitter.next(101); // Emits 101 to `Subscriber` 1.
///
/// // All Observable operators can be applied to the receiver.
/// receiver
///     .clone()
///     .map(|v| format!("mapped {}", v))
///     .subscribe(Subscriber::on_next(|v| println!("Subscriber #2 emitted: {}", v)));
///
/// emitter.next(102); // Emits 102 to `Subscriber`s 1 and 2.
/// emitter.complete();
///
/// // Post-completion subscribe, completes immediately.
/// receiver.subscribe(create_subscriber(3));
///```
pub struct Subject;

impl Subject {
    /// Creates a new pair of `SubjectEmitter` for emitting values and
    /// `SubjectReceiver` for subscribing to values.
    #[must_use]
    pub fn emitter_receiver<T: Clone + Send + 'static>() -> (SubjectEmitter<T>, SubjectReceiver<T>) {
        let inner = Multicast::new(NoHistory);
        (
            SubjectEmitter(Arc::clone(&inner)),
            SubjectReceiver(inner),
        )
    }
}

/// Multicasting emitter for `Subject`.
///
/// `SubjectEmitter` acts as an `Observer`: its `next`, `error` and `complete`
/// calls are multicast to every registered observer.
pub struct SubjectEmitter<T>(Arc<Multicast<T, NoHistory>>);

/// Subscription handler for `Subject`.
///
/// `SubjectReceiver` acts as an `Observable`. Its `unsubscribe` method closes the
/// `Subject`, dropping registered observers.
pub struct SubjectReceiver<T>(Arc<Multicast<T, NoHistory>>);

impl<T> Clone for SubjectEmitter<T> {
    fn clone(&self) -> Self {
        SubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> Clone for SubjectReceiver<T> {
    fn clone(&self) -> Self {
        SubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T: Clone + Send + 'static> SubjectReceiver<T> {
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

impl<T: Clone + Send + 'static> Subscribeable for SubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription {
        self.0.subscribe(s)
    }
}

impl<T: Clone + Send + 'static> Unsubscribeable for SubjectReceiver<T> {
    fn unsubscribe(&self) {
        self.0.close();
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

impl<T: Clone + Send + 'static> Observer for SubjectEmitter<T> {
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

impl<T: Clone + Send + 'static> From<SubjectEmitter<T>> for Subscriber<T> {
    fn from(value: SubjectEmitter<T>) -> Self {
        let next = Arc::clone(&value.0);
        let error = Arc::clone(&value.0);
        Subscriber::new(
            move |v| next.next(v),
            move |e| error.error(e),
            move || value.0.complete(),
        )
    }
}

impl<T: Clone + Send + Sync + 'static> From<SubjectReceiver<T>> for Observable<T> {
    fn from(value: SubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}
