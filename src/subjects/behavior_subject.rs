use std::sync::Arc;

use crate::{
    errors::SharedError,
    observer::Observer,
    subscribe::{Subscribeable, Subscriber, Subscription, Unsubscribeable},
    Observable,
};

use super::shared::{Current, Multicast};

/// `BehaviorSubject` holds a current value that every new subscriber receives
/// first, followed by live emissions.
///
/// The current value can also be read synchronously with `value()` on either
/// half. Once the subject terminated, new subscribers receive only the terminal
/// notification.
///
/// # Examples
///
///```no_run
/// use rxkit::{subjects::BehaviorSubject, subscribe::Subscriber};
/// use rxkit::{Observer, Subscribeable};
///
/// let (mut emitter, receiver) = BehaviorSubject::emitter_receiver("x");
///
/// receiver.subscribe(Subscriber::on_next(|v| println!("1 got {}", v))); // "x"
/// emitter.next("y"); // "y" to subscriber 1.
/// receiver.subscribe(Subscriber::on_next(|v| println!("2 got {}", v))); // "y"
///
/// assert_eq!(receiver.value(), "y");
///```
pub struct BehaviorSubject;

impl BehaviorSubject {
    /// Creates a `BehaviorSubject` whose current value starts as `value`.
    #[must_use]
    pub fn emitter_receiver<T: Clone + Send + 'static>(
        value: T,
    ) -> (BehaviorSubjectEmitter<T>, BehaviorSubjectReceiver<T>) {
        let inner = Multicast::new(Current(value));
        (
            BehaviorSubjectEmitter(Arc::clone(&inner)),
            BehaviorSubjectReceiver(inner),
        )
    }
}

/// Multicasting emitter for `BehaviorSubject`. Each value becomes the new current
/// value.
pub struct BehaviorSubjectEmitter<T>(Arc<Multicast<T, Current<T>>>);

/// Subscription handler for `BehaviorSubject`.
pub struct BehaviorSubjectReceiver<T>(Arc<Multicast<T, Current<T>>>);

impl<T> Clone for BehaviorSubjectEmitter<T> {
    fn clone(&self) -> Self {
        BehaviorSubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> Clone for BehaviorSubjectReceiver<T> {
    fn clone(&self) -> Self {
        BehaviorSubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T: Clone + Send + 'static> BehaviorSubjectEmitter<T> {
    /// Returns a clone of the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.0.with_history(|current| current.0.clone())
    }
}

impl<T: Clone + Send + 'static> BehaviorSubjectReceiver<T> {
    /// Returns a clone of the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.0.with_history(|current| current.0.clone())
    }

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

impl<T: Clone + Send + 'static> Subscribeable for BehaviorSubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription {
        self.0.subscribe(s)
    }
}

impl<T: Clone + Send + 'static> Unsubscribeable for BehaviorSubjectReceiver<T> {
    fn unsubscribe(&self) {
        self.0.close();
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

impl<T: Clone + Send + 'static> Observer for BehaviorSubjectEmitter<T> {
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

impl<T: Clone + Send + 'static> From<BehaviorSubjectEmitter<T>> for Subscriber<T> {
    fn from(value: BehaviorSubjectEmitter<T>) -> Self {
        let next = Arc::clone(&value.0);
        let error = Arc::clone(&value.0);
        Subscriber::new(
            move |v| next.next(v),
            move |e| error.error(e),
            move || value.0.complete(),
        )
    }
}

impl<T: Clone + Send + Sync + 'static> From<BehaviorSubjectReceiver<T>> for Observable<T> {
    fn from(value: BehaviorSubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}
