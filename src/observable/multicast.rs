//! Observables that share one subscription to their source between many
//! subscribers.
//!
//! A `Connectable` registers subscribers on a subject and only subscribes the
//! subject to the source when `connect()` is called, so every subscriber sees the
//! same emissions and a side effect inside the source runs once.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::Observable;
use crate::{
    subjects::{BufSize, ReplaySubject, Subject},
    subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

/// Multicasting observable with a `connect()` method for subscribing the shared
/// subject to the underlying source.
///
/// Subscribing to a `Connectable` only registers the subscriber. Values flow once
/// `connect()` is called, to every subscriber registered at that time (and, for
/// `replay`, to later ones through the replay buffer).
///
/// Cloning a `Connectable` yields a handle to the same connection.
pub struct Connectable<T> {
    source: Observable<T>,
    make_sink: Arc<dyn Fn() -> Subscriber<T> + Send + Sync>,
    receiver: Observable<T>,
    connection: Arc<Mutex<Option<Subscription>>>,
}

impl<T> Clone for Connectable<T> {
    fn clone(&self) -> Self {
        Connectable {
            source: self.source.clone(),
            make_sink: Arc::clone(&self.make_sink),
            receiver: self.receiver.clone(),
            connection: Arc::clone(&self.connection),
        }
    }
}

impl<T: Clone + Send + 'static> Connectable<T> {
    pub(crate) fn publish(source: Observable<T>) -> Self {
        let (emitter, receiver) = Subject::emitter_receiver();
        Connectable {
            source,
            make_sink: Arc::new(move || Subscriber::from(emitter.clone())),
            receiver: Observable::new(move |o| receiver.subscribe(o)),
            connection: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn replay(source: Observable<T>, buf_size: BufSize) -> Self {
        let (emitter, receiver) = ReplaySubject::emitter_receiver(buf_size);
        Connectable {
            source,
            make_sink: Arc::new(move || Subscriber::from(emitter.clone())),
            receiver: Observable::new(move |o| receiver.subscribe(o)),
            connection: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: 'static> Connectable<T> {
    /// Subscribes the shared subject to the source and returns the connection.
    ///
    /// While a connection is active, calling `connect()` again returns it instead
    /// of subscribing the source a second time. Unsubscribing the connection
    /// stops the source; registered subscribers stay registered.
    pub fn connect(&self) -> Subscription {
        let mut connection = self.connection.lock();
        if let Some(active) = connection.as_ref() {
            if !active.is_closed() {
                return active.clone();
            }
        }
        trace!("connecting shared source");
        let subscription = self.source.subscribe((self.make_sink)());
        *connection = Some(subscription.clone());
        subscription
    }

    // Detaches the active connection so that the next `connect()` subscribes
    // the source again.
    fn take_connection(&self) -> Option<Subscription> {
        self.connection.lock().take()
    }

    /// Returns an `Observable` that connects when its first subscriber arrives and
    /// disconnects when its last subscriber unsubscribes.
    #[must_use]
    pub fn ref_count(self) -> Observable<T> {
        let subscribers = Arc::new(Mutex::new(0_usize));
        Observable::new(move |o| {
            let inner = self.receiver.subscribe(o);
            let first = {
                let mut count = subscribers.lock();
                *count += 1;
                *count == 1
            };
            let connection = if first { Some(self.connect()) } else { None };

            let connectable = self.clone();
            let subscribers = Arc::clone(&subscribers);
            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    inner.unsubscribe();
                    // Detached under the count lock: a subscriber arriving
                    // right after sees no connection and connects afresh.
                    let released = {
                        let mut count = subscribers.lock();
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            connectable.take_connection()
                        } else {
                            None
                        }
                    };
                    if let Some(connection) = released {
                        trace!("disconnecting shared source");
                        connection.unsubscribe();
                    }
                })),
                SubscriptionHandle::JoinSubscriptions(connection.into_iter().collect()),
            )
        })
    }
}

impl<T: 'static> Subscribeable for Connectable<T> {
    type ObsType = T;

    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription {
        self.receiver.subscribe(s)
    }
}
