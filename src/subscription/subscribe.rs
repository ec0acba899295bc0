use std::{
    any::Any,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle as ThreadJoinHandle,
};

use parking_lot::Mutex;
use tokio::{runtime, task::JoinHandle};
use tracing::{debug, trace, warn};

use crate::{
    errors::{RxError, SharedError},
    observer::Observer,
};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The returned `Subscription` allows the caller to stop the delivery of values
    /// and release resources held by the producer, or to await an asynchronous
    /// producer.
    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of
/// resources associated with a subscription.
pub trait Unsubscribeable {
    /// Releases the resources held by the subscription.
    ///
    /// Calling it more than once, or from several threads at the same time, runs
    /// the release logic only once. Once it returns, the subscriber attached to
    /// the subscription receives no further notifications.
    fn unsubscribe(&self);

    /// Returns `true` once `unsubscribe` has been called.
    fn is_closed(&self) -> bool;
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(SharedError) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable` or `Subject`.
///
/// A `Subscriber` forwards at most one terminal notification. Once `error` or
/// `complete` has been delivered, or the subscription it belongs to has been
/// unsubscribed, every later call is ignored.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    stopped: bool,
    closed: Arc<AtomicBool>,
    // Flags of the subscribers and operator slots downstream; raising any of
    // them stops this subscriber too.
    linked: Vec<Arc<AtomicBool>>,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + Send + 'static,
        error_fn: impl FnMut(SharedError) + Send + 'static,
        complete_fn: impl FnMut() + Send + 'static,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            stopped: false,
            closed: Arc::new(AtomicBool::new(false)),
            linked: Vec::new(),
        }
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// Errors reaching a subscriber without an error handler are logged at
    /// `debug` level and dropped.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + Send + 'static) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            stopped: false,
            closed: Arc::new(AtomicBool::new(false)),
            linked: Vec::new(),
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + Send + 'static) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    pub fn on_error(&mut self, error_fn: impl FnMut(SharedError) + Send + 'static) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns `true` when this subscriber will ignore further notifications,
    /// either because it already received a terminal signal or because its
    /// subscription was unsubscribed.
    ///
    /// Synchronous producers can poll this to stop emitting early.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
            || self.closed.load(Ordering::Acquire)
            || self.linked.iter().any(|flag| flag.load(Ordering::Acquire))
    }

    pub(crate) fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    // Every flag that silences this subscriber.
    pub(crate) fn stop_flags(&self) -> Vec<Arc<AtomicBool>> {
        let mut flags = Vec::with_capacity(self.linked.len() + 1);
        flags.push(Arc::clone(&self.closed));
        flags.extend(self.linked.iter().cloned());
        flags
    }

    // Lets an operator silence the subscriber it hands upstream while the
    // upstream is still emitting synchronously inside `subscribe`.
    pub(crate) fn stopped_by(mut self, flags: impl IntoIterator<Item = Arc<AtomicBool>>) -> Self {
        self.linked.extend(flags);
        self
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_stopped() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.stopped = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, observable_error: SharedError) {
        if self.is_stopped() {
            return;
        }
        self.stopped = true;
        match &mut self.error_fn {
            Some(efn) => (efn)(observable_error),
            None => debug!(error = %observable_error, "unhandled error reached subscriber"),
        }
    }
}

/// Enumeration representing different types of handles used to await
/// asynchronous producers.
pub enum SubscriptionHandle {
    /// No specific handle for task or thread awaiting.
    Nil,

    /// Holds a join handle for awaiting an asynchronous observable using Tokio task.
    JoinTask(JoinHandle<()>),

    /// Holds a join handle for awaiting an asynchronous observable using OS thread.
    JoinThread(ThreadJoinHandle<()>),

    /// Awaits every listed subscription, used by operators that forward the
    /// handles of their sources.
    JoinSubscriptions(Vec<Subscription>),

    /// Awaits the listed subscriptions, then the subscription the closure yields
    /// once they finished. Used by operators that hand over to another source
    /// while running, such as `catch_error`.
    JoinThen(
        Vec<Subscription>,
        Box<dyn FnOnce() -> Option<Subscription> + Send>,
    ),
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous unsubscribe logic represented by a future. It is spawned on
    /// the Tokio runtime that was current when the `Subscription` was created.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn run(self, runtime_handle: Option<&runtime::Handle>) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Some(handle) => {
                    handle.spawn(future);
                }
                None => warn!(
                    "unsubscribe future dropped, subscription was created outside of a Tokio runtime"
                ),
            },
        }
    }
}

struct SubscriptionInner {
    closed: AtomicBool,
    unsubscribe_logic: Mutex<Option<UnsubscribeLogic>>,
    subscription_future: Mutex<SubscriptionHandle>,
    runtime_handle: Option<runtime::Handle>,
    silences: Option<Arc<AtomicBool>>,
}

/// Represents a subscription to an observable or a subject, allowing control over
/// the subscription.
///
/// A `Subscription` is a cheap handle: clones refer to the same underlying
/// resources, so it can be stored in several places and unsubscribed from any of
/// them. It can also be used to await asynchronous observables that use Tokio
/// tasks or OS threads.
#[derive(Clone)]
pub struct Subscription(Arc<SubscriptionInner>);

impl Subscription {
    /// Creates a new Subscription instance with the specified unsubscribe logic and
    /// subscription handle.
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        Subscription(Arc::new(SubscriptionInner {
            closed: AtomicBool::new(false),
            unsubscribe_logic: Mutex::new(Some(unsubscribe_logic)),
            subscription_future: Mutex::new(subscription_future),
            runtime_handle: runtime::Handle::try_current().ok(),
            silences: None,
        }))
    }

    /// A subscription with nothing to release and nothing to await.
    #[must_use]
    pub fn empty() -> Self {
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    }

    // Wraps the subscription returned by a producer so that unsubscribing also
    // silences the subscriber that was handed to it.
    pub(crate) fn silencing(inner: Subscription, subscriber_closed: Arc<AtomicBool>) -> Self {
        Subscription(Arc::new(SubscriptionInner {
            closed: AtomicBool::new(false),
            unsubscribe_logic: Mutex::new(Some(UnsubscribeLogic::Wrapped(Box::new(
                inner.clone(),
            )))),
            subscription_future: Mutex::new(SubscriptionHandle::JoinSubscriptions(vec![inner])),
            runtime_handle: None,
            silences: Some(subscriber_closed),
        }))
    }

    fn take_handle(&self) -> SubscriptionHandle {
        std::mem::replace(
            &mut *self.0.subscription_future.lock(),
            SubscriptionHandle::Nil,
        )
    }

    /// Blocks until the OS thread behind this subscription finished.
    ///
    /// A subscription can be awaited once; later calls return immediately.
    ///
    /// # Errors
    ///
    /// Returns `RxError::Join` if the producer thread panicked and
    /// `RxError::BlockingJoinOnTask` if the producer is a Tokio task.
    pub fn join(&self) -> Result<(), RxError> {
        join_blocking(self.take_handle())
    }

    /// Awaits the Tokio task or OS thread behind this subscription.
    ///
    /// # Errors
    ///
    /// Returns `RxError::Join` if the producer task or thread failed.
    pub async fn join_concurrent(&self) -> Result<(), RxError> {
        let handle = self.take_handle();
        join_async(handle).await
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&self) {
        if self.0.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(silenced) = &self.0.silences {
            silenced.store(true, Ordering::Release);
        }
        let logic = self.0.unsubscribe_logic.lock().take();
        if let Some(logic) = logic {
            trace!("running unsubscribe logic");
            logic.run(self.0.runtime_handle.as_ref());
        }
    }

    fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::Acquire)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "producer panicked".to_string()
    }
}

fn join_blocking(handle: SubscriptionHandle) -> Result<(), RxError> {
    match handle {
        SubscriptionHandle::Nil => Ok(()),
        SubscriptionHandle::JoinThread(thread_handle) => thread_handle
            .join()
            .map_err(|e| RxError::Join(panic_message(e.as_ref()))),
        SubscriptionHandle::JoinTask(_) => Err(RxError::BlockingJoinOnTask),
        SubscriptionHandle::JoinSubscriptions(subscriptions) => {
            for s in subscriptions {
                s.join()?;
            }
            Ok(())
        }
        SubscriptionHandle::JoinThen(subscriptions, then) => {
            for s in subscriptions {
                s.join()?;
            }
            match then() {
                Some(s) => s.join(),
                None => Ok(()),
            }
        }
    }
}

fn join_async(
    handle: SubscriptionHandle,
) -> Pin<Box<dyn Future<Output = Result<(), RxError>> + Send>> {
    Box::pin(async move {
        match handle {
            SubscriptionHandle::Nil => Ok(()),
            SubscriptionHandle::JoinTask(task_handle) => task_handle
                .await
                .map_err(|e| RxError::Join(e.to_string())),
            SubscriptionHandle::JoinThread(thread_handle) => {
                tokio::task::spawn_blocking(move || thread_handle.join())
                    .await
                    .map_err(|e| RxError::Join(e.to_string()))?
                    .map_err(|e| RxError::Join(panic_message(e.as_ref())))
            }
            SubscriptionHandle::JoinSubscriptions(subscriptions) => {
                for s in subscriptions {
                    join_async(s.take_handle()).await?;
                }
                Ok(())
            }
            SubscriptionHandle::JoinThen(subscriptions, then) => {
                for s in subscriptions {
                    join_async(s.take_handle()).await?;
                }
                match then() {
                    Some(s) => join_async(s.take_handle()).await,
                    None => Ok(()),
                }
            }
        }
    })
}
