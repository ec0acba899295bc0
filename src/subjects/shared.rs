use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, trace};

use crate::{
    errors::SharedError,
    observer::Observer,
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
};

/// Specifies the buffer size for replaying previous emissions in `ReplaySubject`
/// and in `replay` connectables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufSize {
    /// Specifies an infinite buffer size, allowing all emitted values to be replayed.
    Unbounded,

    /// Specifies a limited buffer size with the maximum number of values to be replayed.
    Bounded(usize),
}

/// What a subject remembers of past emissions for late subscribers.
pub(crate) trait History<T>: Send + 'static {
    fn record(&mut self, v: &T);

    /// Values delivered to a new subscriber before live emissions.
    fn replay(&mut self) -> Vec<T>;

    /// Whether `replay` still applies once the subject terminated.
    fn replays_after_terminal(&self) -> bool;
}

pub(crate) struct NoHistory;

impl<T> History<T> for NoHistory {
    fn record(&mut self, _: &T) {}

    fn replay(&mut self) -> Vec<T> {
        Vec::new()
    }

    fn replays_after_terminal(&self) -> bool {
        false
    }
}

pub(crate) struct ReplayBuffer<T> {
    size: BufSize,
    window: Option<Duration>,
    entries: VecDeque<(T, Instant)>,
}

impl<T> ReplayBuffer<T> {
    pub(crate) fn new(size: BufSize, window: Option<Duration>) -> Self {
        ReplayBuffer {
            size,
            window,
            entries: VecDeque::new(),
        }
    }

    fn evict_stale(&mut self) {
        if let Some(window) = self.window {
            while self
                .entries
                .front()
                .map_or(false, |(_, at)| at.elapsed() > window)
            {
                self.entries.pop_front();
            }
        }
    }
}

impl<T: Clone + Send + 'static> History<T> for ReplayBuffer<T> {
    fn record(&mut self, v: &T) {
        if let BufSize::Bounded(0) = self.size {
            return;
        }
        self.entries.push_back((v.clone(), Instant::now()));
        if let BufSize::Bounded(n) = self.size {
            while self.entries.len() > n {
                self.entries.pop_front();
            }
        }
        self.evict_stale();
    }

    fn replay(&mut self) -> Vec<T> {
        self.evict_stale();
        self.entries.iter().map(|(v, _)| v.clone()).collect()
    }

    fn replays_after_terminal(&self) -> bool {
        true
    }
}

pub(crate) struct Current<T>(pub(crate) T);

impl<T: Clone + Send + 'static> History<T> for Current<T> {
    fn record(&mut self, v: &T) {
        self.0 = v.clone();
    }

    fn replay(&mut self) -> Vec<T> {
        vec![self.0.clone()]
    }

    fn replays_after_terminal(&self) -> bool {
        false
    }
}

#[derive(Clone)]
enum Terminal {
    Completed,
    Errored(SharedError),
}

type SharedSubscriber<T> = Arc<Mutex<Subscriber<T>>>;

struct State<T, H> {
    observers: Vec<(u64, SharedSubscriber<T>)>,
    next_key: u64,
    terminal: Option<Terminal>,
    closed: bool,
    history: H,
}

/// Shared state behind every subject flavor.
///
/// `emit_gate` serializes emissions and subscriptions so every observer sees
/// signals in one order. Observer callbacks run with only the gate held, never
/// the state lock, which lets a callback unsubscribe itself or subscribe others.
pub(crate) struct Multicast<T, H> {
    emit_gate: ReentrantMutex<()>,
    state: Mutex<State<T, H>>,
}

impl<T, H> Multicast<T, H>
where
    T: Clone + Send + 'static,
    H: History<T>,
{
    pub(crate) fn new(history: H) -> Arc<Self> {
        Arc::new(Multicast {
            emit_gate: ReentrantMutex::new(()),
            state: Mutex::new(State {
                observers: Vec::new(),
                next_key: 0,
                terminal: None,
                closed: false,
                history,
            }),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().observers.len()
    }

    pub(crate) fn with_history<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.state.lock().history)
    }

    pub(crate) fn subscribe(self: &Arc<Self>, subscriber: Subscriber<T>) -> Subscription {
        let _gate = self.emit_gate.lock();
        let closed_flag = subscriber.closed_flag();
        let shared = Arc::new(Mutex::new(subscriber));

        let (replay, terminal, key) = {
            let mut state = self.state.lock();
            if state.closed {
                return Subscription::empty();
            }
            let replay = if state.terminal.is_none() || state.history.replays_after_terminal() {
                state.history.replay()
            } else {
                Vec::new()
            };
            let key = if state.terminal.is_none() {
                let key = state.next_key;
                state.next_key += 1;
                state.observers.push((key, Arc::clone(&shared)));
                Some(key)
            } else {
                None
            };
            (replay, state.terminal.clone(), key)
        };
        trace!(replayed = replay.len(), "subject subscriber registered");

        for v in replay {
            shared.lock().next(v);
        }
        match terminal {
            Some(Terminal::Completed) => shared.lock().complete(),
            Some(Terminal::Errored(e)) => shared.lock().error(e),
            None => (),
        }

        let removal = match key {
            Some(key) => {
                let subject = Arc::clone(self);
                Subscription::new(
                    UnsubscribeLogic::Logic(Box::new(move || {
                        subject.state.lock().observers.retain(|(k, _)| *k != key);
                    })),
                    SubscriptionHandle::Nil,
                )
            }
            None => Subscription::empty(),
        };
        Subscription::silencing(removal, closed_flag)
    }

    pub(crate) fn next(&self, v: T) {
        let _gate = self.emit_gate.lock();
        let observers: Vec<SharedSubscriber<T>> = {
            let mut state = self.state.lock();
            if state.closed || state.terminal.is_some() {
                return;
            }
            state.history.record(&v);
            state.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };
        for o in observers {
            o.lock().next(v.clone());
        }
    }

    pub(crate) fn complete(&self) {
        self.terminate(Terminal::Completed);
    }

    pub(crate) fn error(&self, e: SharedError) {
        self.terminate(Terminal::Errored(e));
    }

    fn terminate(&self, terminal: Terminal) {
        let _gate = self.emit_gate.lock();
        let observers = {
            let mut state = self.state.lock();
            if state.closed || state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal.clone());
            std::mem::take(&mut state.observers)
        };

        match &terminal {
            Terminal::Completed => debug!(observers = observers.len(), "subject completed"),
            Terminal::Errored(e) => {
                debug!(observers = observers.len(), error = %e, "subject errored");
            }
        }
        for (_, o) in observers {
            match &terminal {
                Terminal::Completed => o.lock().complete(),
                Terminal::Errored(e) => o.lock().error(Arc::clone(e)),
            }
        }
    }

    /// Closes the subject: registered observers are dropped without a terminal
    /// signal and later subscribers are ignored.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.observers.clear();
        trace!("subject closed");
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
