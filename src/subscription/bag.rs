use parking_lot::Mutex;

use super::subscribe::{Subscription, Unsubscribeable};

struct BagState {
    disposed: bool,
    subscriptions: Vec<Subscription>,
}

/// A collection of subscriptions released together.
///
/// Unsubscribing the bag releases every collected subscription once. A bag is
/// also released when it is dropped, which ties the lifetime of the collected
/// subscriptions to the owner of the bag. Subscriptions added after the bag was
/// released are unsubscribed right away.
pub struct SubscriptionBag {
    state: Mutex<BagState>,
}

impl SubscriptionBag {
    #[must_use]
    pub fn new() -> Self {
        SubscriptionBag {
            state: Mutex::new(BagState {
                disposed: false,
                subscriptions: Vec::new(),
            }),
        }
    }

    /// Adds a subscription to the bag.
    pub fn add(&self, subscription: Subscription) {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            subscription.unsubscribe();
            return;
        }
        state.subscriptions.push(subscription);
    }

    /// Returns the number of subscriptions held by the bag.
    pub fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Returns `true` if the bag holds no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SubscriptionBag {
    fn default() -> Self {
        Self::new()
    }
}

impl Unsubscribeable for SubscriptionBag {
    fn unsubscribe(&self) {
        let subscriptions = {
            let mut state = self.state.lock();
            state.disposed = true;
            std::mem::take(&mut state.subscriptions)
        };
        for s in subscriptions {
            s.unsubscribe();
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl Drop for SubscriptionBag {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl Subscription {
    /// Hands the subscription over to `bag`, releasing it together with the bag.
    pub fn disposed_by(self, bag: &SubscriptionBag) {
        bag.add(self);
    }
}
