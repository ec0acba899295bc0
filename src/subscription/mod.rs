//! Provides structures and traits related to subscription management.
//!
//! This module includes types such as `Subscriber` for handling observed values,
//! errors, and completions, `Subscription` for controlling subscriptions to
//! observables and subjects, and `SubscriptionBag` for releasing many
//! subscriptions together.
//!
//! Additionally, it defines enums and traits for subscription handling, awaiting
//! asynchronous subscriptions and defining unsubscribe logic.
mod bag;
pub mod subscribe;

pub use bag::SubscriptionBag;
