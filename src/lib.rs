//! `rxkit` is a small runtime for observable streams.
//!
//! It provides cold [`Observable`]s built from a subscribe function, a set of
//! operators on [`ObservableExt`], hot [`subjects`] that multicast one source to
//! many observers, and [`scheduler`]s that decide where and when deferred work
//! runs. Every subscription hands back a [`Subscription`](subscribe::Subscription)
//! that releases the resources behind it and, for producers running on OS
//! threads or Tokio tasks, can be awaited.
//!
//! # Example
//!
//! ```no_run
//! use rxkit::{subscribe::Subscriber, Observable, ObservableExt, Subscribeable};
//!
//! Observable::from_iter(1..=10)
//!     .filter(|v| v % 2 == 0)
//!     .map(|v| v * 10)
//!     .scan(0, |acc, v| acc + v)
//!     .subscribe(Subscriber::on_next(|total| println!("running total {}", total)));
//! ```
//!
//! Errors travel on the `error` channel as [`SharedError`] values; operators that
//! fail report an [`RxError`]. The crate logs through `tracing` and installs no
//! subscriber of its own.

pub mod errors;
pub mod observable;
pub mod observer;
pub mod scheduler;
pub mod subjects;
pub mod subscription;

pub use errors::*;
pub use observable::*;
pub use observer::Observer;
pub use scheduler::*;
pub use subjects::*;
pub use subscription::subscribe;
pub use subscription::SubscriptionBag;
pub use subscribe::{Subscribeable, Unsubscribeable};
