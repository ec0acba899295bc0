//! Cold observables run their producer once per subscriber. `publish`,
//! `share` and `share_replay` route one subscription to many subscribers, so a
//! side effect in the producer runs once.
//!
//! To run this example, execute `cargo run --example side_effects`.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use rxkit::{
    subscribe::{Subscriber, Subscription},
    Observable, ObservableExt, Observer, Subscribeable,
};
use tracing::info;

fn expensive_source(calls: &Arc<AtomicUsize>) -> Observable<u32> {
    let calls = Arc::clone(calls);
    Observable::new(move |mut o| {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        info!(call, "fetching data");
        for v in [10, 20, 30] {
            o.next(v);
        }
        o.complete();
        Subscription::empty()
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let calls = Arc::new(AtomicUsize::new(0));
    let cold = expensive_source(&calls);
    cold.subscribe(Subscriber::on_next(|v| println!("cold A {}", v)));
    cold.subscribe(Subscriber::on_next(|v| println!("cold B {}", v)));
    println!("cold source ran {} times", calls.swap(0, Ordering::SeqCst));

    let connectable = expensive_source(&calls).map(|v| v + 1).publish();
    connectable.subscribe(Subscriber::on_next(|v| println!("published A {}", v)));
    connectable.subscribe(Subscriber::on_next(|v| println!("published B {}", v)));
    connectable.connect();
    println!("published source ran {} times", calls.swap(0, Ordering::SeqCst));

    let replayed = expensive_source(&calls).share_replay(1);
    replayed.subscribe(Subscriber::on_next(|v| println!("shared A {}", v)));
    // Subscribes after the source finished and only sees the last value.
    replayed.subscribe(Subscriber::on_next(|v| println!("shared B {}", v)));
    println!("shared source ran {} times", calls.load(Ordering::SeqCst));
}
